use std::path::Path;

use clap::Parser;

use anki_tts::backup::backup_collection;
use anki_tts::collection::CollectionReader;
use anki_tts::config::{Config, Params};
use anki_tts::engines::bing::{BingEngine, BingInferenceParams, Gender, VoiceCatalog};
use anki_tts::pipeline::{AugmentReport, Augmenter, AutoConfirm, Confirm, StdinConfirm};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = Params::parse();
    log::debug!("params={params:?}");

    let config = Config::load_default()?;
    let augment = params.augment_config()?;
    let gender: Gender = params.gender.parse()?;

    // Validate the voice before touching anything on disk.
    let voice = VoiceCatalog::builtin().resolve(&params.locale, gender, &params.voice)?;
    log::info!("Voice: {} ({} {})", voice.name, voice.locale, voice.gender);

    backup_collection(params.collection_dir(), Path::new("."))?;

    let reader = CollectionReader::open_path(&params.database_path())?;
    let engine = BingEngine::new(config.speech_api_key);
    let synthesis = BingInferenceParams {
        locale: params.locale.clone(),
        gender,
        voice_name: params.voice.clone(),
        ..Default::default()
    };

    let result = if params.yes {
        run(augment, engine, synthesis, AutoConfirm(true), &reader)
    } else {
        run(augment, engine, synthesis, StdinConfirm, &reader)
    };

    log::info!("Closing db");
    let closed = reader.close();
    let report = result?;
    closed?;

    println!(
        "{} notes processed, {} fields synthesized, {} already voiced, {} notes updated, {} skipped",
        report.notes_processed,
        report.fields_synthesized,
        report.fields_unchanged,
        report.notes_updated,
        report.skipped
    );
    Ok(())
}

fn run<C: Confirm>(
    config: anki_tts::pipeline::AugmentConfig,
    engine: BingEngine,
    params: BingInferenceParams,
    confirm: C,
    reader: &CollectionReader,
) -> Result<AugmentReport, anki_tts::pipeline::AugmentError> {
    Augmenter::new(config, engine, params, confirm).run(reader)
}
