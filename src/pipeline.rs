//! Field augmentation: synthesize speech for selected note fields and
//! append a `[sound:...]` reference to them.
//!
//! For every card in the target deck whose note has the target note type,
//! each configured field is handled like this:
//!
//! 1. `[...]` directives are stripped from the trimmed value, giving the
//!    candidate text. Empty candidates are skipped.
//! 2. The audio file name is `<locale>-<slug>.mp3` in the media directory
//!    and the new value is `candidate[sound:<file name>]`.
//! 3. If the new value equals the current one the field is already done.
//!    Otherwise the candidate is sanitized, synthesized to the audio file,
//!    and the new value is staged.
//!
//! The operator is asked once, on the first staged change of the run,
//! whether changes should be written. Any failure aborts the run.

use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::collection::{Card, CollectionError, CollectionReader, Model, Note};
use crate::sanitize::{sanitize_for_speech, slug, strip_directives};
use crate::SynthesisEngine;

#[derive(thiserror::Error, Debug)]
pub enum AugmentError {
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),
    #[error("speech synthesis failed for {text:?}: {source}")]
    Synthesis {
        text: String,
        source: Box<dyn std::error::Error>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("inconsistent note: {0}")]
    Consistency(String),
}

/// What to augment and where audio files go.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct AugmentConfig {
    /// Only cards in the deck with exactly this name are considered.
    pub deck_name: String,
    /// Only notes of the note type with exactly this name are changed.
    pub model_name: String,
    /// Names of the fields to voice.
    #[builder(default = "vec![\"Back\".to_string()]")]
    pub speech_columns: Vec<String>,
    /// Locale of the field text; also the audio file name prefix.
    pub locale: String,
    /// The collection's `collection.media` directory.
    pub media_dir: PathBuf,
}

/// Source of the one yes/no answer that decides whether changes are saved.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Asks on stdout and reads the answer from stdin. Only `y`/`yes` count as yes.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{question} [y/n] ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Fixed answer, for unattended runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(self.0)
    }
}

/// Remembers the operator's answer for the rest of a run.
#[derive(Debug, Default)]
pub struct ConfirmLatch {
    answer: Option<bool>,
}

impl ConfirmLatch {
    /// Ask on the first call, then repeat that answer.
    pub fn persist<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> io::Result<bool> {
        if let Some(answer) = self.answer {
            return Ok(answer);
        }
        let answer = confirm.confirm("Update?")?;
        log::info!("Saving changes: {answer}");
        self.answer = Some(answer);
        Ok(answer)
    }

    pub fn asked(&self) -> bool {
        self.answer.is_some()
    }
}

/// What happens to one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPlan {
    /// Nothing to speak.
    Empty,
    /// The value already references its audio.
    Unchanged,
    Rewrite {
        /// Text to synthesize, before sanitizing.
        candidate: String,
        audio_path: PathBuf,
        composed: String,
    },
}

/// Decide what to do with a field value.
pub fn plan_field(value: &str, locale: &str, media_dir: &Path) -> FieldPlan {
    let original = value.trim();
    let candidate = strip_directives(original).trim().to_string();
    if candidate.is_empty() {
        return FieldPlan::Empty;
    }

    let file_name = format!("{locale}-{}.mp3", slug(&candidate));
    let composed = format!("{candidate}[sound:{file_name}]");
    if composed == original {
        return FieldPlan::Unchanged;
    }

    FieldPlan::Rewrite {
        candidate,
        audio_path: media_dir.join(file_name),
        composed,
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentReport {
    pub cards_examined: usize,
    pub notes_processed: usize,
    pub fields_synthesized: usize,
    pub fields_unchanged: usize,
    pub notes_updated: usize,
    pub skipped: usize,
}

/// Drives one augmentation run over a collection.
pub struct Augmenter<E: SynthesisEngine, C: Confirm> {
    config: AugmentConfig,
    engine: E,
    params: E::SynthesisParams,
    confirm: C,
}

impl<E, C> Augmenter<E, C>
where
    E: SynthesisEngine,
    E::SynthesisParams: Clone,
    C: Confirm,
{
    pub fn new(config: AugmentConfig, engine: E, params: E::SynthesisParams, confirm: C) -> Self {
        Self {
            config,
            engine,
            params,
            confirm,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &AugmentConfig {
        &self.config
    }

    /// Run over every card of the target deck.
    pub fn run(&mut self, reader: &CollectionReader) -> Result<AugmentReport, AugmentError> {
        let collection = reader.load_collection()?;
        for (id, model) in &collection.models {
            log::debug!("model [{id}] {} deck={:?}", model.name, model.deck_id);
        }
        for (id, deck) in &collection.decks {
            log::debug!("deck [{id}] {}", deck.name);
        }

        let notes = read_notes(reader)?;
        let cards = read_cards(reader)?;

        let mut latch = ConfirmLatch::default();
        let mut report = AugmentReport::default();
        let mut seen = HashSet::new();

        for card in &cards {
            let Some(deck) = collection.decks.get(&card.deck_id) else {
                continue;
            };
            if deck.name != self.config.deck_name {
                continue;
            }
            report.cards_examined += 1;

            let Some(note) = notes.get(&card.note_id) else {
                log::warn!("Note {} of card {} not found", card.note_id, card.id);
                report.skipped += 1;
                continue;
            };
            if !seen.insert(note.id) {
                continue;
            }

            let Some(model) = collection.models.get(&note.model_id) else {
                log::warn!("Note type {} of note {} not found", note.model_id, note.id);
                report.skipped += 1;
                continue;
            };
            if model.name != self.config.model_name {
                log::info!(
                    "Note {} in deck {} is not of type {}",
                    note.id,
                    self.config.deck_name,
                    self.config.model_name
                );
                report.skipped += 1;
                continue;
            }

            self.process_note(reader, note, model, &mut latch, &mut report)?;
        }

        log::info!("Augmentation finished: {report:?}");
        Ok(report)
    }

    fn process_note(
        &mut self,
        reader: &CollectionReader,
        note: &Note,
        model: &Model,
        latch: &mut ConfirmLatch,
        report: &mut AugmentReport,
    ) -> Result<(), AugmentError> {
        let mut values = note.fields();
        if values.len() != model.fields.len() {
            return Err(AugmentError::Consistency(format!(
                "note {} has {} field values, note type {} defines {}",
                note.id,
                values.len(),
                model.name,
                model.fields.len()
            )));
        }
        report.notes_processed += 1;

        let mut staged = false;
        for (n, field) in model.fields.iter().enumerate() {
            if !self.config.speech_columns.iter().any(|c| c == &field.name) {
                continue;
            }

            match plan_field(&values[n], &self.config.locale, &self.config.media_dir) {
                FieldPlan::Empty => {}
                FieldPlan::Unchanged => {
                    log::debug!("unchanged {}", values[n]);
                    report.fields_unchanged += 1;
                }
                FieldPlan::Rewrite {
                    candidate,
                    audio_path,
                    composed,
                } => {
                    log::info!("field {}={candidate}", field.name);
                    let speech = sanitize_for_speech(&candidate);
                    self.engine
                        .synthesize_to_file(&speech, &audio_path, Some(self.params.clone()))
                        .map_err(|source| AugmentError::Synthesis {
                            text: speech.clone(),
                            source,
                        })?;
                    log::info!("changed {} -> {composed}", values[n].trim());
                    report.fields_synthesized += 1;

                    values[n] = composed;
                    staged = true;
                }
            }
        }

        if staged && latch.persist(&mut self.confirm)? {
            reader.update_note_fields(note.id, &values)?;
            log::info!("Updated note {}", note.id);
            report.notes_updated += 1;
        }
        Ok(())
    }
}

fn read_notes(reader: &CollectionReader) -> Result<HashMap<i64, Note>, AugmentError> {
    let mut notes = HashMap::new();
    let mut cursor = reader.notes()?;
    while cursor.advance()? {
        if let Some(note) = cursor.take_current() {
            notes.insert(note.id, note);
        }
    }
    cursor.close()?;
    Ok(notes)
}

fn read_cards(reader: &CollectionReader) -> Result<Vec<Card>, AugmentError> {
    let mut cards = Vec::new();
    let mut cursor = reader.cards()?;
    while cursor.advance()? {
        if let Some(card) = cursor.take_current() {
            cards.push(card);
        }
    }
    cursor.close()?;
    Ok(cards)
}
