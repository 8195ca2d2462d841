//! # anki-tts
//!
//! A Rust library for adding synthesized speech to the notes of an Anki collection.
//!
//! ## Features
//!
//! - **Collection reading**: open `.apkg` packages or a live `collection.anki2` database
//!   and read decks, note types, notes, cards and the review log
//! - **Remote speech**: synthesize audio through the Bing speech service (`bing` feature)
//! - **Idempotent augmentation**: rewrite configured fields with a `[sound:...]` reference,
//!   skipping fields that already carry the audio they would get
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! anki-tts = { version = "2026.10", features = ["bing"] }
//! ```
//!
//! ```ignore
//! use std::path::Path;
//! use anki_tts::collection::CollectionReader;
//! use anki_tts::engines::bing::{BingEngine, BingInferenceParams};
//! use anki_tts::pipeline::{AugmentConfigBuilder, Augmenter, StdinConfirm};
//!
//! let reader = CollectionReader::open_path(Path::new("collection.anki2"))?;
//! let config = AugmentConfigBuilder::default()
//!     .deck_name("Spanish")
//!     .model_name("Basic")
//!     .locale("es-ES")
//!     .media_dir("collection.media")
//!     .build()?;
//! let params = BingInferenceParams::new("es-ES");
//! let mut augmenter = Augmenter::new(config, BingEngine::new(api_key), params, StdinConfirm);
//! let report = augmenter.run(&reader)?;
//! reader.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod backup;
pub mod collection;
pub mod config;
pub mod engines;
pub mod pipeline;
pub mod sanitize;

use std::path::Path;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains the encoded audio exactly as the engine produced it.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Encoded audio bytes (mp3, wav, ... depending on the engine's output format)
    pub audio: Vec<u8>,
}

impl SynthesisResult {
    /// Write the audio bytes to a file, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, &self.audio)?;
        Ok(())
    }

    /// Size of the encoded audio in bytes.
    pub fn len(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// The augmentation pipeline only talks to this trait, so any engine (or a
/// recording fake in tests) can drive it.
pub trait SynthesisEngine {
    /// Parameters for configuring a synthesis request (voice, locale, format, etc.)
    type SynthesisParams;

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write it to a file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_to()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_to(path)
    }
}
