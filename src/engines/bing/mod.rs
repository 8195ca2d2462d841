//! Bing speech engine implementation.
//!
//! This module provides a synthesis engine backed by the remote Bing /
//! Cognitive Services text-to-speech API. Every request first exchanges a
//! subscription key for a short-lived bearer token, then posts an SSML
//! document and receives encoded audio.
//!
//! # Requirements
//!
//! A Cognitive Services speech subscription key. Network access to
//! `api.cognitive.microsoft.com` and `speech.platform.bing.com`.
//!
//! # Voices
//!
//! Voices are looked up in a built-in catalog keyed by locale and gender:
//!
//! | Key | Default voice | Others |
//! |---|---|---|
//! | `en-US female` | `ZiraRUS` | `JessaRUS` |
//! | `en-GB male` | `George, Apollo` | |
//! | `es-ES female` | `Laura, Apollo` | `HelenaRUS` |
//! | `de-DE male` | `Stefan, Apollo` | |
//! | `ja-JP female` | `Ayumi, Apollo` | `HarukaRUS`, `LuciaRUS` |
//!
//! A non-empty `voice_name` picks the first voice whose name contains it
//! (case-insensitive). An empty one picks the default voice.
//!
//! # Examples
//!
//! ```rust,no_run
//! use anki_tts::{SynthesisEngine, engines::bing::{BingEngine, BingInferenceParams, Gender}};
//! use std::path::PathBuf;
//!
//! let mut engine = BingEngine::new("subscription-key");
//!
//! let params = BingInferenceParams {
//!     locale: "en-US".to_string(),
//!     gender: Gender::Female,
//!     voice_name: "jessa".to_string(),
//!     ..Default::default()
//! };
//!
//! engine.synthesize_to_file("Hello from Jessa!", &PathBuf::from("out.mp3"), Some(params))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod engine;
pub mod voices;

pub use client::{BingError, OutputFormat, SpeechClient, Token};
pub use engine::{BingEngine, BingInferenceParams};
pub use voices::{Gender, Voice, VoiceCatalog};
