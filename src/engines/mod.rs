//! Speech synthesis engines.
//!
//! This module contains implementations of text-to-speech engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `bing` - Bing / Cognitive Services speech (remote HTTP, API key required)

#[cfg(feature = "bing")]
pub mod bing;
