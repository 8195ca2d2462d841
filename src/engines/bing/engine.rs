use crate::{SynthesisEngine, SynthesisResult};

use super::client::{OutputFormat, SpeechClient};
use super::voices::Gender;

/// Parameters for configuring a Bing synthesis request.
#[derive(Debug, Clone)]
pub struct BingInferenceParams {
    /// Locale of the text, e.g. `"es-ES"`.
    pub locale: String,
    pub gender: Gender,
    /// Case-insensitive part of a voice name. Empty picks the first voice
    /// for the locale and gender.
    pub voice_name: String,
    pub output_format: OutputFormat,
}

impl BingInferenceParams {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }
}

impl Default for BingInferenceParams {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            gender: Gender::Female,
            voice_name: String::new(),
            output_format: OutputFormat::default(),
        }
    }
}

/// Bing speech engine.
///
/// Issues a fresh token for every request, so long runs never hit token
/// expiry.
///
/// # Quick Start
///
/// ```rust,no_run
/// use anki_tts::{SynthesisEngine, engines::bing::{BingEngine, BingInferenceParams}};
/// use std::path::PathBuf;
///
/// let mut engine = BingEngine::new("subscription-key");
/// let params = BingInferenceParams::new("en-GB");
/// engine.synthesize_to_file("Hello, world!", &PathBuf::from("hello.mp3"), Some(params))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BingEngine {
    client: SpeechClient,
    api_key: String,
}

impl BingEngine {
    /// Create an engine against the public service endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(SpeechClient::new(), api_key)
    }

    /// Create an engine around an already configured client.
    pub fn with_client(client: SpeechClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    pub fn client(&self) -> &SpeechClient {
        &self.client
    }
}

impl SynthesisEngine for BingEngine {
    type SynthesisParams = BingInferenceParams;

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let p = params.unwrap_or_default();

        // Fail on an unknown voice before spending a token request.
        let voice = self.client.resolve_voice(&p.locale, p.gender, &p.voice_name)?;
        log::debug!("Using voice {} for {}", voice.name, p.locale);

        let token = self.client.issue_token(&self.api_key)?;
        let audio = self.client.synthesize(
            &token,
            text,
            &p.locale,
            p.gender,
            &p.voice_name,
            p.output_format,
        )?;

        Ok(SynthesisResult { audio })
    }
}
