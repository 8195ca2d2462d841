use std::fmt;

use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;

use super::voices::{Gender, Voice, VoiceCatalog};

/// Token issuing endpoint of the Cognitive Services speech API.
pub const TOKEN_ENDPOINT: &str = "https://api.cognitive.microsoft.com/sts/v1.0/issueToken";

/// Synthesis endpoint of the Bing speech API.
pub const SYNTHESIZE_ENDPOINT: &str = "https://speech.platform.bing.com/synthesize";

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";
const SEARCH_APP_ID: &str = "00000000000000000000000000000000";

#[derive(thiserror::Error, Debug)]
pub enum BingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Speech API rejected the subscription key: {0}")]
    Unauthorized(String),
    #[error("Speech API request failed: {0}")]
    Transport(String),
    #[error("No voice for {key}, available voice names: {}", .available.join(", "))]
    VoiceNotFound { key: String, available: Vec<String> },
}

/// Audio encodings the synthesis endpoint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Riff8Bit8kHzMonoMulaw,
    Riff16Bit16kHzMonoPcm,
    Riff16kHz16kbpsMonoSiren,
    Raw8Bit8kHzMonoMulaw,
    Raw16Bit16kHzMonoPcm,
    Ssml16kHz16BitMonoTts,
    Audio16kHz16kbpsMonoSiren,
    Audio16kHz128kbitrateMonoMp3,
    Audio16kHz64kbitrateMonoMp3,
    #[default]
    Audio16kHz32kbitrateMonoMp3,
}

impl OutputFormat {
    /// Value of the `X-Microsoft-OutputFormat` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Riff8Bit8kHzMonoMulaw => "riff-8khz-8bit-mono-mulaw",
            OutputFormat::Riff16Bit16kHzMonoPcm => "riff-16khz-16bit-mono-pcm",
            OutputFormat::Riff16kHz16kbpsMonoSiren => "riff-16khz-16kbps-mono-siren",
            OutputFormat::Raw8Bit8kHzMonoMulaw => "raw-8khz-8bit-mono-mulaw",
            OutputFormat::Raw16Bit16kHzMonoPcm => "raw-16khz-16bit-mono-pcm",
            OutputFormat::Ssml16kHz16BitMonoTts => "ssml-16khz-16bit-mono-tts",
            OutputFormat::Audio16kHz16kbpsMonoSiren => "audio-16khz-16kbps-mono-siren",
            OutputFormat::Audio16kHz128kbitrateMonoMp3 => "audio-16khz-128kbitrate-mono-mp3",
            OutputFormat::Audio16kHz64kbitrateMonoMp3 => "audio-16khz-64kbitrate-mono-mp3",
            OutputFormat::Audio16kHz32kbitrateMonoMp3 => "audio-16khz-32kbitrate-mono-mp3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bearer token returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte length of the token.
    ///
    /// Logged with each synthesis request. The request's real `Content-Length`
    /// is always the SSML body length.
    pub fn declared_length(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({} bytes)", self.0.len())
    }
}

/// Blocking HTTP client for the Bing speech API.
pub struct SpeechClient {
    http: Client,
    token_endpoint: String,
    synthesize_endpoint: String,
    catalog: &'static VoiceCatalog,
}

impl Default for SpeechClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechClient {
    /// Client against the public service endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(TOKEN_ENDPOINT, SYNTHESIZE_ENDPOINT)
    }

    /// Client against custom endpoints (proxies, regional hosts, local fakes).
    pub fn with_endpoints(
        token_endpoint: impl Into<String>,
        synthesize_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            token_endpoint: token_endpoint.into(),
            synthesize_endpoint: synthesize_endpoint.into(),
            catalog: VoiceCatalog::builtin(),
        }
    }

    /// Exchange a subscription key for a bearer token.
    pub fn issue_token(&self, api_key: &str) -> Result<Token, BingError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, api_key)
            .header(CONTENT_LENGTH, "0")
            .send()?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BingError::Unauthorized(status.to_string()));
        }
        let response = ensure_success(response)?;
        let token = response.text()?;
        log::debug!("Issued speech token ({} bytes)", token.len());
        Ok(Token(token.trim().to_string()))
    }

    /// Pick the voice for a locale and gender, optionally narrowed by a name hint.
    pub fn resolve_voice(
        &self,
        locale: &str,
        gender: Gender,
        name_hint: &str,
    ) -> Result<&Voice, BingError> {
        self.catalog.resolve(locale, gender, name_hint)
    }

    /// Synthesize `text` and return the encoded audio.
    ///
    /// The voice sent to the service is the one `resolve_voice` picks for the
    /// same arguments.
    pub fn synthesize(
        &self,
        token: &Token,
        text: &str,
        locale: &str,
        gender: Gender,
        voice_name: &str,
        output_format: OutputFormat,
    ) -> Result<Vec<u8>, BingError> {
        let voice = self.resolve_voice(locale, gender, voice_name)?;
        let body = ssml(locale, voice, gender, text);
        log::debug!(
            "Synthesizing {} chars with {} ({}), token length {}",
            text.chars().count(),
            voice.name,
            output_format,
            token.declared_length()
        );

        let response = self
            .http
            .post(&self.synthesize_endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .header(CONTENT_TYPE, "application/ssml+xml")
            .header(OUTPUT_FORMAT_HEADER, output_format.as_str())
            .header("X-Search-AppId", SEARCH_APP_ID)
            .header("X-Search-ClientID", SEARCH_APP_ID)
            .header(USER_AGENT, "anki-tts")
            .body(body)
            .send()?;
        let response = ensure_success(response)?;

        let declared = response.content_length();
        let audio = response.bytes()?.to_vec();
        if let Some(declared) = declared {
            if declared != audio.len() as u64 {
                return Err(BingError::Transport(format!(
                    "declared {declared} audio bytes, received {}",
                    audio.len()
                )));
            }
        }
        Ok(audio)
    }
}

fn ensure_success(response: Response) -> Result<Response, BingError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BingError::Transport(format!(
            "{} from {}",
            status,
            response.url()
        )));
    }
    Ok(response)
}

/// Build the SSML document for one synthesis request.
pub fn ssml(locale: &str, voice: &Voice, gender: Gender, text: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{locale}'><voice name='{}' xml:lang='{locale}' xml:gender='{gender}'>{}</voice></speak>",
        voice.description,
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
