//! Command line flags and the credentials file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use serde::Deserialize;

use crate::pipeline::{AugmentConfig, AugmentConfigBuilder};

/// Database file inside a collection directory.
pub const COLLECTION_DB: &str = "collection.anki2";

/// Media directory inside a collection directory.
pub const MEDIA_DIR: &str = "collection.media";

/// Credentials file name, looked up in the home directory.
pub const CONFIG_FILE: &str = ".anki-tts";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot determine the home directory")]
    NoHomeDir,
    #[error("{0}")]
    Invalid(String),
}

/// Add synthesized speech to the fields of an Anki deck.
#[derive(Debug, Clone, Parser)]
#[command(name = "anki-tts", version, about)]
pub struct Params {
    /// Collection directory (the one holding collection.anki2)
    #[arg(short = 'c', long, value_parser = NonEmptyStringValueParser::new())]
    pub collection_dir: String,

    /// Note type whose fields are voiced
    #[arg(short = 't', long, value_parser = NonEmptyStringValueParser::new())]
    pub note_type: String,

    /// Deck name
    #[arg(short = 'd', long, value_parser = NonEmptyStringValueParser::new())]
    pub deck: String,

    /// Locale of the field text, e.g. es-ES
    #[arg(short = 'l', long, value_parser = NonEmptyStringValueParser::new())]
    pub locale: String,

    /// Speech columns (comma delimited)
    #[arg(short = 's', long, default_value = "Back")]
    pub speech_columns: String,

    /// Voice gender: male or female
    #[arg(short = 'g', long, default_value = "female")]
    pub gender: String,

    /// Part of a voice name; empty picks the default voice
    #[arg(short = 'v', long, default_value = "")]
    pub voice: String,

    /// Save changes without asking
    #[arg(long)]
    pub yes: bool,
}

impl Params {
    /// Configured field names, trimmed, empty entries dropped.
    pub fn speech_columns(&self) -> Vec<String> {
        self.speech_columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn collection_dir(&self) -> &Path {
        Path::new(&self.collection_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.collection_dir().join(COLLECTION_DB)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.collection_dir().join(MEDIA_DIR)
    }

    pub fn augment_config(&self) -> Result<AugmentConfig, ConfigError> {
        let columns = self.speech_columns();
        if columns.is_empty() {
            return Err(ConfigError::Invalid("no speech columns given".to_string()));
        }
        AugmentConfigBuilder::default()
            .deck_name(self.deck.as_str())
            .model_name(self.note_type.as_str())
            .speech_columns(columns)
            .locale(self.locale.as_str())
            .media_dir(self.media_dir())
            .build()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Contents of the credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "SpeechApiKey")]
    pub speech_api_key: String,
}

impl Config {
    /// `~/.anki-tts`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE))
            .ok_or(ConfigError::NoHomeDir)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if config.speech_api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{}: SpeechApiKey is empty",
                path.display()
            )));
        }
        log::debug!("Config loaded from: {}", path.display());
        Ok(config)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path()?)
    }
}
