use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrateError {
    #[error("Voice map has no \"Narrator\" entry; every unmapped speaker needs a fallback voice")]
    MissingNarratorVoice,

    #[error("Token file not found: {}", .0.display())]
    MissingTokenFile(PathBuf),

    #[error("Engine program not configured. Set [engine] program in the config file.")]
    EngineNotConfigured,

    #[error("Engine failed{}: {message}", .status.map(|c| format!(" (exit {})", c)).unwrap_or_default())]
    Engine {
        message: String,
        status: Option<i32>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, NarrateError>;
