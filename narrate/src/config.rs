//! narrate configuration management.

use crate::error::{NarrateError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Defaults for the Kokoro voice set
const DEFAULT_SAMPLE_RATE: u32 = 24000;
const DEFAULT_SPEED: f32 = 1.0;
const DEFAULT_LANGUAGE: &str = "en-us";
const DEFAULT_NARRATOR_VOICE: &str = "am_michael";

/// A character-name (or substring) to voice id mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub character: String,
    pub voice: String,
}

/// A literal text replacement applied before synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationEntry {
    pub word: String,
    pub replacement: String,
}

/// External TTS program invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Program to run (e.g. "kokoro-tts")
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments; `{voice}`, `{speed}`, `{lang}` and `{output}` are substituted per call
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Directory receiving the `parts/` folder
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Tab-separated token transcript
    #[serde(default = "default_tokens_file")]
    pub tokens_file: PathBuf,

    /// Book description JSON holding the `characters` list
    #[serde(default = "default_book_file")]
    pub book_file: PathBuf,

    /// Chapter metadata output (JSON array of {title, start})
    #[serde(default = "default_metadata_file")]
    pub metadata_file: PathBuf,

    /// Rendered chunks per part file
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// First chunk number to render; also the first part number written
    #[serde(default = "default_start_from_part")]
    pub start_from_part: usize,

    /// Chunks synthesized at the same time
    #[serde(default = "default_render_concurrency")]
    pub render_concurrency: usize,

    /// Render the trailing chunk and write the trailing partial batch at end of stream
    #[serde(default)]
    pub flush_trailing: bool,

    /// Sample rate every part file is written at
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Speaking speed passed to the engine
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Language tag passed to the engine
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Voice table, matched in definition order
    #[serde(default = "default_voices")]
    pub voices: Vec<VoiceEntry>,

    /// Pronunciation table, applied in definition order
    #[serde(default)]
    pub pronunciations: Vec<PronunciationEntry>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output/audiobook_parts")
}

fn default_tokens_file() -> PathBuf {
    PathBuf::from("input/book_analysis.tokens")
}

fn default_book_file() -> PathBuf {
    PathBuf::from("input/my_book.book")
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("output/chapter_metadata.json")
}

fn default_batch_size() -> usize {
    1
}

fn default_start_from_part() -> usize {
    1
}

fn default_render_concurrency() -> usize {
    1
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_voices() -> Vec<VoiceEntry> {
    vec![VoiceEntry {
        character: "Narrator".to_string(),
        voice: DEFAULT_NARRATOR_VOICE.to_string(),
    }]
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            tokens_file: default_tokens_file(),
            book_file: default_book_file(),
            metadata_file: default_metadata_file(),
            batch_size: default_batch_size(),
            start_from_part: default_start_from_part(),
            render_concurrency: default_render_concurrency(),
            flush_trailing: false,
            sample_rate: default_sample_rate(),
            speed: default_speed(),
            language: default_language(),
            engine: EngineConfig::default(),
            voices: default_voices(),
            pronunciations: Vec::new(),
        }
    }
}

impl NarrateConfig {
    /// Get the config file path: ~/.config/cli-programs/narrate.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cli-programs")
            .join("narrate.toml")
    }

    /// Load config from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: NarrateConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NarrateError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.start_from_part == 0 {
            return Err(NarrateError::InvalidConfig(
                "start_from_part counts from 1".to_string(),
            ));
        }
        if self.render_concurrency == 0 {
            return Err(NarrateError::InvalidConfig(
                "render_concurrency must be at least 1".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(NarrateError::InvalidConfig(
                "sample_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory the numbered part files are written to.
    pub fn parts_dir(&self) -> PathBuf {
        self.output_dir.join("parts")
    }
}
