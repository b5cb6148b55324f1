//! TTS backend trait and types.

pub mod command;
#[cfg(test)]
pub mod mock;
pub mod renderer;

use crate::audio::RenderedAudio;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

pub use renderer::SpeechRenderer;

/// One synthesis call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    /// Engine voice id (e.g. "am_michael")
    pub voice: &'a str,
    pub speed: f32,
    /// Language tag (e.g. "en-us")
    pub language: &'a str,
}

/// Why a text unit or chunk produced no audio.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Nothing left to speak after normalization
    EmptyText,
    /// The engine returned an error
    EngineFailed(String),
    /// The engine produced audio at an unexpected rate
    SampleRateMismatch { expected: u32, actual: u32 },
    /// Every unit of a split chunk was skipped
    NoUnitsRendered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyText => write!(f, "nothing to speak"),
            SkipReason::EngineFailed(message) => write!(f, "engine failed: {}", message),
            SkipReason::SampleRateMismatch { expected, actual } => {
                write!(f, "engine produced {} Hz, expected {} Hz", actual, expected)
            }
            SkipReason::NoUnitsRendered => write!(f, "every unit failed"),
        }
    }
}

/// Result of rendering a text unit or a whole chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Rendered(RenderedAudio),
    Skipped(SkipReason),
}

#[cfg(test)]
impl SynthesisOutcome {
    pub fn audio(self) -> Option<RenderedAudio> {
        match self {
            SynthesisOutcome::Rendered(audio) => Some(audio),
            SynthesisOutcome::Skipped(_) => None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, SynthesisOutcome::Rendered(_))
    }
}

/// TTS backend trait - all TTS engines implement this.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize text to mono float samples.
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RenderedAudio>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
