//! Chunk text to audio, splitting long text into clause-sized units.

use super::{SkipReason, SynthesisOutcome, SynthesisRequest, TtsBackend};
use crate::audio::RenderedAudio;
use std::sync::Arc;

/// Text this long (in characters) or longer is split at clause delimiters.
pub const SPLIT_THRESHOLD_CHARS: usize = 400;

/// Silence appended after every rendered unit.
pub const UNIT_PADDING_SECS: f32 = 0.05;

const CLAUSE_DELIMITERS: [char; 2] = [',', ';'];

/// Split `text` after each clause delimiter, keeping the delimiter on the left part.
///
/// Whitespace-only parts are dropped.
pub fn split_units(text: &str) -> Vec<&str> {
    text.split_inclusive(CLAUSE_DELIMITERS)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Renders chunk text through a `TtsBackend`.
pub struct SpeechRenderer {
    backend: Arc<dyn TtsBackend>,
    speed: f32,
    language: String,
    sample_rate: u32,
}

impl SpeechRenderer {
    pub fn new(
        backend: Arc<dyn TtsBackend>,
        speed: f32,
        language: impl Into<String>,
        sample_rate: u32,
    ) -> Self {
        Self {
            backend,
            speed,
            language: language.into(),
            sample_rate,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Render `text` with `voice`.
    ///
    /// Engine errors never escape: failed units are left out and a chunk with
    /// no rendered units is reported as skipped.
    pub async fn render(&self, text: &str, voice: &str) -> SynthesisOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SynthesisOutcome::Skipped(SkipReason::EmptyText);
        }

        if text.chars().count() < SPLIT_THRESHOLD_CHARS {
            return self.render_unit(text, voice).await;
        }

        let units = split_units(text);
        log::debug!("Splitting {} chars into {} units", text.len(), units.len());

        let mut combined = RenderedAudio::new(Vec::new(), self.sample_rate);
        let mut rendered = 0;
        for unit in units {
            if let SynthesisOutcome::Rendered(audio) = self.render_unit(unit, voice).await {
                combined.append(audio);
                rendered += 1;
            }
        }

        if rendered == 0 {
            return SynthesisOutcome::Skipped(SkipReason::NoUnitsRendered);
        }
        SynthesisOutcome::Rendered(combined)
    }

    async fn render_unit(&self, text: &str, voice: &str) -> SynthesisOutcome {
        let request = SynthesisRequest {
            text,
            voice,
            speed: self.speed,
            language: &self.language,
        };

        let mut audio = match self.backend.synthesize(&request).await {
            Ok(audio) => audio,
            Err(e) => {
                log::warn!("{} failed on {:?}: {}", self.backend.name(), preview(text), e);
                return SynthesisOutcome::Skipped(SkipReason::EngineFailed(e.to_string()));
            }
        };

        if audio.sample_rate != self.sample_rate {
            log::warn!(
                "Skipping {:?}: engine produced {} Hz, expected {} Hz",
                preview(text),
                audio.sample_rate,
                self.sample_rate
            );
            return SynthesisOutcome::Skipped(SkipReason::SampleRateMismatch {
                expected: self.sample_rate,
                actual: audio.sample_rate,
            });
        }

        audio.pad_silence(UNIT_PADDING_SECS);
        SynthesisOutcome::Rendered(audio)
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        out.push_str("...");
    }
    out
}
