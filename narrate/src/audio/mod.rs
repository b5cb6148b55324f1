//! Audio buffers, part batching, and chapter markers.

pub mod batcher;
pub mod chapters;
pub mod wav;

pub use batcher::PartBatcher;
pub use chapters::{ChapterMarker, ChapterTracker};
pub use wav::{AudioSink, WavSink};

/// Mono float PCM produced by the TTS engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl RenderedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Append `secs` of silence.
    pub fn pad_silence(&mut self, secs: f32) {
        let count = (self.sample_rate as f32 * secs) as usize;
        self.samples.resize(self.samples.len() + count, 0.0);
    }

    /// Append another buffer recorded at the same rate.
    pub fn append(&mut self, other: RenderedAudio) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        self.samples.extend(other.samples);
    }
}
