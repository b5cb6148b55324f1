//! Text processing module for TTS: segmentation, cleaning, and pronunciation.

pub mod cleaner;
pub mod pronunciation;
pub mod segmenter;

pub use cleaner::normalize;
pub use pronunciation::PronunciationTable;
pub use segmenter::Chunks;

/// A run of tokens from one paragraph and one speaker, synthesized as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence number, starting at 1
    pub number: usize,
    /// The paragraph every token belongs to
    pub paragraph_id: String,
    /// The speaker every token belongs to
    pub speaker_id: String,
    /// Token texts in transcript order
    pub words: Vec<String>,
}

impl Chunk {
    /// Tokens joined with single spaces, as they appear in the transcript.
    pub fn joined(&self) -> String {
        self.words.join(" ")
    }

    /// Normalized, speakable text.
    pub fn text(&self) -> String {
        normalize(&self.joined())
    }
}
