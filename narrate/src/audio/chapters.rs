//! Chapter heading detection and chapter metadata output.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Headings must be shorter than this (in characters) to count as a chapter.
pub const MAX_HEADING_CHARS: usize = 60;

/// A chapter start in cumulative audio time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub title: String,
    /// Start position in seconds
    pub start: f64,
}

/// Check whether clean chunk text reads like a chapter heading.
pub fn is_chapter_heading(text: &str) -> bool {
    text.to_lowercase().contains("chapter") && text.chars().count() < MAX_HEADING_CHARS
}

/// Collects chapter markers as chunks are accounted.
#[derive(Debug, Default)]
pub struct ChapterTracker {
    markers: Vec<ChapterMarker>,
}

impl ChapterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text` as a chapter starting at `elapsed_secs` if it is a heading.
    ///
    /// `elapsed_secs` must be the duration rendered before this chunk.
    pub fn observe(&mut self, text: &str, elapsed_secs: f64) -> bool {
        if !is_chapter_heading(text) {
            return false;
        }

        debug_assert!(
            self.markers.last().is_none_or(|m| m.start <= elapsed_secs),
            "chapter starts must not decrease"
        );
        log::info!("Chapter \"{}\" starts at {:.2}s", text, elapsed_secs);
        self.markers.push(ChapterMarker {
            title: text.to_string(),
            start: elapsed_secs,
        });
        true
    }

    #[cfg(test)]
    pub fn markers(&self) -> &[ChapterMarker] {
        &self.markers
    }

    pub fn into_markers(self) -> Vec<ChapterMarker> {
        self.markers
    }
}

/// Write markers as a 4-space indented JSON array, replacing any existing file.
pub fn write_chapter_metadata(markers: &[ChapterMarker], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    markers.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

/// Read markers written by `write_chapter_metadata`.
#[cfg(test)]
pub fn read_chapter_metadata(path: &Path) -> Result<Vec<ChapterMarker>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
