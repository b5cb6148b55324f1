//! Token transcript parsing.
//!
//! The transcript is a tab-separated table with one row per token and a
//! header row. Only three columns matter here: the paragraph id (0), the
//! word (4) and the speaker id (13).

use crate::error::{NarrateError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// Rows with fewer fields than this are skipped.
pub const MIN_FIELDS: usize = 14;

const PARAGRAPH_FIELD: usize = 0;
const WORD_FIELD: usize = 4;
const SPEAKER_FIELD: usize = 13;

/// One token row of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub paragraph_id: String,
    pub word: String,
    pub speaker_id: String,
}

impl TokenRecord {
    pub fn new(
        paragraph_id: impl Into<String>,
        word: impl Into<String>,
        speaker_id: impl Into<String>,
    ) -> Self {
        Self {
            paragraph_id: paragraph_id.into(),
            word: word.into(),
            speaker_id: speaker_id.into(),
        }
    }

    /// Parse one row, returning `None` for rows with too few fields.
    ///
    /// Surrounding whitespace (tabs included) is trimmed first, so empty
    /// trailing fields do not count toward the field minimum.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        Some(Self::new(
            fields[PARAGRAPH_FIELD],
            fields[WORD_FIELD],
            fields[SPEAKER_FIELD],
        ))
    }
}

/// Iterator over the valid records of a transcript.
///
/// The header row is consumed on construction. Malformed rows are counted
/// and skipped.
pub struct TokenReader<R> {
    lines: Lines<R>,
    line_number: usize,
    malformed: usize,
}

impl TokenReader<BufReader<File>> {
    /// Open a transcript file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NarrateError::MissingTokenFile(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file))?)
    }
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        let mut lines = reader.lines();
        // Header row
        if let Some(header) = lines.next() {
            header?;
        }
        Ok(Self {
            lines,
            line_number: 1,
            malformed: 0,
        })
    }

    /// Rows skipped so far for having too few fields.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

impl<R: BufRead> Iterator for TokenReader<R> {
    type Item = io::Result<TokenRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            self.line_number += 1;

            match TokenRecord::parse_line(&line) {
                Some(record) => return Some(Ok(record)),
                None => {
                    self.malformed += 1;
                    log::debug!(
                        "Skipping malformed token row {} ({} fields)",
                        self.line_number,
                        line.split('\t').count()
                    );
                }
            }
        }
    }
}
