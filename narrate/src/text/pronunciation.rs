//! Literal pronunciation substitutions.

use crate::config::PronunciationEntry;

/// Ordered table of literal replacements.
///
/// Entries are applied one after another over the whole text, so a later
/// entry can match text an earlier entry introduced.
#[derive(Debug, Clone, Default)]
pub struct PronunciationTable {
    entries: Vec<(String, String)>,
}

impl PronunciationTable {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        // An empty key would insert the replacement between every character
        let entries = entries.into_iter().filter(|(word, _)| !word.is_empty()).collect();
        Self { entries }
    }

    pub fn from_config(entries: &[PronunciationEntry]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|e| (e.word.clone(), e.replacement.clone()))
                .collect(),
        )
    }

    pub fn apply(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, (word, replacement)| {
                acc.replace(word.as_str(), replacement)
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
