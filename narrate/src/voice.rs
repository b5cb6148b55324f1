//! Speaker to voice resolution.

use crate::config::VoiceEntry;
use crate::error::{NarrateError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Voice-map key every unmatched character falls back to.
pub const NARRATOR: &str = "Narrator";

/// Display name used for speaker ids missing from the character map.
pub const UNKNOWN_CHARACTER: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct BookFile {
    #[serde(default)]
    characters: Vec<CharacterEntry>,
}

#[derive(Debug, Deserialize)]
struct CharacterEntry {
    id: serde_json::Value,
    #[serde(default)]
    text: Option<String>,
}

/// Speaker id to display name, read from the book description.
#[derive(Debug, Clone, Default)]
pub struct CharacterMap {
    names: HashMap<String, String>,
}

impl CharacterMap {
    /// Load the `characters` list from a book JSON file.
    ///
    /// A missing file yields an empty map, so every speaker resolves to the narrator.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "Book file {} not found; all speakers will use the narrator voice",
                path.display()
            );
            return Ok(Self::default());
        }

        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let book: BookFile = serde_json::from_str(json)?;
        Ok(Self::from_book(book))
    }

    fn from_book(book: BookFile) -> Self {
        let names = book
            .characters
            .into_iter()
            .map(|c| {
                let id = match c.id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                let name = c.text.unwrap_or_else(|| UNKNOWN_CHARACTER.to_string());
                (id, name)
            })
            .collect();
        Self { names }
    }

    #[cfg(test)]
    pub fn insert(&mut self, speaker_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(speaker_id.into(), name.into());
    }

    pub fn name(&self, speaker_id: &str) -> Option<&str> {
        self.names.get(speaker_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolves a speaker id to a synthesis voice.
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    characters: CharacterMap,
    voices: Vec<(String, String)>,
    narrator_voice: String,
}

impl VoiceResolver {
    /// Build a resolver; the voice table must contain a `"Narrator"` entry.
    pub fn new(characters: CharacterMap, voices: Vec<(String, String)>) -> Result<Self> {
        let narrator_voice = voices
            .iter()
            .find(|(key, _)| key == NARRATOR)
            .map(|(_, voice)| voice.clone())
            .ok_or(NarrateError::MissingNarratorVoice)?;

        Ok(Self {
            characters,
            voices,
            narrator_voice,
        })
    }

    pub fn from_config(characters: CharacterMap, voices: &[VoiceEntry]) -> Result<Self> {
        Self::new(
            characters,
            voices
                .iter()
                .map(|v| (v.character.clone(), v.voice.clone()))
                .collect(),
        )
    }

    /// Display name for a speaker id.
    pub fn character_name<'a>(&'a self, speaker_id: &str) -> &'a str {
        self.characters.name(speaker_id).unwrap_or(UNKNOWN_CHARACTER)
    }

    /// Voice for a speaker id: exact name match, then the first key contained
    /// in the name, then the narrator.
    pub fn resolve(&self, speaker_id: &str) -> &str {
        self.voice_for_name(self.character_name(speaker_id))
    }

    pub fn voice_for_name(&self, name: &str) -> &str {
        if let Some((_, voice)) = self.voices.iter().find(|(key, _)| key == name) {
            return voice;
        }
        self.voices
            .iter()
            .find(|(key, _)| name.contains(key.as_str()))
            .map(|(_, voice)| voice.as_str())
            .unwrap_or(self.narrator_voice.as_str())
    }
}
