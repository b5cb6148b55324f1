//! Text cleaning for TTS processing.
//!
//! Chunks arrive as word tokens joined by single spaces, so punctuation and
//! contractions have to be glued back onto their words before synthesis.

use once_cell::sync::Lazy;
use regex::Regex;

/// Whitespace before an apostrophe-led fragment ("John 's", "we ’ll").
static SPACE_BEFORE_APOSTROPHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(['’][a-zA-Z]+)").unwrap());

/// Whitespace before a split negation ("do n't").
static SPACE_BEFORE_NEGATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(n['’]t)").unwrap());

/// Whitespace before sentence punctuation.
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());

/// A hyphen together with any whitespace around it.
static HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Curly quotes and their straight replacements.
const CURLY_QUOTES: &[(char, char)] = &[
    ('\u{2018}', '\''), // Left single quote
    ('\u{2019}', '\''), // Right single quote
    ('\u{201c}', '"'),  // Left double quote
    ('\u{201d}', '"'),  // Right double quote
];

/// Normalize space-joined tokens into speakable text.
///
/// This function:
/// - Reattaches contractions and punctuation to the preceding word
/// - Replaces curly quotes with straight ones
/// - Turns hyphens into word separators
/// - Collapses whitespace and trims
///
/// The result may be empty. Normalizing normalized text returns it unchanged.
pub fn normalize(text: &str) -> String {
    let text = reattach_punctuation(text);
    let text = straighten_quotes(&text);
    let text = HYPHEN.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    // Dehyphenation can leave " ." behind ("well - ." -> "well .")
    reattach_punctuation(text.trim())
}

/// Remove the space the tokenizer put before contractions and punctuation.
///
/// Repeats until nothing changes: gluing "n 't" creates a fresh " n't".
fn reattach_punctuation(text: &str) -> String {
    let mut text = text.to_string();
    loop {
        let next = SPACE_BEFORE_APOSTROPHE.replace_all(&text, "$1");
        let next = SPACE_BEFORE_NEGATION.replace_all(&next, "$1");
        let next = SPACE_BEFORE_PUNCT.replace_all(&next, "$1").into_owned();
        if next == text {
            return text;
        }
        text = next;
    }
}

fn straighten_quotes(text: &str) -> String {
    text.chars()
        .map(|c| {
            CURLY_QUOTES
                .iter()
                .find(|(curly, _)| *curly == c)
                .map(|(_, straight)| *straight)
                .unwrap_or(c)
        })
        .collect()
}
