//! Token stream segmentation into synthesis chunks.

use super::Chunk;
use crate::transcript::TokenRecord;

/// Token texts that close the chunk they are appended to.
pub const SENTENCE_TERMINATORS: &[&str] = &[".", "!", "?", "\u{201d}", "\u{2019}"];

/// A chunk that grows past this many tokens closes on the token that overflowed it.
pub const MAX_CHUNK_TOKENS: usize = 25;

/// Check whether a token's literal text ends a chunk.
pub fn is_terminator(word: &str) -> bool {
    SENTENCE_TERMINATORS.contains(&word)
}

/// A chunk still accepting tokens.
#[derive(Debug)]
struct OpenChunk {
    paragraph_id: String,
    speaker_id: String,
    words: Vec<String>,
}

#[derive(Debug, Default)]
enum State {
    /// No chunk is open.
    #[default]
    Idle,
    /// Tokens are collecting into a chunk of one paragraph and one speaker.
    Accumulating(OpenChunk),
}

/// Splits a token stream into chunks.
///
/// A chunk closes when:
/// - the next token belongs to another paragraph or speaker (that token opens the next chunk)
/// - a terminator token is appended (it stays in the chunk it closes)
/// - an appended token takes the chunk past `MAX_CHUNK_TOKENS`
///
/// Chunks therefore hold at most `MAX_CHUNK_TOKENS + 1` tokens.
///
/// Chunks are numbered from 1 in emission order.
#[derive(Debug, Default)]
pub struct ChunkSegmenter {
    state: State,
    emitted: usize,
}

impl ChunkSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one token, returning the chunks it closed (zero, one or two).
    pub fn push(&mut self, token: TokenRecord) -> Vec<Chunk> {
        let mut closed = Vec::new();

        match std::mem::take(&mut self.state) {
            State::Idle => self.open(token, &mut closed),
            State::Accumulating(mut chunk) => {
                if chunk.paragraph_id != token.paragraph_id || chunk.speaker_id != token.speaker_id {
                    closed.push(self.seal(chunk));
                    self.open(token, &mut closed);
                    return closed;
                }

                let terminator = is_terminator(&token.word);
                chunk.words.push(token.word);
                if terminator || chunk.words.len() > MAX_CHUNK_TOKENS {
                    closed.push(self.seal(chunk));
                } else {
                    self.state = State::Accumulating(chunk);
                }
            }
        }

        closed
    }

    /// End the stream, returning the chunk that was still open.
    pub fn finish(mut self) -> Option<Chunk> {
        match std::mem::take(&mut self.state) {
            State::Idle => None,
            State::Accumulating(chunk) => Some(self.seal(chunk)),
        }
    }

    fn open(&mut self, token: TokenRecord, closed: &mut Vec<Chunk>) {
        let terminator = is_terminator(&token.word);
        let chunk = OpenChunk {
            paragraph_id: token.paragraph_id,
            speaker_id: token.speaker_id,
            words: vec![token.word],
        };

        if terminator {
            closed.push(self.seal(chunk));
        } else {
            self.state = State::Accumulating(chunk);
        }
    }

    fn seal(&mut self, chunk: OpenChunk) -> Chunk {
        self.emitted += 1;
        Chunk {
            number: self.emitted,
            paragraph_id: chunk.paragraph_id,
            speaker_id: chunk.speaker_id,
            words: chunk.words,
        }
    }
}

/// Iterator adapter turning a token stream into chunks.
///
/// The chunk left open at the end of the stream is only yielded when
/// `flush_trailing` is set.
pub struct Chunks<I> {
    tokens: I,
    segmenter: Option<ChunkSegmenter>,
    ready: std::collections::VecDeque<Chunk>,
    flush_trailing: bool,
    trailing_dropped: Option<usize>,
}

impl<I> Chunks<I> {
    pub fn new(tokens: I, flush_trailing: bool) -> Self {
        Self {
            tokens,
            segmenter: Some(ChunkSegmenter::new()),
            ready: std::collections::VecDeque::new(),
            flush_trailing,
            trailing_dropped: None,
        }
    }

    pub fn tokens(&self) -> &I {
        &self.tokens
    }

    /// Token count of the trailing chunk dropped at end of stream, if any.
    pub fn trailing_dropped(&self) -> Option<usize> {
        self.trailing_dropped
    }
}

impl<I, E> Iterator for Chunks<I>
where
    I: Iterator<Item = Result<TokenRecord, E>>,
{
    type Item = Result<Chunk, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(Ok(chunk));
            }

            let segmenter = self.segmenter.as_mut()?;
            match self.tokens.next() {
                Some(Ok(token)) => self.ready.extend(segmenter.push(token)),
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    let trailing = self.segmenter.take().and_then(ChunkSegmenter::finish);
                    match trailing {
                        Some(chunk) if self.flush_trailing => return Some(Ok(chunk)),
                        Some(chunk) => {
                            self.trailing_dropped = Some(chunk.words.len());
                            return None;
                        }
                        None => return None,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::convert::Infallible;

    fn tok(paragraph: &str, word: &str, speaker: &str) -> TokenRecord {
        TokenRecord::new(paragraph, word, speaker)
    }

    fn segment(tokens: Vec<TokenRecord>) -> (Vec<Chunk>, Option<Chunk>) {
        let mut segmenter = ChunkSegmenter::new();
        let mut chunks = Vec::new();
        for token in tokens {
            chunks.extend(segmenter.push(token));
        }
        (chunks, segmenter.finish())
    }

    #[test]
    fn test_terminator_closes_chunk() {
        let (chunks, trailing) = segment(vec![
            tok("1", "Hello", "S1"),
            tok("1", "world", "S1"),
            tok("1", ".", "S1"),
        ]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].words, vec!["Hello", "world", "."]);
        assert_eq!(chunks[0].number, 1);
        assert_eq!(chunks[0].text(), "Hello world.");
        assert!(trailing.is_none());
    }

    #[test]
    fn test_all_terminators() {
        for terminator in SENTENCE_TERMINATORS {
            let (chunks, trailing) = segment(vec![tok("1", "Yes", "S"), tok("1", terminator, "S")]);
            assert_eq!(chunks.len(), 1, "terminator {:?}", terminator);
            assert!(trailing.is_none());
        }
        assert!(!is_terminator(","));
        assert!(!is_terminator("\""));
    }

    #[test]
    fn test_paragraph_change_starts_new_chunk() {
        let (chunks, trailing) = segment(vec![
            tok("1", "First", "S"),
            tok("2", "Second", "S"),
            tok("2", "!", "S"),
        ]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].words, vec!["First"]);
        assert_eq!(chunks[0].paragraph_id, "1");
        assert_eq!(chunks[1].words, vec!["Second", "!"]);
        assert_eq!(chunks[1].paragraph_id, "2");
        assert!(trailing.is_none());
    }

    #[test]
    fn test_speaker_change_starts_new_chunk() {
        let (chunks, trailing) = segment(vec![
            tok("1", "said", "0"),
            tok("1", "Run", "7"),
            tok("1", "now", "7"),
        ]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].speaker_id, "0");
        let trailing = trailing.unwrap();
        assert_eq!(trailing.speaker_id, "7");
        assert_eq!(trailing.words, vec!["Run", "now"]);
        assert_eq!(trailing.number, 2);
    }

    #[test]
    fn test_terminator_opening_a_chunk_closes_it() {
        let (chunks, _) = segment(vec![tok("1", "Hi", "A"), tok("2", ".", "A")]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].words, vec!["."]);
    }

    #[test]
    fn test_length_cap() {
        let tokens: Vec<_> = (0..60).map(|i| tok("1", &format!("w{}", i), "S")).collect();
        let (chunks, trailing) = segment(tokens);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].words.len(), MAX_CHUNK_TOKENS + 1);
        assert_eq!(chunks[0].words.last().unwrap(), "w25");
        assert_eq!(chunks[1].words.len(), MAX_CHUNK_TOKENS + 1);
        assert_eq!(chunks[1].words[0], "w26");
        assert_eq!(trailing.unwrap().words.len(), 8);
    }

    #[test]
    fn test_unterminated_run_keeps_chunk_numbers() {
        // 30 plain tokens then a sentence: the long run yields one chunk of 26
        let mut tokens: Vec<_> = (0..30).map(|i| tok("1", &format!("w{}", i), "S")).collect();
        tokens.push(tok("1", ".", "S"));
        tokens.push(tok("1", "Next", "S"));
        tokens.push(tok("1", ".", "S"));
        let (chunks, trailing) = segment(tokens);

        let sizes: Vec<usize> = chunks.iter().map(|c| c.words.len()).collect();
        assert_eq!(sizes, vec![26, 5, 2]);
        assert_eq!(chunks[2].number, 3);
        assert_eq!(chunks[2].words, vec!["Next", "."]);
        assert!(trailing.is_none());
    }

    #[test]
    fn test_terminator_extends_full_chunk_to_26() {
        let mut tokens: Vec<_> = (0..25).map(|i| tok("1", &format!("w{}", i), "S")).collect();
        tokens.push(tok("1", "?", "S"));
        let (chunks, trailing) = segment(tokens);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].words.len(), MAX_CHUNK_TOKENS + 1);
        assert_eq!(chunks[0].words.last().unwrap(), "?");
        assert!(trailing.is_none());
    }

    #[test]
    fn test_numbering_is_sequential() {
        let (chunks, _) = segment(vec![
            tok("1", "A", "S"),
            tok("1", ".", "S"),
            tok("2", "B", "T"),
            tok("2", ".", "T"),
            tok("3", "C", "S"),
            tok("3", "!", "S"),
        ]);
        let numbers: Vec<usize> = chunks.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_finish_on_empty_stream() {
        assert!(ChunkSegmenter::new().finish().is_none());
    }

    #[test]
    fn test_chunks_adapter_drops_trailing_by_default() {
        let tokens = vec![
            tok("1", "Done", "S"),
            tok("1", ".", "S"),
            tok("1", "Left", "S"),
            tok("1", "over", "S"),
        ];
        let mut chunks = Chunks::new(tokens.clone().into_iter().map(Ok::<_, Infallible>), false);
        let emitted: Vec<Chunk> = chunks.by_ref().map(|c| c.unwrap()).collect();
        assert_eq!(emitted.len(), 1);
        assert_eq!(chunks.trailing_dropped(), Some(2));

        let flushed: Vec<Chunk> = Chunks::new(tokens.into_iter().map(Ok::<_, Infallible>), true)
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[1].words, vec!["Left", "over"]);
        assert_eq!(flushed[1].number, 2);
    }

    #[test]
    fn test_chunks_adapter_propagates_errors() {
        let tokens: Vec<Result<TokenRecord, &str>> = vec![Ok(tok("1", "a", "S")), Err("boom")];
        let mut chunks = Chunks::new(tokens.into_iter(), true);
        assert_eq!(chunks.next().unwrap().unwrap_err(), "boom");
    }

    fn token_strategy() -> impl Strategy<Value = TokenRecord> {
        (
            0..3u8,
            prop_oneof![
                4 => "[a-z]{1,6}",
                1 => prop::sample::select(vec![".", "!", "?", "\u{201d}", "\u{2019}", ","])
                    .prop_map(|s| s.to_string()),
            ],
            0..2u8,
        )
            .prop_map(|(p, w, s)| TokenRecord::new(p.to_string(), w, s.to_string()))
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_token_stream(
            tokens in prop::collection::vec(token_strategy(), 0..120)
        ) {
            let words: Vec<String> = tokens.iter().map(|t| t.word.clone()).collect();
            let (chunks, trailing) = segment(tokens);
            let rebuilt: Vec<String> = chunks
                .iter()
                .chain(trailing.iter())
                .flat_map(|c| c.words.clone())
                .collect();
            prop_assert_eq!(rebuilt, words);
        }

        #[test]
        fn prop_chunks_respect_boundaries(
            tokens in prop::collection::vec(token_strategy(), 0..200)
        ) {
            let ids: Vec<(String, String)> = tokens
                .iter()
                .map(|t| (t.paragraph_id.clone(), t.speaker_id.clone()))
                .collect();
            let (chunks, trailing) = segment(tokens);

            // Chunks cover the stream contiguously, so walk it with an offset
            let mut offset = 0;
            for chunk in chunks.iter().chain(trailing.iter()) {
                prop_assert!(!chunk.words.is_empty());
                prop_assert!(chunk.words.len() <= MAX_CHUNK_TOKENS + 1);
                for (p, s) in &ids[offset..offset + chunk.words.len()] {
                    prop_assert_eq!(p, &chunk.paragraph_id);
                    prop_assert_eq!(s, &chunk.speaker_id);
                }
                offset += chunk.words.len();
            }
        }
    }
}
