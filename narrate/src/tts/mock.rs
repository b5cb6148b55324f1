//! Mock TTS backend for testing
//!
//! Produces deterministic audio whose length follows the text length, and
//! fails on any text containing a configured marker.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{SynthesisRequest, TtsBackend};
use crate::audio::RenderedAudio;
use crate::error::{NarrateError, Result};

pub struct MockBackend {
    /// Samples produced per character of input
    samples_per_char: usize,
    sample_rate: u32,
    /// Texts containing any of these fail
    fail_on: Vec<String>,
    /// Every request received, as (text, voice)
    calls: Mutex<Vec<(String, String)>>,
}

impl MockBackend {
    pub fn new(samples_per_char: usize, sample_rate: u32) -> Self {
        Self {
            samples_per_char,
            sample_rate,
            fail_on: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request whose text contains `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on.push(marker.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TtsBackend for MockBackend {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RenderedAudio> {
        self.calls
            .lock()
            .unwrap()
            .push((request.text.to_string(), request.voice.to_string()));

        if self.fail_on.iter().any(|m| request.text.contains(m.as_str())) {
            return Err(NarrateError::Engine {
                message: format!("mock failure for {:?}", request.text),
                status: Some(1),
            });
        }

        // Encode the text length in the amplitude so different chunks differ
        let len = request.text.chars().count();
        let value = (len % 100) as f32 / 100.0;
        Ok(RenderedAudio::new(
            vec![value; len * self.samples_per_char],
            self.sample_rate,
        ))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SynthesisRequest<'_> {
        SynthesisRequest {
            text,
            voice: "am_michael",
            speed: 1.0,
            language: "en-us",
        }
    }

    #[tokio::test]
    async fn test_mock_renders_by_length() {
        let backend = MockBackend::new(10, 24000);
        let audio = backend.synthesize(&request("abcd")).await.unwrap();
        assert_eq!(audio.samples.len(), 40);
        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.calls()[0], ("abcd".to_string(), "am_michael".to_string()));
    }

    #[tokio::test]
    async fn test_mock_fails_on_marker() {
        let backend = MockBackend::new(10, 24000).failing_on("BOOM");
        assert!(backend.synthesize(&request("a BOOM b")).await.is_err());
        assert!(backend.synthesize(&request("fine")).await.is_ok());
        assert_eq!(backend.call_count(), 2);
    }
}
