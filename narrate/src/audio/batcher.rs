//! Batching of rendered chunks into numbered part files.

use super::{AudioSink, RenderedAudio};
use crate::error::Result;
use std::path::PathBuf;

/// File name for a part number, zero-padded to three digits.
pub fn part_file_name(part: usize) -> String {
    format!("part_{:03}.wav", part)
}

/// Accumulates chunk audio and writes a part file every `batch_size` chunks.
pub struct PartBatcher<S> {
    sink: S,
    parts_dir: PathBuf,
    batch_size: usize,
    sample_rate: u32,
    next_part: usize,
    pending: Vec<RenderedAudio>,
    elapsed_secs: f64,
    written: Vec<PathBuf>,
}

impl<S: AudioSink> PartBatcher<S> {
    /// Create a batcher whose first part is numbered `start_part`.
    pub fn new(
        sink: S,
        parts_dir: impl Into<PathBuf>,
        batch_size: usize,
        start_part: usize,
        sample_rate: u32,
    ) -> Self {
        Self {
            sink,
            parts_dir: parts_dir.into(),
            batch_size: batch_size.max(1),
            sample_rate,
            next_part: start_part,
            pending: Vec::new(),
            elapsed_secs: 0.0,
            written: Vec::new(),
        }
    }

    /// Add one chunk's audio, flushing a part file once the batch is full.
    ///
    /// Returns the path of the part written, if any.
    pub fn push(&mut self, audio: RenderedAudio) -> Result<Option<PathBuf>> {
        self.elapsed_secs += audio.duration_secs();
        self.pending.push(audio);

        if self.pending.len() >= self.batch_size {
            return self.flush().map(Some);
        }
        Ok(None)
    }

    /// Write whatever is pending as a part file, even if the batch is not full.
    pub fn finish(&mut self) -> Result<Option<PathBuf>> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.flush().map(Some)
    }

    fn flush(&mut self) -> Result<PathBuf> {
        let total: usize = self.pending.iter().map(|a| a.samples.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for audio in self.pending.drain(..) {
            samples.extend(audio.samples);
        }

        let path = self.parts_dir.join(part_file_name(self.next_part));
        self.sink.write(&path, &samples, self.sample_rate)?;
        log::info!("Saved part {:03} ({:.1}s)", self.next_part, total as f64 / self.sample_rate as f64);

        self.next_part += 1;
        self.written.push(path.clone());
        Ok(path)
    }

    /// Seconds of audio accepted so far, including pending audio.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Chunks waiting for the batch to fill.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number the next part file will get.
    #[cfg(test)]
    pub fn next_part(&self) -> usize {
        self.next_part
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    /// Sink that keeps written files in memory.
    #[derive(Debug, Default)]
    pub(crate) struct MemorySink {
        pub files: Vec<(PathBuf, Vec<f32>, u32)>,
    }

    impl AudioSink for MemorySink {
        fn write(&mut self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
            self.files.push((path.to_path_buf(), samples.to_vec(), sample_rate));
            Ok(())
        }
    }

    fn audio(value: f32, len: usize) -> RenderedAudio {
        RenderedAudio::new(vec![value; len], 24000)
    }

    #[test]
    fn test_part_file_name() {
        assert_eq!(part_file_name(1), "part_001.wav");
        assert_eq!(part_file_name(42), "part_042.wav");
        assert_eq!(part_file_name(1234), "part_1234.wav");
    }

    #[test]
    fn test_batch_size_one_flushes_every_chunk() {
        let mut batcher = PartBatcher::new(MemorySink::default(), "/out/parts", 1, 1, 24000);
        assert_eq!(
            batcher.push(audio(0.1, 10)).unwrap(),
            Some(PathBuf::from("/out/parts/part_001.wav"))
        );
        assert_eq!(
            batcher.push(audio(0.2, 10)).unwrap(),
            Some(PathBuf::from("/out/parts/part_002.wav"))
        );
        assert_eq!(batcher.next_part(), 3);
        assert_eq!(batcher.into_sink().files.len(), 2);
    }

    #[test]
    fn test_batch_of_two_leaves_third_pending() {
        let mut batcher = PartBatcher::new(MemorySink::default(), "parts", 2, 5, 24000);
        assert_eq!(batcher.push(audio(0.1, 3)).unwrap(), None);
        assert_eq!(
            batcher.push(audio(0.2, 2)).unwrap(),
            Some(PathBuf::from("parts/part_005.wav"))
        );
        assert_eq!(batcher.push(audio(0.3, 4)).unwrap(), None);
        assert_eq!(batcher.pending(), 1);
        assert_eq!(batcher.next_part(), 6);

        let sink = batcher.into_sink();
        assert_eq!(sink.files.len(), 1);
        let (_, samples, rate) = &sink.files[0];
        assert_eq!(samples, &vec![0.1, 0.1, 0.1, 0.2, 0.2]);
        assert_eq!(*rate, 24000);
    }

    #[test]
    fn test_finish_flushes_partial_batch() {
        let mut batcher = PartBatcher::new(MemorySink::default(), "parts", 3, 1, 24000);
        batcher.push(audio(0.1, 3)).unwrap();
        assert_eq!(
            batcher.finish().unwrap(),
            Some(PathBuf::from("parts/part_001.wav"))
        );
        assert_eq!(batcher.finish().unwrap(), None);
        assert_eq!(batcher.written().len(), 1);
    }

    #[test]
    fn test_elapsed_includes_pending_audio() {
        let mut batcher = PartBatcher::new(MemorySink::default(), "parts", 2, 1, 24000);
        batcher.push(audio(0.0, 24000)).unwrap();
        assert!((batcher.elapsed_secs() - 1.0).abs() < 1e-9);
        batcher.push(audio(0.0, 12000)).unwrap();
        assert!((batcher.elapsed_secs() - 1.5).abs() < 1e-9);
    }
}
