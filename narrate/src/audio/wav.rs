//! WAV reading and writing.

use super::RenderedAudio;
use crate::error::Result;
use std::path::Path;

/// Destination for finished part files.
pub trait AudioSink: Send {
    fn write(&mut self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Writes 16-bit PCM mono WAV files.
#[derive(Debug, Default)]
pub struct WavSink;

impl AudioSink for WavSink {
    fn write(&mut self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in samples {
            let scaled = (sample * 32767.0).clamp(-32767.0, 32767.0) as i16;
            writer.write_sample(scaled)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Read a WAV file into mono float samples, averaging channels.
pub fn read_wav(path: &Path) -> Result<RenderedAudio> {
    decode_wav(hound::WavReader::open(path)?)
}

/// Decode an in-memory WAV stream (e.g. captured engine stdout).
pub fn read_wav_bytes(bytes: &[u8]) -> Result<RenderedAudio> {
    decode_wav(hound::WavReader::new(std::io::Cursor::new(bytes))?)
}

fn decode_wav<R: std::io::Read>(mut reader: hound::WavReader<R>) -> Result<RenderedAudio> {
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(RenderedAudio::new(samples, spec.sample_rate))
}
