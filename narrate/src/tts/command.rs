//! TTS backend that shells out to an external engine program.
//!
//! The text is written to the program's stdin. Arguments may contain
//! `{voice}`, `{speed}`, `{lang}` and `{output}` placeholders. When an
//! argument names `{output}` the WAV is read from that file afterwards,
//! otherwise the program's stdout is decoded as WAV.

use super::{SynthesisRequest, TtsBackend};
use crate::audio::RenderedAudio;
use crate::audio::wav::{read_wav, read_wav_bytes};
use crate::config::EngineConfig;
use crate::error::{NarrateError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const OUTPUT_PLACEHOLDER: &str = "{output}";

pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    /// Scratch directory for per-call output files
    work_dir: TempDir,
    calls: AtomicUsize,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self> {
        Ok(Self {
            program: program.into(),
            args,
            work_dir: tempfile::Builder::new().prefix("narrate-tts").tempdir()?,
            calls: AtomicUsize::new(0),
        })
    }

    /// Build from the `[engine]` config section.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let program = config
            .program
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(NarrateError::EngineNotConfigured)?;
        Self::new(program, config.args.clone())
    }

    fn writes_output_file(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER))
    }

    fn render_args(&self, request: &SynthesisRequest<'_>, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let speed = request.speed.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{voice}", request.voice)
                    .replace("{speed}", &speed)
                    .replace("{lang}", request.language)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    fn next_output_path(&self) -> PathBuf {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        self.work_dir.path().join(format!("unit_{:06}.wav", n))
    }
}

#[async_trait]
impl TtsBackend for CommandBackend {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RenderedAudio> {
        let output_path = self.next_output_path();
        let args = self.render_args(request, &output_path);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NarrateError::Engine {
                message: format!("failed to start {}: {}", self.program, e),
                status: None,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Programs that never read stdin may exit before we finish writing
            match stdin.write_all(request.text.as_bytes()).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarrateError::Engine {
                message: stderr.trim().to_string(),
                status: output.status.code(),
            });
        }

        if self.writes_output_file() {
            let audio = read_wav(&output_path);
            if let Err(e) = std::fs::remove_file(&output_path) {
                log::debug!("Could not remove {}: {}", output_path.display(), e);
            }
            audio
        } else {
            read_wav_bytes(&output.stdout)
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}
