//! End-to-end run: transcript in, part files and chapter metadata out.

use crate::audio::chapters::write_chapter_metadata;
use crate::audio::{AudioSink, ChapterMarker, ChapterTracker, PartBatcher};
use crate::config::NarrateConfig;
use crate::text::{Chunk, Chunks, PronunciationTable};
use crate::transcript::TokenReader;
use crate::tts::{SkipReason, SpeechRenderer, SynthesisOutcome, TtsBackend};
use crate::voice::{CharacterMap, VoiceResolver};
use anyhow::{Context, Result};
use futures_util::{StreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Chunks produced by the segmenter, including those before the resume point
    pub chunks_seen: usize,
    /// Chunks passed over because they precede `start_from_part`
    pub chunks_resumed_past: usize,
    pub chunks_rendered: usize,
    pub chunks_skipped: usize,
    pub parts_written: Vec<PathBuf>,
    pub chapters: Vec<ChapterMarker>,
    /// Seconds of audio rendered, including any pending batch
    pub total_secs: f64,
    pub malformed_rows: usize,
    /// Tokens in the unterminated chunk left at end of input
    pub trailing_tokens_dropped: usize,
    /// Rendered chunks that never filled a batch
    pub pending_chunks_dropped: usize,
}

/// A chunk ready to hand to the renderer.
#[derive(Debug)]
struct ChunkJob {
    number: usize,
    /// Normalized text, used for chapter detection
    clean: String,
    /// Text after pronunciation replacements
    spoken: String,
    voice: String,
}

fn prepare(resolver: &VoiceResolver, pronunciations: &PronunciationTable, chunk: Chunk) -> ChunkJob {
    let clean = chunk.text();
    let spoken = pronunciations.apply(&clean);
    let voice = resolver.resolve(&chunk.speaker_id).to_string();
    log::debug!(
        "Chunk {} (paragraph {}) [{} -> {}]: {:?}",
        chunk.number,
        chunk.paragraph_id,
        resolver.character_name(&chunk.speaker_id),
        voice,
        spoken
    );
    ChunkJob {
        number: chunk.number,
        clean,
        spoken,
        voice,
    }
}

pub struct PipelineDriver<S> {
    config: NarrateConfig,
    resolver: VoiceResolver,
    pronunciations: PronunciationTable,
    renderer: SpeechRenderer,
    sink: S,
    show_progress: bool,
}

impl<S: AudioSink> PipelineDriver<S> {
    /// Load the character map and build the voice table.
    ///
    /// Fails when the voice table has no narrator entry.
    pub fn new(config: NarrateConfig, backend: Arc<dyn TtsBackend>, sink: S) -> Result<Self> {
        config.validate()?;

        let characters = CharacterMap::load(&config.book_file)
            .with_context(|| format!("Failed to read {}", config.book_file.display()))?;
        if characters.is_empty() {
            log::info!("No characters loaded; every speaker uses the narrator voice");
        } else {
            log::debug!("Loaded {} characters", characters.len());
        }

        let resolver = VoiceResolver::from_config(characters, &config.voices)?;
        let pronunciations = PronunciationTable::from_config(&config.pronunciations);
        if !pronunciations.is_empty() {
            log::debug!("Applying {} pronunciation replacements", pronunciations.len());
        }
        let renderer = SpeechRenderer::new(
            backend,
            config.speed,
            config.language.clone(),
            config.sample_rate,
        );

        Ok(Self {
            config,
            resolver,
            pronunciations,
            renderer,
            sink,
            show_progress: false,
        })
    }

    /// Show a spinner on stderr while rendering.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Narrate the whole transcript. Returns the sink along with the summary.
    pub async fn run(self) -> Result<(RunSummary, S)> {
        let Self {
            config,
            resolver,
            pronunciations,
            renderer,
            sink,
            show_progress,
        } = self;

        let start = config.start_from_part;
        if start > 1 {
            log::warn!(
                "Resuming from part {}: chapter markers before this point are not recovered",
                start
            );
        }

        let reader = TokenReader::open(&config.tokens_file)
            .with_context(|| format!("Failed to open {}", config.tokens_file.display()))?;
        log::info!(
            "Narrating {} with {} (batch size {}, concurrency {})",
            config.tokens_file.display(),
            renderer.backend_name(),
            config.batch_size,
            config.render_concurrency
        );

        let pb = progress_bar(show_progress);
        let mut summary = RunSummary::default();
        let mut tracker = ChapterTracker::new();
        let mut batcher = PartBatcher::new(
            sink,
            config.parts_dir(),
            config.batch_size,
            start,
            config.sample_rate,
        );

        let mut chunks = Chunks::new(reader, config.flush_trailing);
        let mut seen = 0;
        let mut resumed_past = 0;
        {
            let renderer = &renderer;
            let eligible = (&mut chunks)
                .filter(|item| match item {
                    Ok(chunk) => {
                        seen += 1;
                        if chunk.number < start {
                            resumed_past += 1;
                            return false;
                        }
                        true
                    }
                    Err(_) => true,
                })
                .map(|item| item.map(|chunk| prepare(&resolver, &pronunciations, chunk)));

            // Rendering may overlap, but results come back in chunk order
            let mut rendered = std::pin::pin!(
                stream::iter(eligible)
                    .map(|item| async move {
                        let job = item?;
                        let outcome = renderer.render(&job.spoken, &job.voice).await;
                        Ok::<_, std::io::Error>((job, outcome))
                    })
                    .buffered(config.render_concurrency)
            );

            while let Some(item) = rendered.next().await {
                let (job, outcome) = item.context("Failed to read token file")?;
                pb.set_message(format!("chunk {}", job.number));

                tracker.observe(&job.clean, batcher.elapsed_secs());

                match outcome {
                    SynthesisOutcome::Rendered(audio) => {
                        summary.chunks_rendered += 1;
                        batcher.push(audio).context("Failed to write part file")?;
                    }
                    SynthesisOutcome::Skipped(SkipReason::EmptyText) => {
                        summary.chunks_skipped += 1;
                        log::debug!("Chunk {} has nothing to speak", job.number);
                    }
                    SynthesisOutcome::Skipped(reason) => {
                        summary.chunks_skipped += 1;
                        log::warn!("Chunk {} produced no audio: {}", job.number, reason);
                    }
                }
                pb.inc(1);
            }
        }

        summary.chunks_seen = seen;
        summary.chunks_resumed_past = resumed_past;
        summary.malformed_rows = chunks.tokens().malformed();
        if summary.malformed_rows > 0 {
            log::warn!("Skipped {} malformed token rows", summary.malformed_rows);
        }
        if let Some(tokens) = chunks.trailing_dropped() {
            log::warn!(
                "Dropped {} trailing tokens with no closing boundary (set flush_trailing to keep them)",
                tokens
            );
            summary.trailing_tokens_dropped = tokens;
        }

        if config.flush_trailing {
            batcher.finish().context("Failed to write part file")?;
        } else if batcher.pending() > 0 {
            log::warn!(
                "Dropped {} rendered chunks that did not fill a batch (set flush_trailing to keep them)",
                batcher.pending()
            );
            summary.pending_chunks_dropped = batcher.pending();
        }

        summary.total_secs = batcher.elapsed_secs();
        summary.parts_written = batcher.written().to_vec();

        let markers = tracker.into_markers();
        write_chapter_metadata(&markers, &config.metadata_file).with_context(|| {
            format!("Failed to write {}", config.metadata_file.display())
        })?;
        log::info!(
            "Finished! {} chapters logged to {}",
            markers.len(),
            config.metadata_file.display()
        );
        summary.chapters = markers;

        pb.finish_and_clear();
        Ok((summary, batcher.into_sink()))
    }
}

fn progress_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {pos} chunks {msg}") {
        pb.set_style(style);
    }
    pb
}
