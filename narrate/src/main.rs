//! narrate - Turn a speaker-annotated book transcript into numbered audio parts

mod audio;
mod config;
mod error;
mod pipeline;
mod text;
mod transcript;
mod tts;
mod voice;

use anyhow::{Context, Result};
use audio::WavSink;
use clap::{Parser, Subcommand};
use config::NarrateConfig;
use env_logger::Env;
use pipeline::PipelineDriver;
use std::path::PathBuf;
use std::sync::Arc;
use tts::command::CommandBackend;

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Narrate a speaker-annotated book transcript into numbered WAV parts", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/cli-programs/narrate.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Token transcript (tab-separated)
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Book JSON with the character list
    #[arg(long)]
    book: Option<PathBuf>,

    /// Output directory; parts are written to <dir>/parts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Chapter metadata JSON output
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Rendered chunks per part file
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Resume at this chunk/part number
    #[arg(short, long)]
    start_from_part: Option<usize>,

    /// Chunks synthesized at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Keep the trailing chunk and partial batch at end of input
    #[arg(long, default_value_t = false)]
    flush_trailing: bool,

    /// Hide the progress spinner
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(NarrateConfig::config_path)
    }

    /// Command-line values take precedence over the config file.
    fn apply_overrides(&self, config: &mut NarrateConfig) {
        if let Some(path) = &self.tokens {
            config.tokens_file = path.clone();
        }
        if let Some(path) = &self.book {
            config.book_file = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.metadata {
            config.metadata_file = path.clone();
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(n) = self.start_from_part {
            config.start_from_part = n;
        }
        if let Some(n) = self.concurrency {
            config.render_concurrency = n;
        }
        if self.flush_trailing {
            config.flush_trailing = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(&args, action);
    }

    let config_path = args.config_path();
    let mut config = NarrateConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    args.apply_overrides(&mut config);
    config.validate()?;

    log::debug!("Config: {:?}", config);

    let backend = CommandBackend::from_config(&config.engine)
        .context("Failed to set up the TTS engine")?;

    let (summary, _) = PipelineDriver::new(config, Arc::new(backend), WavSink)?
        .with_progress(!args.no_progress)
        .run()
        .await?;

    eprintln!(
        "Rendered {} of {} chunks ({} skipped) into {} parts, {:.1}s of audio, {} chapters",
        summary.chunks_rendered,
        summary.chunks_seen - summary.chunks_resumed_past,
        summary.chunks_skipped,
        summary.parts_written.len(),
        summary.total_secs,
        summary.chapters.len()
    );
    if summary.malformed_rows > 0 {
        eprintln!("Skipped {} malformed token rows", summary.malformed_rows);
    }
    if summary.trailing_tokens_dropped > 0 || summary.pending_chunks_dropped > 0 {
        eprintln!(
            "Dropped {} trailing tokens and {} pending chunks (use --flush-trailing to keep them)",
            summary.trailing_tokens_dropped, summary.pending_chunks_dropped
        );
    }

    Ok(())
}

fn handle_config_command(args: &Args, action: &ConfigAction) -> Result<()> {
    let path = args.config_path();
    match action {
        ConfigAction::Show => {
            let mut config = NarrateConfig::load_from(&path)?;
            args.apply_overrides(&mut config);
            println!("Configuration file: {}", path.display());
            if !path.exists() {
                println!("(file not found, showing defaults)");
            }
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            NarrateConfig::default().save_to(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
