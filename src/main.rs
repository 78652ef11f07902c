use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chunkscope::utils::conf_helper::{init_config, load_config};
use chunkscope::{NanPolicy, ViewerConfig, ViewerError, ViewerState};

/// Streams a large (x, y) CSV through the chunked window pipeline and
/// writes one JSON frame per redraw to stdout.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// CSV file (optionally .gz, .lz4 or .zst)
    path: PathBuf,
    #[arg(long, default_value = "chunkscope.json")]
    config: PathBuf,
    /// Window start index
    #[arg(long)]
    start: Option<usize>,
    /// Window size in samples
    #[arg(long)]
    size: Option<usize>,
    /// Indices advanced per playback step
    #[arg(long)]
    step: Option<usize>,
    /// Milliseconds between playback steps
    #[arg(long)]
    cadence_ms: Option<u64>,
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    target_points: Option<usize>,
    /// Drop rows with non-numeric x/y instead of keeping NaN
    #[arg(long)]
    drop_malformed: bool,
    /// Advance the window automatically
    #[arg(long)]
    play: bool,
    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(start) = self.start {
            config.window_start = start;
        }
        if let Some(size) = self.size {
            config.window_size = size;
        }
        if let Some(step) = self.step {
            config.animation_increment = step;
        }
        if let Some(cadence) = self.cadence_ms {
            config.animation_time_ms = cadence;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(target) = self.target_points {
            config.downsample_target_points = target;
        }
        if self.drop_malformed {
            config.malformed_numbers = NanPolicy::DropRow;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config).context("loading config")?;
    args.apply(&mut config);
    let config = init_config(config).context("invalid configuration")?;

    let state = ViewerState::new(config);
    state.load_file(args.path.clone());
    let playback = args.play.then(|| state.play(config));

    let mut ticker = tokio::time::interval(config.frame_interval().max(Duration::from_millis(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_key = None;
    let mut frames = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }

        let ingest_done = state.ingestion_finished();
        let store = state.store();
        let key = (state.window(), store.total_points(), store.is_complete());

        if last_key != Some(key) {
            let frame = state.recompute();
            let mut out = std::io::stdout().lock();
            serde_json::to_writer(&mut out, &frame).context("writing frame")?;
            writeln!(out).context("writing frame")?;
            frames += 1;
            last_key = Some(key);

            if args.max_frames.is_some_and(|max| frames >= max) {
                break;
            }
        }

        let playing = playback
            .as_ref()
            .is_some_and(|p| p.is_active() && state.window().start < state.total_points());
        if ingest_done && !playing {
            break;
        }
    }

    if let Some(playback) = playback {
        playback.stop();
    }

    if !state.ingestion_finished() {
        state.cancel_ingestion();
    }

    match state.wait_for_ingestion().await {
        Some(Ok(summary)) => info!(
            "{} points in {} chunks, {} frames written",
            summary.total_points, summary.chunks, frames
        ),
        Some(Err(ViewerError::Cancelled)) => info!("Ingestion cancelled, {} frames written", frames),
        Some(Err(e)) => return Err(e).context("ingestion failed"),
        None => {}
    }

    Ok(())
}
