// Walks a synthetic sine dataset through ingestion, extraction and downsampling

use chunkscope::{downsample, extract, ChunkStore, Ingestor, NanPolicy, Result, Window, WindowStats};
use tracing::{debug, info, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let chunk_size = 10_000;
    let store = ChunkStore::shared();
    let mut ingestor = Ingestor::begin(store.clone(), chunk_size, NanPolicy::Propagate)?;

    // Feed 25K rows in parser-sized batches
    for batch_start in (0..25_000usize).step_by(4_096) {
        let rows: Vec<Vec<String>> = (batch_start..(batch_start + 4_096).min(25_000))
            .map(|i| vec![i.to_string(), (i as f64 * 0.01).sin().to_string()])
            .collect();
        let total = ingestor.push_batch(&rows);
        debug!("  {} points so far", total);
    }
    let summary = ingestor.finish();
    info!("Loaded {} points in {} chunks", summary.total_points, summary.chunks);

    // A window straddling the first chunk boundary
    let window = Window::new(9_990, 40);
    let raw = extract(&store, window, chunk_size);
    info!("Window {}..{}: {} raw points", window.start, window.end(), raw.len());

    let stats = WindowStats::compute(&raw.y);
    info!(
        "  min={:.4} max={:.4} avg={:.4} var={:.6}",
        stats.min, stats.max, stats.average, stats.variance
    );

    let reduced = downsample(&raw.x, &raw.y, 8);
    for i in 0..reduced.len() {
        info!(
            "  x={:.1} y={:.4} [{:.4}, {:.4}]",
            reduced.x[i], reduced.y[i], reduced.lower_error[i], reduced.upper_error[i]
        );
    }

    Ok(())
}
