// Incremental ingestion: parsed rows -> fixed-size chunks in the store

use crate::core::compression::open_input;
use crate::core::constants::FIELDS_PER_SAMPLE;
use crate::core::error::{Result, ViewerError};
use crate::core::format::{Chunk, Sample};
use crate::core::store::ChunkStore;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What to do with a row whose `x` or `y` text is not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// Keep the row with `NaN` in place of the bad field.
    #[default]
    Propagate,
    /// Drop the row; it does not count toward the total.
    DropRow,
}

/// A parsed record as handed over by the row parser.
pub trait RawRow {
    fn field_count(&self) -> usize;
    fn field(&self, index: usize) -> Option<&str>;
}

impl RawRow for csv::StringRecord {
    fn field_count(&self) -> usize {
        self.len()
    }

    fn field(&self, index: usize) -> Option<&str> {
        self.get(index)
    }
}

impl<S: AsRef<str>> RawRow for [S] {
    fn field_count(&self) -> usize {
        self.len()
    }

    fn field(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.as_ref())
    }
}

impl<S: AsRef<str>> RawRow for Vec<S> {
    fn field_count(&self) -> usize {
        self.len()
    }

    fn field(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.as_ref())
    }
}

impl<T: RawRow + ?Sized> RawRow for &T {
    fn field_count(&self) -> usize {
        (**self).field_count()
    }

    fn field(&self, index: usize) -> Option<&str> {
        (**self).field(index)
    }
}

/// Converts field text to a number. Blank text is zero, unsigned
/// `0x`/`0o`/`0b` literals are integers, unparseable text is `NaN`.
pub fn coerce_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(radix) = radix_prefix(text) {
        let digits = &text[2..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return f64::NAN;
        }
        return u128::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
    }
    // f64::from_str also takes "inf" and "nan" spellings; those are not numbers here.
    let numeric = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !numeric {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

fn radix_prefix(text: &str) -> Option<u32> {
    match text.get(..2)? {
        "0x" | "0X" => Some(16),
        "0o" | "0O" => Some(8),
        "0b" | "0B" => Some(2),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub total_points: usize,
    pub chunks: usize,
    pub dropped_rows: usize,
}

/// Buffers accepted rows and cuts them into chunks as soon as a full
/// chunk is available. This is the only writer of the store.
#[derive(Debug)]
pub struct Ingestor {
    store: Arc<ChunkStore>,
    chunk_size: usize,
    policy: NanPolicy,
    pending: Vec<Sample>,
    emitted: usize,
    chunks: usize,
    dropped_rows: usize,
}

impl Ingestor {
    /// Starts a run: the store is emptied before any row is processed.
    pub fn begin(store: Arc<ChunkStore>, chunk_size: usize, policy: NanPolicy) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ViewerError::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        store.clear();
        Ok(Self {
            store,
            chunk_size,
            policy,
            pending: Vec::new(),
            emitted: 0,
            chunks: 0,
            dropped_rows: 0,
        })
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    /// Samples accepted so far, emitted or still buffered.
    pub fn total_points(&self) -> usize {
        self.emitted + self.pending.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Counts a record the parser could not decode at all.
    pub fn note_dropped(&mut self) {
        self.dropped_rows += 1;
    }

    fn accept<R: RawRow>(&self, row: &R) -> Option<Sample> {
        if row.field_count() < FIELDS_PER_SAMPLE {
            return None;
        }
        let x = coerce_number(row.field(0)?);
        let y = coerce_number(row.field(1)?);
        if self.policy == NanPolicy::DropRow && (x.is_nan() || y.is_nan()) {
            return None;
        }
        Some(Sample::new(x, y))
    }

    /// Feeds one parser batch and republishes the running total.
    pub fn push_batch<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator,
        I::Item: RawRow,
    {
        for row in rows {
            match self.accept(&row) {
                Some(sample) => self.pending.push(sample),
                None => self.dropped_rows += 1,
            }
        }

        while self.pending.len() >= self.chunk_size {
            let rest = self.pending.split_off(self.chunk_size);
            let data = std::mem::replace(&mut self.pending, rest);
            self.emit(data);
        }

        let total = self.total_points();
        self.store.publish_total(total);
        total
    }

    fn emit(&mut self, data: Vec<Sample>) {
        let index = self.emitted / self.chunk_size;
        let len = data.len();
        self.store.insert(index, Chunk::new(self.emitted, data));
        self.emitted += len;
        self.chunks += 1;
        debug!("Chunk {} emitted ({} samples, {} total)", index, len, self.emitted);
    }

    /// Flushes the short tail chunk and marks the store complete.
    pub fn finish(mut self) -> IngestSummary {
        if !self.pending.is_empty() {
            let data = std::mem::take(&mut self.pending);
            self.emit(data);
        }
        self.store.publish_total(self.emitted);
        self.store.mark_complete();

        let summary = IngestSummary {
            total_points: self.emitted,
            chunks: self.chunks,
            dropped_rows: self.dropped_rows,
        };
        info!(
            "Ingestion complete: {} points in {} chunks ({} rows dropped)",
            summary.total_points, summary.chunks, summary.dropped_rows
        );
        summary
    }
}

/// Parses CSV rows from `source` in batches of `batch_rows` and feeds them
/// to `ingestor`. `abort` is checked between batches.
pub fn ingest_reader<R: Read>(
    source: R,
    mut ingestor: Ingestor,
    batch_rows: usize,
    abort: &AtomicBool,
) -> Result<IngestSummary> {
    let batch_rows = batch_rows.max(1);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut batch = Vec::with_capacity(batch_rows);
    let mut eof = false;

    while !eof {
        if abort.load(Ordering::Acquire) {
            warn!("Ingestion aborted after {} points", ingestor.total_points());
            return Err(ViewerError::Cancelled);
        }

        while batch.len() < batch_rows {
            let mut record = csv::StringRecord::new();
            match reader.read_record(&mut record) {
                Ok(true) => batch.push(record),
                Ok(false) => {
                    eof = true;
                    break;
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!("Skipping undecodable record: {}", e);
                    ingestor.note_dropped();
                }
            }
        }

        ingestor.push_batch(batch.drain(..));
    }

    Ok(ingestor.finish())
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub batch_rows: usize,
    pub policy: NanPolicy,
}

/// A running ingestion on the blocking pool.
#[derive(Debug)]
pub struct IngestTask {
    handle: JoinHandle<Result<IngestSummary>>,
    abort: Arc<AtomicBool>,
}

impl IngestTask {
    /// Asks the worker to stop at the next batch boundary.
    pub fn cancel(&self) {
        self.abort.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> Result<IngestSummary> {
        self.handle.await?
    }
}

/// Opens `path` and ingests it into `store` off the async runtime threads.
pub fn spawn_ingestion(path: PathBuf, store: Arc<ChunkStore>, options: IngestOptions) -> IngestTask {
    let abort = Arc::new(AtomicBool::new(false));
    let flag = abort.clone();

    let handle = tokio::task::spawn_blocking(move || {
        info!("Ingesting {}", path.display());
        let ingestor = Ingestor::begin(store, options.chunk_size, options.policy)?;
        let source = open_input(&path)?;
        ingest_reader(source, ingestor, options.batch_rows, &flag)
    });

    IngestTask { handle, abort }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n).map(|i| vec![i.to_string(), (i * 2).to_string()]).collect()
    }

    fn flatten(store: &ChunkStore) -> Vec<Sample> {
        store.snapshot().iter().flat_map(|c| c.data.clone()).collect()
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(" 12.5 "), 12.5);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("-3e2"), -300.0);
        assert_eq!(coerce_number("Infinity"), f64::INFINITY);
        assert!(coerce_number("abc").is_nan());
        assert!(coerce_number("inf").is_nan());
        assert!(coerce_number("1.2.3").is_nan());
    }

    #[test]
    fn test_coerce_radix_literals() {
        assert_eq!(coerce_number("0x1A"), 26.0);
        assert_eq!(coerce_number(" 0XfF "), 255.0);
        assert_eq!(coerce_number("0o17"), 15.0);
        assert_eq!(coerce_number("0b101"), 5.0);
        assert!(coerce_number("0x").is_nan());
        assert!(coerce_number("0x+1").is_nan());
        assert!(coerce_number("0b102").is_nan());
        assert!(coerce_number("-0x1A").is_nan());
    }

    #[test]
    fn test_chunks_emitted_when_full() {
        let store = ChunkStore::shared();
        let mut ingestor = Ingestor::begin(store.clone(), 4, NanPolicy::Propagate).unwrap();

        assert_eq!(ingestor.push_batch(rows(3)), 3);
        assert_eq!(store.chunk_count(), 0);

        assert_eq!(ingestor.push_batch(rows(6)), 9);
        assert_eq!(store.chunk_count(), 2);
        assert_eq!(ingestor.pending_len(), 1);
        assert_eq!(store.total_points(), 9);

        let summary = ingestor.finish();
        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.total_points, 9);
        assert!(store.is_complete());

        let tail = store.get(2).unwrap();
        assert_eq!(tail.start_index, 8);
        assert_eq!(tail.len(), 1);
    }

    #[test]
    fn test_chunk_reconstruction() {
        for chunk_size in [1, 3, 7, 10, 25] {
            let store = ChunkStore::shared();
            let mut ingestor = Ingestor::begin(store.clone(), chunk_size, NanPolicy::Propagate).unwrap();
            let input = rows(23);
            for batch in input.chunks(5) {
                ingestor.push_batch(batch);
            }
            ingestor.finish();

            let expected: Vec<Sample> = (0..23).map(|i| Sample::new(i as f64, (i * 2) as f64)).collect();
            assert_eq!(flatten(&store), expected);

            let chunks = store.snapshot();
            assert_eq!(chunks.len(), 23usize.div_ceil(chunk_size));
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.start_index, i * chunk_size);
                if i + 1 < chunks.len() {
                    assert_eq!(chunk.len(), chunk_size);
                }
            }
        }
    }

    #[test]
    fn test_short_rows_dropped_and_nan_kept() {
        let store = ChunkStore::shared();
        let mut ingestor = Ingestor::begin(store.clone(), 10, NanPolicy::Propagate).unwrap();
        let batch: Vec<Vec<&str>> = vec![vec!["1"], vec!["2", "oops"], vec!["3", "4", "extra"]];
        assert_eq!(ingestor.push_batch(&batch), 2);

        let summary = ingestor.finish();
        assert_eq!(summary.dropped_rows, 1);
        let data = flatten(&store);
        assert!(data[0].y.is_nan());
        assert_eq!(data[1], Sample::new(3.0, 4.0));
    }

    #[test]
    fn test_drop_row_policy() {
        let store = ChunkStore::shared();
        let mut ingestor = Ingestor::begin(store.clone(), 10, NanPolicy::DropRow).unwrap();
        let batch = vec![vec!["x", "1"], vec!["2", "3"]];
        assert_eq!(ingestor.push_batch(&batch), 1);
        assert_eq!(ingestor.finish().dropped_rows, 1);
    }

    #[test]
    fn test_begin_resets_store() {
        let store = ChunkStore::shared();
        let mut first = Ingestor::begin(store.clone(), 2, NanPolicy::Propagate).unwrap();
        first.push_batch(rows(5));
        first.finish();
        assert_eq!(store.total_points(), 5);

        let second = Ingestor::begin(store.clone(), 2, NanPolicy::Propagate).unwrap();
        assert_eq!(store.total_points(), 0);
        assert_eq!(store.chunk_count(), 0);
        assert_eq!(second.finish().chunks, 0);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = Ingestor::begin(ChunkStore::shared(), 0, NanPolicy::Propagate).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)));
    }

    #[test]
    fn test_total_monotonic_across_batches() {
        let store = ChunkStore::shared();
        let mut ingestor = Ingestor::begin(store.clone(), 3, NanPolicy::Propagate).unwrap();
        let mut last = 0;
        for batch in rows(20).chunks(4) {
            let total = ingestor.push_batch(batch);
            assert!(total >= last);
            assert_eq!(store.total_points(), total);
            last = total;
        }
    }

    #[test]
    fn test_ingest_reader_csv() {
        let text = "0,1\n1,2\njunk\n2, 3 \n3,4,5\n4,5\n";
        let store = ChunkStore::shared();
        let ingestor = Ingestor::begin(store.clone(), 2, NanPolicy::Propagate).unwrap();
        let summary = ingest_reader(text.as_bytes(), ingestor, 2, &AtomicBool::new(false)).unwrap();

        assert_eq!(summary.total_points, 5);
        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(store.get(1).unwrap().data[0], Sample::new(2.0, 3.0));
    }

    #[test]
    fn test_ingest_reader_abort() {
        let store = ChunkStore::shared();
        let ingestor = Ingestor::begin(store, 2, NanPolicy::Propagate).unwrap();
        let result = ingest_reader("0,1\n".as_bytes(), ingestor, 1, &AtomicBool::new(true));
        assert!(matches!(result, Err(ViewerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_spawn_ingestion_from_file() {
        let path = std::env::temp_dir().join(format!("chunkscope-ingest-{}.csv", std::process::id()));
        let text: String = (0..10).map(|i| format!("{},{}\n", i, i * i)).collect();
        std::fs::write(&path, text).unwrap();

        let store = ChunkStore::shared();
        let options = IngestOptions {
            chunk_size: 4,
            batch_rows: 3,
            policy: NanPolicy::Propagate,
        };
        let summary = spawn_ingestion(path.clone(), store.clone(), options).wait().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(summary.total_points, 10);
        assert_eq!(summary.chunks, 3);
        assert_eq!(store.get(2).unwrap().data[1], Sample::new(9.0, 81.0));
    }
}
