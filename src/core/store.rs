// Append-only chunk storage shared between the ingestion worker and readers

use crate::core::format::Chunk;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Chunks indexed by `start_index / chunk_size`.
///
/// Slots are dense because chunks arrive in increasing index order. A chunk
/// is wrapped in an `Arc` before it is published, so a reader either sees a
/// complete chunk or an empty slot; published chunks are never mutated.
#[derive(Debug, Default)]
pub struct ChunkStore {
    slots: RwLock<Vec<Option<Arc<Chunk>>>>,
    total_points: AtomicUsize,
    complete: AtomicBool,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, Vec<Option<Arc<Chunk>>>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, Vec<Option<Arc<Chunk>>>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops every chunk and zeroes the published counters.
    pub fn clear(&self) {
        self.write_slots().clear();
        self.total_points.store(0, Ordering::Release);
        self.complete.store(false, Ordering::Release);
    }

    pub fn insert(&self, index: usize, chunk: Chunk) {
        let chunk = Arc::new(chunk);
        let mut slots = self.write_slots();
        if slots.len() <= index {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(chunk);
    }

    pub fn get(&self, index: usize) -> Option<Arc<Chunk>> {
        self.read_slots().get(index).cloned().flatten()
    }

    /// Present chunks whose index falls in `range`, in ascending index order.
    pub fn chunks_in(&self, range: RangeInclusive<usize>) -> Vec<Arc<Chunk>> {
        let slots = self.read_slots();
        let start = *range.start();
        if start >= slots.len() || start > *range.end() {
            return Vec::new();
        }
        let end = (*range.end()).min(slots.len() - 1);
        slots[start..=end].iter().flatten().cloned().collect()
    }

    /// Number of chunks currently present.
    pub fn chunk_count(&self) -> usize {
        self.read_slots().iter().filter(|slot| slot.is_some()).count()
    }

    /// All present chunks in index order.
    pub fn snapshot(&self) -> Vec<Arc<Chunk>> {
        self.read_slots().iter().flatten().cloned().collect()
    }

    pub fn total_points(&self) -> usize {
        self.total_points.load(Ordering::Acquire)
    }

    /// Publishes the running sample count. The count never moves backwards
    /// within a run; only `clear` resets it.
    pub fn publish_total(&self, total: usize) {
        self.total_points.fetch_max(total, Ordering::AcqRel);
    }

    pub fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::Sample;

    fn chunk(start: usize, len: usize) -> Chunk {
        Chunk::new(
            start,
            (start..start + len).map(|i| Sample::new(i as f64, 0.0)).collect(),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let store = ChunkStore::new();
        store.insert(0, chunk(0, 4));
        store.insert(1, chunk(4, 2));

        assert_eq!(store.chunk_count(), 2);
        assert_eq!(store.get(1).unwrap().start_index, 4);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_chunks_in_skips_missing_and_clamps() {
        let store = ChunkStore::new();
        store.insert(0, chunk(0, 4));
        store.insert(2, chunk(8, 4));

        let found: Vec<usize> = store.chunks_in(0..=10).iter().map(|c| c.start_index).collect();
        assert_eq!(found, vec![0, 8]);
        assert!(store.chunks_in(5..=9).is_empty());
    }

    #[test]
    fn test_total_is_monotonic_until_clear() {
        let store = ChunkStore::new();
        store.publish_total(10);
        store.publish_total(4);
        assert_eq!(store.total_points(), 10);

        store.mark_complete();
        store.clear();
        assert_eq!(store.total_points(), 0);
        assert!(!store.is_complete());
        assert_eq!(store.chunk_count(), 0);
    }

    #[test]
    fn test_reader_keeps_chunk_after_clear() {
        let store = ChunkStore::new();
        store.insert(0, chunk(0, 3));
        let held = store.get(0).unwrap();
        store.clear();
        assert_eq!(held.len(), 3);
    }
}
