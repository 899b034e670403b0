//! In-memory snapshot store for tests and embedding

use super::traits::{Snapshot, SnapshotStore, StorageError, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps the last saved snapshot in memory and counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if loaded from disk.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// The last saved snapshot
    pub fn last_saved(&self) -> Option<Snapshot> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> StorageResult<Option<Snapshot>> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Corrupt("memory store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Corrupt("memory store mutex poisoned".to_string()))?;
        *guard = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
