//! Storage trait definitions

use crate::model::{Instance, InstanceId, PlanTier};
use crate::quota::QuotaState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt stored state: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Everything persisted between sessions.
///
/// Presentation and export code may read this shape; only the instance store
/// and quota logic produce it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Registered instances in insertion order
    #[serde(default)]
    pub instances: IndexMap<InstanceId, Instance>,
    /// Active registered instance, absent while a draft is shown
    #[serde(default)]
    pub active_instance_id: Option<InstanceId>,
    #[serde(default)]
    pub quota: QuotaState,
    #[serde(default)]
    pub plan: PlanTier,
}

/// Port through which the session loads and saves its state
///
/// Implementations must be thread-safe (Send + Sync). `save` replaces the
/// stored state wholesale.
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot, `None` if nothing was ever saved
    fn load(&self) -> StorageResult<Option<Snapshot>>;

    /// Persist a snapshot, replacing whatever was stored
    fn save(&self, snapshot: &Snapshot) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: SnapshotStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
