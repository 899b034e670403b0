//! Storage backends
//!
//! Session state is persisted through the `SnapshotStore` port. `SqliteStore`
//! is the durable implementation; `MemoryStore` backs tests and embedders that
//! manage persistence themselves.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{OpenStore, Snapshot, SnapshotStore, StorageError, StorageResult};
