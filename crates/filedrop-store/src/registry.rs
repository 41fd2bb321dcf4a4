//! Registry store
//!
//! In-memory identifier-to-record map with an injected snapshot port. The
//! store performs no implicit write batching: callers persist after every
//! mutation, and a persist failure never rolls the in-memory state back;
//! memory is the source of truth until the next successful persist.

use std::collections::HashMap;
use std::sync::Arc;

use filedrop_core::models::FileRecord;
use filedrop_core::FileId;

use crate::snapshot::{SnapshotResult, SnapshotStore};

pub struct RegistryStore {
    entries: HashMap<FileId, FileRecord>,
    snapshot: Arc<dyn SnapshotStore>,
}

impl RegistryStore {
    /// Load the registry through the snapshot port.
    ///
    /// A missing snapshot is a normal first start; an unreadable or corrupt
    /// one degrades to an empty registry with a logged warning. Neither case
    /// fails the caller.
    pub async fn load(snapshot: Arc<dyn SnapshotStore>) -> Self {
        let entries = match snapshot.load().await {
            Ok(Some(pairs)) => {
                tracing::info!(entries = pairs.len(), "Registry snapshot loaded");
                pairs.into_iter().collect()
            }
            Ok(None) => {
                tracing::info!("No existing snapshot found, starting with an empty registry");
                HashMap::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load snapshot, starting with an empty registry");
                HashMap::new()
            }
        };

        RegistryStore { entries, snapshot }
    }

    pub fn get(&self, id: &FileId) -> Option<&FileRecord> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn set(&mut self, id: FileId, record: FileRecord) {
        self.entries.insert(id, record);
    }

    pub fn remove(&mut self, id: &FileId) -> Option<FileRecord> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries matching the predicate, in store iteration order.
    /// Iteration order is not stable across reloads.
    pub fn list<F>(&self, predicate: F) -> Vec<(FileId, FileRecord)>
    where
        F: Fn(&FileId, &FileRecord) -> bool,
    {
        self.entries
            .iter()
            .filter(|(id, record)| predicate(id, record))
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    /// Write the full registry through the snapshot port.
    pub async fn persist(&self) -> SnapshotResult<()> {
        let entries: Vec<(FileId, FileRecord)> = self
            .entries
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        self.snapshot.persist(&entries).await
    }
}
