//! # DAG Store
//!
//! Single-writer, many-reader publication of [`BlockDag`] snapshots.
//!
//! Readers call [`DagStore::snapshot`] and work on an immutable
//! `Arc<BlockDag>` for as long as they like. Writers go through
//! [`DagStore::update`], which serializes on a writer lock, applies the
//! mutation to a private copy and publishes it only if the closure succeeds.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::domain::BlockDag;

/// Shared handle to the current DAG.
pub struct DagStore {
    current: RwLock<Arc<BlockDag>>,
    writer: Mutex<()>,
}

impl DagStore {
    pub fn new(dag: BlockDag) -> Self {
        Self {
            current: RwLock::new(Arc::new(dag)),
            writer: Mutex::new(()),
        }
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> Arc<BlockDag> {
        Arc::clone(&self.current.read())
    }

    /// Apply `f` to a copy of the current DAG and publish the result.
    ///
    /// Nothing is published when `f` returns an error, so a failed mutation
    /// never leaves a half-updated DAG visible to readers.
    pub fn update<T, E>(&self, f: impl FnOnce(&mut BlockDag) -> Result<T, E>) -> Result<T, E> {
        let _writer = self.writer.lock();
        let mut next = BlockDag::clone(&self.current.read());
        let out = f(&mut next)?;
        *self.current.write() = Arc::new(next);
        Ok(out)
    }
}

impl std::fmt::Debug for DagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DagStore")
            .field("current", &*self.current.read())
            .finish()
    }
}
