//! Result store: the latest reconciliation snapshot.
//!
//! Readers get an `Arc` to an immutable snapshot. `replace` swaps the
//! pointer under a write lock, so a reader sees either the old snapshot or
//! the new one, never a mix.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::model::ReconSnapshot;

static GLOBAL: Lazy<ResultStore> = Lazy::new(ResultStore::new);

#[derive(Debug, Default)]
pub struct ResultStore {
    current: RwLock<Option<Arc<ReconSnapshot>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self { current: RwLock::new(None) }
    }

    /// Process-wide store used by the CLI.
    pub fn global() -> &'static ResultStore {
        &GLOBAL
    }

    pub fn current(&self) -> Option<Arc<ReconSnapshot>> {
        self.current.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_none()
    }

    /// Install `snapshot` as the current result and return the shared handle.
    pub fn replace(&self, snapshot: ReconSnapshot) -> Arc<ReconSnapshot> {
        let snapshot = Arc::new(snapshot);
        let previous = self.current.write().replace(Arc::clone(&snapshot));
        log::info!(
            "result store replaced: {} rows, {} insights{}",
            snapshot.result.outcomes.len(),
            snapshot.insights.len(),
            if previous.is_some() { "" } else { " (first run)" }
        );
        snapshot
    }

    pub fn reset(&self) {
        if self.current.write().take().is_some() {
            log::info!("result store cleared");
        }
    }
}
