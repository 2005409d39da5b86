//! Debounced persistence
//!
//! Editing generates a save request on every keystroke; writing each one
//! through would hammer the store. `DebouncedSaver` coalesces them: each
//! `schedule` call cancels any pending write and arms a fresh timer with
//! the latest snapshot, so only the snapshot that survives a quiet period
//! actually reaches the store. `flush` bypasses the timer for moments
//! that must not lose data, such as switching projects or shutting down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::Project;
use crate::store::Store;

/// Quiet period before a scheduled snapshot is written
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Coalesces rapid save requests into one write per quiet period
pub struct DebouncedSaver {
    store: Arc<Mutex<Store>>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl DebouncedSaver {
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self::with_delay(store, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(store: Arc<Mutex<Store>>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: None,
        }
    }

    /// The store this saver writes through
    pub fn shared_store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.store)
    }

    /// Queue a snapshot, replacing any snapshot still waiting
    ///
    /// The snapshot is written after the quiet period elapses with no
    /// further `schedule` call. Intermediate snapshots are dropped, never
    /// written.
    pub fn schedule(&mut self, snapshot: Project) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let store = Arc::clone(&self.store);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let id = snapshot.id;
            store.lock().await.put(&snapshot);
            debug!(%id, "debounced save committed");
        }));
    }

    /// Write a snapshot now, discarding anything still queued
    pub async fn flush(&mut self, snapshot: Project) -> Project {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.store.lock().await.put(&snapshot)
    }
}

impl Drop for DebouncedSaver {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
