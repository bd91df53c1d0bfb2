//! Synchronization client: the live ornament list of the active tree.
//!
//! - **Subscription**: one real-time feed per active tree, filtered on the
//!   ornament's tree reference. No server-side ordering is requested, so
//!   no composite index is needed.
//!
//! - **Snapshots**: every delivery, initial or incremental, is decoded and
//!   ordered from scratch and replaces the visible list in one send. Nothing
//!   from an earlier snapshot survives into a later one.
//!
//! - **Errors**: transport errors are logged and the current list is kept.
//!   Resubscription is left to the store.

use crate::state::AppState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tinsel_core::document::{self, Document};
use tinsel_core::id::DocId;
use tinsel_core::model::Ornament;
use tinsel_core::order::order_snapshot;
use tinsel_store::{Collection, DocumentStore, Filter, StoreError};
use tokio::task::JoinHandle;

struct Active {
    tree_id: DocId,
    task: JoinHandle<()>,
}

pub struct SyncClient {
    store: Arc<dyn DocumentStore>,
    state: Arc<AppState>,
    active: Mutex<Option<Active>>,
}

impl SyncClient {
    pub fn new(store: Arc<dyn DocumentStore>, state: Arc<AppState>) -> Self {
        Self {
            store,
            state,
            active: Mutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to `tree_id`'s ornaments, replacing any previous feed.
    pub fn start(&self, tree_id: DocId) -> Result<(), StoreError> {
        let mut feed = self.store.subscribe(
            Collection::Ornaments,
            Filter::field_eq(document::TREE_ID, tree_id.as_str()),
        )?;
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = feed.next().await {
                match event {
                    Ok(docs) => {
                        let ornaments = normalize_snapshot(&docs);
                        log::debug!(
                            "tree {tree_id}: snapshot of {} ornaments",
                            ornaments.len()
                        );
                        state.ornaments.send_replace(ornaments);
                    }
                    Err(err) => log::error!("tree {tree_id}: snapshot error: {err}"),
                }
            }
            log::debug!("tree {tree_id}: ornament feed closed");
        });

        if let Some(previous) = self.active().replace(Active { tree_id, task }) {
            log::debug!("tree {}: feed replaced", previous.tree_id);
            previous.task.abort();
        }
        Ok(())
    }

    /// Drop the active feed, if any.
    pub fn stop(&self) {
        if let Some(active) = self.active().take() {
            log::debug!("tree {}: unsubscribed", active.tree_id);
            active.task.abort();
        }
    }

    pub fn tree_id(&self) -> Option<DocId> {
        self.active().as_ref().map(|a| a.tree_id)
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decode and order one snapshot. Documents that do not decode are
/// skipped rather than failing the whole snapshot.
pub fn normalize_snapshot(docs: &[Document]) -> Vec<Ornament> {
    let mut ornaments: Vec<Ornament> = docs
        .iter()
        .filter_map(|doc| match document::decode_ornament(doc) {
            Ok(ornament) => Some(ornament),
            Err(err) => {
                log::warn!("skipping ornament: {err}");
                None
            }
        })
        .collect();
    order_snapshot(&mut ornaments);
    ornaments
}
