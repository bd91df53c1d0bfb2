//! Tree lifecycle: load the tree named by the location, or create one.
//!
//! A loaded tree's owner is recorded before its ornament feed starts, so
//! the first snapshot is already rendered with the right permissions. A
//! candidate id that does not resolve is dropped and the create path runs
//! instead. Both store calls run under the failsafe.

use crate::error::ActionError;
use crate::failsafe::Failsafe;
use crate::host::Host;
use crate::notice::{Notice, Notifier};
use crate::state::AppState;
use crate::sync::SyncClient;
use std::sync::Arc;
use tinsel_core::document::{decode_tree, encode_new_tree};
use tinsel_core::id::DocId;
use tinsel_core::model::Tree;
use tinsel_core::route::tree_path;
use tinsel_store::{Collection, DocumentStore, StoreError};

pub struct TreeLifecycle {
    state: Arc<AppState>,
    store: Arc<dyn DocumentStore>,
    host: Arc<dyn Host>,
    sync: Arc<SyncClient>,
    failsafe: Failsafe,
    notifier: Notifier,
}

impl TreeLifecycle {
    pub fn new(
        state: Arc<AppState>,
        store: Arc<dyn DocumentStore>,
        host: Arc<dyn Host>,
        sync: Arc<SyncClient>,
        failsafe: Failsafe,
        notifier: Notifier,
    ) -> Self {
        Self {
            state,
            store,
            host,
            sync,
            failsafe,
            notifier,
        }
    }

    /// Make `candidate` the active tree, or create a fresh one when there
    /// is no candidate or it does not exist.
    pub async fn resolve(&self, candidate: Option<DocId>) -> Result<Tree, ActionError> {
        if let Some(id) = candidate {
            if let Some(tree) = self.load(id).await? {
                return Ok(tree);
            }
            log::warn!("tree {id} not found, creating a new one");
            self.host.push_path("/");
        }
        self.create().await
    }

    /// Load an existing tree. `Ok(None)` when the store has no such tree.
    pub async fn load(&self, id: DocId) -> Result<Option<Tree>, ActionError> {
        let read = self.store.get(Collection::Trees, id);
        let found = match self.failsafe.guard("load tree", read).await {
            Ok(found) => found,
            Err(err) => {
                log::error!("loading tree {id} failed: {err}");
                if err == StoreError::Unavailable {
                    self.notifier.notify(Notice::StoreUnavailable);
                }
                return Err(err.into());
            }
        };
        let Some(doc) = found else {
            return Ok(None);
        };

        let tree = decode_tree(&doc).unwrap_or_else(|err| {
            log::warn!("tree {id} is unreadable ({err}), treating it as unowned");
            Tree {
                id,
                created_at: None,
                owner_id: None,
                owner_name: None,
            }
        });
        self.activate(tree.clone());
        Ok(Some(tree))
    }

    /// Create a tree, owned by the current identity if someone is signed in.
    pub async fn create(&self) -> Result<Tree, ActionError> {
        let owner = self.state.identity();
        let write = self
            .store
            .add(Collection::Trees, encode_new_tree(owner.as_ref()));
        let id = match self.failsafe.guard("create tree", write).await {
            Ok(id) => id,
            Err(err) => {
                log::error!("creating tree failed: {err}");
                self.notifier.notify(Notice::CreateTreeFailed);
                return Err(err.into());
            }
        };

        let tree = Tree {
            id,
            created_at: None,
            owner_id: owner.as_ref().map(|who| who.id),
            owner_name: owner.and_then(|who| who.display_name),
        };
        log::info!(
            "created tree {id}{}",
            tree.owner_id
                .map(|o| format!(" owned by {o}"))
                .unwrap_or_default()
        );
        self.host.push_path(&tree_path(id));
        self.activate(tree.clone());
        Ok(tree)
    }

    fn activate(&self, tree: Tree) {
        let id = tree.id;
        self.state.set_tree(Some(tree));
        if let Err(err) = self.sync.start(id) {
            log::error!("cannot subscribe to tree {id}: {err}");
        }
    }
}
