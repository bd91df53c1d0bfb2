//! The application controller the UI layer binds to.
//!
//! Holds the shared [`AppState`], the components that write it, and the
//! external collaborators. All action entry points take `&self`, so an
//! outstanding write never blocks another action: the UI is told to wait
//! only through the `loading` binding.

use crate::config::SessionConfig;
use crate::error::ActionError;
use crate::failsafe::Failsafe;
use crate::host::Host;
use crate::lifecycle::TreeLifecycle;
use crate::notice::{Notice, NoticeReceiver, Notifier};
use crate::placement::{ConfirmOutcome, DropOutcome, PlacementWorkflow};
use crate::session::SessionTracker;
use crate::state::{AppState, Bindings};
use crate::sync::SyncClient;
use std::sync::Arc;
use tinsel_core::Point;
use tinsel_core::coords::DropZone;
use tinsel_core::id::DocId;
use tinsel_core::model::{DragPayload, Identity, Ornament, OrnamentKind, Tree};
use tinsel_core::route::{parse_tree_route, share_link};
use tinsel_store::{AuthProvider, Collection, DocumentStore};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(DocId),
    NothingSelected,
    /// The user declined the confirmation prompt.
    Declined,
}

pub struct App {
    config: SessionConfig,
    state: Arc<AppState>,
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    host: Arc<dyn Host>,
    notifier: Notifier,
    session: SessionTracker,
    sync: Arc<SyncClient>,
    lifecycle: TreeLifecycle,
    placement: PlacementWorkflow,
}

impl App {
    /// Wire up a session. Must be called inside a tokio runtime; the
    /// identity feed starts immediately.
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        host: Arc<dyn Host>,
    ) -> (Self, NoticeReceiver) {
        let state = Arc::new(AppState::new());
        let (notifier, notices) = Notifier::channel();
        let failsafe = Failsafe::new(config.failsafe, state.clone(), notifier.clone());
        let session = SessionTracker::start(auth.as_ref(), state.clone());
        let sync = Arc::new(SyncClient::new(store.clone(), state.clone()));
        let lifecycle = TreeLifecycle::new(
            state.clone(),
            store.clone(),
            host.clone(),
            sync.clone(),
            failsafe.clone(),
            notifier.clone(),
        );
        let placement = PlacementWorkflow::new(
            state.clone(),
            store.clone(),
            failsafe,
            notifier.clone(),
            config.clamp_drops,
        );

        let app = Self {
            config,
            state,
            store,
            auth,
            host,
            notifier,
            session,
            sync,
            lifecycle,
            placement,
        };
        (app, notices)
    }

    /// Resolve the tree named by the current location, or create one.
    pub async fn mount(&self) -> Result<Tree, ActionError> {
        let candidate = parse_tree_route(&self.host.path()).ok();
        self.lifecycle.resolve(candidate).await
    }

    // ─── Bindings ────────────────────────────────────────────────────────

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn bindings(&self) -> Bindings {
        self.state.bindings()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn palette(&self) -> &'static [OrnamentKind] {
        &OrnamentKind::ALL
    }

    pub fn is_owner(&self) -> bool {
        self.state.is_owner()
    }

    pub fn can_delete(&self) -> bool {
        self.state.can_delete()
    }

    /// The tree whose ornaments are currently streaming in, if any.
    pub fn subscribed_tree(&self) -> Option<DocId> {
        self.sync.tree_id()
    }

    pub fn observe_identity<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnMut(Option<&Identity>) + Send + 'static,
    {
        self.session.observe_identity(callback)
    }

    // ─── Auth ────────────────────────────────────────────────────────────

    pub async fn sign_in(&self) -> Result<Identity, ActionError> {
        self.auth.sign_in().await.map_err(|err| {
            log::error!("sign-in failed: {err}");
            self.notifier.notify(Notice::SignInFailed(err.to_string()));
            err.into()
        })
    }

    pub async fn sign_out(&self) -> Result<(), ActionError> {
        self.auth.sign_out().await.map_err(|err| {
            log::error!("sign-out failed: {err}");
            err.into()
        })
    }

    // ─── Placement ───────────────────────────────────────────────────────

    /// Begin dragging a tray icon (`existing: None`) or a placed ornament.
    pub fn start_drag(&self, kind: OrnamentKind, existing: Option<DocId>) -> DragPayload {
        match existing {
            Some(id) => DragPayload::existing(kind, id),
            None => DragPayload::new_ornament(kind),
        }
    }

    pub fn set_drop_zone(&self, zone: DropZone) {
        self.placement.set_drop_zone(zone);
    }

    pub async fn on_drop(&self, payload: DragPayload, pointer: Point) -> DropOutcome {
        self.placement.on_drop(payload, pointer).await
    }

    pub fn set_sender(&self, sender: &str) {
        self.placement.set_sender(sender);
    }

    pub fn set_message(&self, message: &str) {
        self.placement.set_message(message);
    }

    pub fn cancel_drop(&self) {
        self.placement.cancel_drop();
    }

    pub async fn confirm_drop(&self) -> Result<ConfirmOutcome, ActionError> {
        Ok(self.placement.confirm_drop().await?)
    }

    // ─── Message dialog ──────────────────────────────────────────────────

    pub fn open_message(&self, ornament: Ornament) {
        self.state.set_selected(Some(ornament));
    }

    /// Select a displayed ornament by id. Returns `false` if it is not on
    /// the tree.
    pub fn open_message_by_id(&self, id: DocId) -> bool {
        match self.state.ornament(id) {
            Some(ornament) => {
                self.open_message(ornament);
                true
            }
            None => false,
        }
    }

    pub fn close_message(&self) {
        self.state.set_selected(None);
    }

    /// Delete the selected ornament after the user confirms.
    pub async fn delete_ornament(&self) -> Result<DeleteOutcome, ActionError> {
        let Some(selected) = self.state.selected() else {
            return Ok(DeleteOutcome::NothingSelected);
        };
        if !self
            .host
            .confirm("Are you sure you want to remove this ornament?")
            .await
        {
            return Ok(DeleteOutcome::Declined);
        }
        match self.store.delete(Collection::Ornaments, selected.id).await {
            Ok(()) => {
                log::info!("ornament {} deleted", selected.id);
                self.close_message();
                Ok(DeleteOutcome::Deleted(selected.id))
            }
            Err(err) => {
                log::error!("delete of {} failed: {err}", selected.id);
                self.notifier.notify(Notice::DeleteFailed);
                Err(err.into())
            }
        }
    }

    // ─── Sharing ─────────────────────────────────────────────────────────

    /// Copy the current tree's link to the clipboard and return it.
    pub async fn copy_link(&self) -> Result<String, ActionError> {
        let link = share_link(&self.config.origin, &self.host.path());
        match self.host.copy_to_clipboard(&link).await {
            Ok(()) => {
                self.notifier.notify(Notice::LinkCopied);
                Ok(link)
            }
            Err(reason) => {
                log::error!("copying link failed: {reason}");
                self.notifier.notify(Notice::CopyFailed);
                Err(ActionError::Clipboard(reason))
            }
        }
    }
}
