//! Process-wide application state.
//!
//! Every field is a `watch` channel: the UI holds receivers (see
//! [`Bindings`]) and exactly one component owns writes to each field.
//!
//! | Field        | Writer                         |
//! |--------------|--------------------------------|
//! | `loading`    | `Failsafe`                     |
//! | `identity`   | `SessionTracker`               |
//! | `tree`       | `TreeLifecycle`                |
//! | `ornaments`  | `SyncClient`                   |
//! | `pending`    | `PlacementWorkflow`            |
//! | `draft`      | `PlacementWorkflow`            |
//! | `drop_zone`  | `PlacementWorkflow`            |
//! | `selected`   | `App` (message dialog actions) |
//! | `is_owner`   | derived, see below             |
//! | `can_delete` | derived, see below             |
//!
//! `identity`, `tree`, and `selected` are written through setters that
//! recompute the two permission fields in the same call, so a permission
//! receiver never lags behind its inputs.
//!
//! Readers copy values out; no borrow is ever held across an await.

use std::sync::atomic::{AtomicUsize, Ordering};
use tinsel_core::coords::DropZone;
use tinsel_core::id::{DocId, UserId};
use tinsel_core::model::{Draft, Identity, Ornament, PendingPlacement, Tree};
use tinsel_core::permissions;
use tokio::sync::watch;

/// The "an operation is blocking the UI" flag.
///
/// Each blocking operation takes one hold and gives it back exactly once.
/// The flag is up while any hold is outstanding. The hold count only
/// changes inside the channel's write lock, so it never drifts from the
/// published value.
#[derive(Debug)]
pub struct BusyFlag {
    busy: watch::Sender<bool>,
    holds: AtomicUsize,
}

impl BusyFlag {
    fn new() -> Self {
        Self {
            busy: watch::channel(false).0,
            holds: AtomicUsize::new(0),
        }
    }

    /// Take a hold that is given back when the returned guard drops.
    pub(crate) fn hold(&self) -> BusyHold<'_> {
        self.raise();
        BusyHold(self)
    }

    /// Take a hold. Returns `true` if this raised the flag.
    fn raise(&self) -> bool {
        self.busy.send_if_modified(|busy| {
            self.holds.fetch_add(1, Ordering::Relaxed);
            !std::mem::replace(busy, true)
        })
    }

    /// Give a hold back. Returns `true` only if that lowered the flag, and
    /// only then are receivers notified.
    fn release(&self) -> bool {
        self.busy.send_if_modified(|busy| {
            let holds = self.holds.load(Ordering::Relaxed);
            if holds == 0 {
                return false;
            }
            self.holds.store(holds - 1, Ordering::Relaxed);
            holds == 1 && std::mem::replace(busy, false)
        })
    }

    pub fn is_set(&self) -> bool {
        *self.busy.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }
}

/// One outstanding hold on a [`BusyFlag`].
#[derive(Debug)]
pub(crate) struct BusyHold<'a>(&'a BusyFlag);

impl Drop for BusyHold<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

#[derive(Debug)]
pub struct AppState {
    pub(crate) loading: BusyFlag,
    pub(crate) identity: watch::Sender<Option<Identity>>,
    pub(crate) tree: watch::Sender<Option<Tree>>,
    pub(crate) ornaments: watch::Sender<Vec<Ornament>>,
    pub(crate) pending: watch::Sender<Option<PendingPlacement>>,
    pub(crate) draft: watch::Sender<Draft>,
    pub(crate) drop_zone: watch::Sender<Option<DropZone>>,
    pub(crate) selected: watch::Sender<Option<Ornament>>,
    is_owner: watch::Sender<bool>,
    can_delete: watch::Sender<bool>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            loading: BusyFlag::new(),
            identity: watch::channel(None).0,
            tree: watch::channel(None).0,
            ornaments: watch::channel(Vec::new()).0,
            pending: watch::channel(None).0,
            draft: watch::channel(Draft::default()).0,
            drop_zone: watch::channel(None).0,
            selected: watch::channel(None).0,
            is_owner: watch::channel(false).0,
            can_delete: watch::channel(false).0,
        }
    }

    // ─── Snapshot reads ──────────────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    pub fn tree(&self) -> Option<Tree> {
        self.tree.borrow().clone()
    }

    pub fn tree_id(&self) -> Option<DocId> {
        self.tree.borrow().as_ref().map(|t| t.id)
    }

    pub fn tree_owner(&self) -> Option<UserId> {
        self.tree.borrow().as_ref().and_then(|t| t.owner_id)
    }

    pub fn ornaments(&self) -> Vec<Ornament> {
        self.ornaments.borrow().clone()
    }

    pub fn ornament(&self, id: DocId) -> Option<Ornament> {
        self.ornaments.borrow().iter().find(|o| o.id == id).cloned()
    }

    pub fn pending(&self) -> Option<PendingPlacement> {
        *self.pending.borrow()
    }

    pub fn draft(&self) -> Draft {
        self.draft.borrow().clone()
    }

    pub fn drop_zone(&self) -> Option<DropZone> {
        *self.drop_zone.borrow()
    }

    pub fn selected(&self) -> Option<Ornament> {
        self.selected.borrow().clone()
    }

    // ─── Permission inputs ───────────────────────────────────────────────

    pub(crate) fn set_identity(&self, identity: Option<Identity>) {
        self.identity.send_replace(identity);
        self.refresh_permissions();
    }

    pub(crate) fn set_tree(&self, tree: Option<Tree>) {
        self.tree.send_replace(tree);
        self.refresh_permissions();
    }

    pub(crate) fn set_selected(&self, selected: Option<Ornament>) {
        self.selected.send_replace(selected);
        self.refresh_permissions();
    }

    /// Publish the derived permissions. Receivers are only woken when a
    /// value actually flips.
    fn refresh_permissions(&self) {
        let is_owner = self.is_owner();
        let can_delete = self.can_delete();
        self.is_owner
            .send_if_modified(|v| std::mem::replace(v, is_owner) != is_owner);
        self.can_delete
            .send_if_modified(|v| std::mem::replace(v, can_delete) != can_delete);
    }

    // ─── Derived ─────────────────────────────────────────────────────────

    pub fn is_owner(&self) -> bool {
        permissions::is_owner(self.identity.borrow().as_ref(), self.tree_owner())
    }

    pub fn can_delete(&self) -> bool {
        permissions::can_delete(
            self.identity.borrow().as_ref(),
            self.tree_owner(),
            self.selected.borrow().as_ref(),
        )
    }

    pub fn bindings(&self) -> Bindings {
        Bindings {
            loading: self.loading.subscribe(),
            identity: self.identity.subscribe(),
            tree: self.tree.subscribe(),
            ornaments: self.ornaments.subscribe(),
            pending: self.pending.subscribe(),
            draft: self.draft.subscribe(),
            selected: self.selected.subscribe(),
            is_owner: self.is_owner.subscribe(),
            can_delete: self.can_delete.subscribe(),
        }
    }
}

/// Reactive receivers for the UI layer.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub loading: watch::Receiver<bool>,
    pub identity: watch::Receiver<Option<Identity>>,
    pub tree: watch::Receiver<Option<Tree>>,
    pub ornaments: watch::Receiver<Vec<Ornament>>,
    pub pending: watch::Receiver<Option<PendingPlacement>>,
    pub draft: watch::Receiver<Draft>,
    pub selected: watch::Receiver<Option<Ornament>>,
    pub is_owner: watch::Receiver<bool>,
    pub can_delete: watch::Receiver<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_flag_reports_only_real_transitions() {
        let flag = BusyFlag::new();
        let mut rx = flag.subscribe();
        assert!(!flag.release());
        assert!(!rx.has_changed().unwrap());

        assert!(flag.raise());
        assert!(flag.is_set());
        assert!(flag.release());
        assert!(!flag.release());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn busy_flag_stays_up_until_every_hold_is_returned() {
        let flag = BusyFlag::new();
        let mut rx = flag.subscribe();
        assert!(flag.raise());
        assert!(!flag.raise());
        rx.borrow_and_update();

        assert!(!flag.release());
        assert!(flag.is_set());
        assert!(!rx.has_changed().unwrap());

        assert!(flag.release());
        assert!(!flag.is_set());
        // An extra release cannot push the count below zero and swallow
        // the next hold.
        assert!(!flag.release());
        assert!(flag.raise());
        assert!(flag.is_set());
    }

    #[test]
    fn dropped_hold_gives_itself_back() {
        let flag = BusyFlag::new();
        let outer = flag.hold();
        {
            let _inner = flag.hold();
        }
        assert!(flag.is_set());
        drop(outer);
        assert!(!flag.is_set());
    }

    #[test]
    fn ownership_follows_identity_and_tree() {
        let state = AppState::new();
        let bindings = state.bindings();
        assert!(!state.is_owner());

        state.set_tree(Some(Tree {
            id: DocId::intern("t"),
            created_at: None,
            owner_id: Some(UserId::intern("u1")),
            owner_name: None,
        }));
        assert!(!state.is_owner());

        state.set_identity(Some(Identity::new("u1", "Noel")));
        assert!(state.is_owner());
        assert!(*bindings.is_owner.borrow());

        state.set_identity(Some(Identity::new("u2", "Ivy")));
        assert!(!state.is_owner());
        assert!(!state.can_delete());
        assert!(!*bindings.is_owner.borrow());
    }

    #[test]
    fn can_delete_binding_tracks_selection() {
        let state = AppState::new();
        let mut can_delete = state.bindings().can_delete;
        state.set_identity(Some(Identity::new("u2", "Ivy")));
        assert!(!can_delete.has_changed().unwrap());

        let mine = Ornament {
            id: DocId::intern("mine"),
            tree_id: DocId::intern("t"),
            creator_id: Some(UserId::intern("u2")),
            sender: "Ivy".into(),
            message: String::new(),
            kind: tinsel_core::model::OrnamentKind::Ornament1,
            position: tinsel_core::model::Position::new(0.0, 0.0),
            created_at: None,
        };
        state.set_selected(Some(mine.clone()));
        assert!(can_delete.has_changed().unwrap());
        assert!(*can_delete.borrow_and_update());

        // Reselecting an ornament with the same answer wakes nobody.
        state.set_selected(Some(mine));
        assert!(!can_delete.has_changed().unwrap());

        state.set_selected(None);
        assert!(!*can_delete.borrow_and_update());
    }
}
