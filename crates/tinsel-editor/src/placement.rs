//! Placement workflow: drag → drop → (move | stage → confirm/cancel).
//!
//! ```text
//! Idle ─drag─▶ Dragging ─drop─┬─▶ Move (owner only) ──────────▶ Idle
//!                             └─▶ Staged ─┬─ confirm ─▶ persist ─▶ Idle
//!                                         └─ cancel ─────────────▶ Idle
//! ```
//!
//! The drag phase lives in the [`DragPayload`] the UI carries from the drag
//! source to the drop zone. Staged state is the `pending` placement plus
//! the sender/message `draft`. Each store write goes through the failsafe.

use crate::failsafe::Failsafe;
use crate::notice::{Notice, Notifier};
use crate::state::AppState;
use std::sync::Arc;
use tinsel_core::coords::{DropZone, map_pointer};
use tinsel_core::document::{NewOrnament, encode_move, encode_new_ornament};
use tinsel_core::id::DocId;
use tinsel_core::model::{Draft, DragPayload, PendingPlacement};
use tinsel_core::Point;
use tinsel_store::{Collection, DocumentStore, StoreError};

/// What a drop did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    /// New ornament staged, waiting for a sender.
    Staged(PendingPlacement),
    Moved(DocId),
    /// The move was attempted and the store rejected it. Logged only.
    MoveFailed(DocId),
    Ignored(DropIgnored),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIgnored {
    NoTree,
    /// The drop zone has not been measured yet, or the pointer has no
    /// finite position in it.
    NoDropZone,
    /// Moves are reserved to the tree owner.
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Saved(DocId),
    Skipped(ConfirmSkipped),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmSkipped {
    NothingStaged,
    NoTree,
    MissingSender,
}

pub struct PlacementWorkflow {
    state: Arc<AppState>,
    store: Arc<dyn DocumentStore>,
    failsafe: Failsafe,
    notifier: Notifier,
    clamp: bool,
}

impl PlacementWorkflow {
    pub fn new(
        state: Arc<AppState>,
        store: Arc<dyn DocumentStore>,
        failsafe: Failsafe,
        notifier: Notifier,
        clamp: bool,
    ) -> Self {
        Self {
            state,
            store,
            failsafe,
            notifier,
            clamp,
        }
    }

    pub fn set_drop_zone(&self, zone: DropZone) {
        self.state.drop_zone.send_replace(Some(zone));
    }

    pub fn set_sender(&self, sender: &str) {
        self.state
            .draft
            .send_modify(|draft| draft.sender = sender.to_string());
    }

    pub fn set_message(&self, message: &str) {
        self.state
            .draft
            .send_modify(|draft| draft.message = message.to_string());
    }

    /// Handle a drop at `pointer` (client coordinates).
    pub async fn on_drop(&self, payload: DragPayload, pointer: Point) -> DropOutcome {
        if self.state.tree_id().is_none() {
            log::warn!("drop ignored: tree not loaded yet");
            return DropOutcome::Ignored(DropIgnored::NoTree);
        }
        let Some(position) = self
            .state
            .drop_zone()
            .and_then(|zone| map_pointer(pointer, &zone, self.clamp))
        else {
            log::warn!("drop ignored: no canvas position for ({}, {})", pointer.x, pointer.y);
            return DropOutcome::Ignored(DropIgnored::NoDropZone);
        };

        let Some(id) = payload.existing else {
            let pending = PendingPlacement {
                kind: payload.kind,
                position,
            };
            self.state.pending.send_replace(Some(pending));
            self.state.draft.send_replace(Draft::default());
            log::debug!("staged {} at ({:.1}, {:.1})", payload.kind, position.x, position.y);
            return DropOutcome::Staged(pending);
        };

        if !self.state.is_owner() {
            log::debug!("move of {id} ignored: not the tree owner");
            return DropOutcome::Ignored(DropIgnored::NotOwner);
        }
        let write = self
            .store
            .update(Collection::Ornaments, id, encode_move(position));
        match self.failsafe.guard("move ornament", write).await {
            Ok(()) => DropOutcome::Moved(id),
            Err(err) => {
                log::error!("move of {id} failed: {err}");
                DropOutcome::MoveFailed(id)
            }
        }
    }

    /// Discard the staged placement and reset the inputs.
    pub fn cancel_drop(&self) {
        self.state.pending.send_replace(None);
        self.state.draft.send_replace(Draft::default());
    }

    /// Persist the staged placement.
    ///
    /// Without a staged placement, a loaded tree, or a sender this is a
    /// silent no-op. On failure the staged state is kept for a retry.
    pub async fn confirm_drop(&self) -> Result<ConfirmOutcome, StoreError> {
        let Some(pending) = self.state.pending() else {
            return Ok(ConfirmOutcome::Skipped(ConfirmSkipped::NothingStaged));
        };
        let Some(tree_id) = self.state.tree_id() else {
            return Ok(ConfirmOutcome::Skipped(ConfirmSkipped::NoTree));
        };
        let draft = self.state.draft();
        if !draft.is_sendable() {
            return Ok(ConfirmOutcome::Skipped(ConfirmSkipped::MissingSender));
        }

        let fields = encode_new_ornament(&NewOrnament {
            tree_id,
            creator_id: self.state.identity().map(|who| who.id),
            sender: &draft.sender,
            message: &draft.message,
            kind: pending.kind,
            position: pending.position,
        });
        let write = self.store.add(Collection::Ornaments, fields);
        match self.failsafe.guard("save ornament", write).await {
            Ok(id) => {
                log::info!("ornament {id} saved on tree {tree_id}");
                self.cancel_drop();
                Ok(ConfirmOutcome::Saved(id))
            }
            Err(err) => {
                log::error!("saving ornament failed: {err}");
                self.notifier.notify(Notice::SaveFailed);
                Err(err)
            }
        }
    }
}
