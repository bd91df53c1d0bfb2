//! Core data model for a shared ornament tree.
//!
//! A `Tree` is the shared canvas document; `Ornament`s hang on exactly one
//! tree and carry a sender, a message, and a percentage position on the
//! canvas. Both are owned by the remote document store: the client only
//! holds decoded copies, replaced wholesale by each subscription snapshot.
//!
//! `PendingPlacement`, `Draft`, and `DragPayload` are local, transient state
//! for the placement workflow and are never persisted as-is.

use crate::id::{DocId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Timestamps ──────────────────────────────────────────────────────────

/// A server-assigned instant, stored as seconds + nanoseconds since the
/// Unix epoch. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Current wall-clock time. Only store backends should call this;
    /// clients never stamp documents themselves.
    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self {
            seconds: now.timestamp(),
            nanos: now.timestamp_subsec_nanos(),
        }
    }
}

// ─── Ornament kinds ──────────────────────────────────────────────────────

/// The fixed palette of ornament icons. Each variant maps to one asset
/// file name, which is also its wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrnamentKind {
    Ornament1,
    Ornament2,
    Ornament3,
    Ornament4,
    Ornament5,
    Ornament6,
    Ornament7,
    Ornament8,
}

impl OrnamentKind {
    /// Palette order, as shown in the ornament tray.
    pub const ALL: [OrnamentKind; 8] = [
        OrnamentKind::Ornament1,
        OrnamentKind::Ornament2,
        OrnamentKind::Ornament3,
        OrnamentKind::Ornament4,
        OrnamentKind::Ornament5,
        OrnamentKind::Ornament6,
        OrnamentKind::Ornament7,
        OrnamentKind::Ornament8,
    ];

    /// Asset file name for this kind.
    pub fn asset(&self) -> &'static str {
        match self {
            OrnamentKind::Ornament1 => "Ornament1.png",
            OrnamentKind::Ornament2 => "Ornament2.png",
            OrnamentKind::Ornament3 => "Ornament3.png",
            OrnamentKind::Ornament4 => "Ornament4.png",
            OrnamentKind::Ornament5 => "Ornament5.png",
            OrnamentKind::Ornament6 => "Ornament6.png",
            // Shipped asset is spelled this way; stored documents reference it.
            OrnamentKind::Ornament7 => "Ornanent7.png",
            OrnamentKind::Ornament8 => "Ornament8.png",
        }
    }
}

impl fmt::Display for OrnamentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset())
    }
}

impl FromStr for OrnamentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrnamentKind::ALL
            .into_iter()
            .find(|kind| kind.asset() == s)
            .ok_or_else(|| format!("unknown ornament type '{s}'"))
    }
}

impl Serialize for OrnamentKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.asset())
    }
}

impl<'de> Deserialize<'de> for OrnamentKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Documents ───────────────────────────────────────────────────────────

/// Canvas position as percentages of the drop zone's width and height.
/// Nominally within [0, 100] on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into [0, 100].
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

/// The shared canvas. Ownership is fixed at creation and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub id: DocId,
    /// `None` until the server timestamp has round-tripped.
    pub created_at: Option<Timestamp>,
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
}

/// A single placed decoration.
///
/// `kind` and `creator_id` are fixed at creation; only `position` changes
/// (by a move), and the whole document may be deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Ornament {
    pub id: DocId,
    pub tree_id: DocId,
    /// `None` for anonymous placements.
    pub creator_id: Option<UserId>,
    pub sender: String,
    pub message: String,
    pub kind: OrnamentKind,
    pub position: Position,
    /// `None` while the server timestamp is pending.
    pub created_at: Option<Timestamp>,
}

impl Ornament {
    pub fn is_pending(&self) -> bool {
        self.created_at.is_none()
    }
}

/// A signed-in identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: &str, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::intern(id),
            display_name: Some(display_name.into()),
        }
    }
}

// ─── Transient placement state ───────────────────────────────────────────

/// What a drag gesture carries from its source to the drop zone.
///
/// `existing` is set when the gesture started on an already-placed
/// ornament, which turns the drop into a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragPayload {
    pub kind: OrnamentKind,
    pub existing: Option<DocId>,
}

impl DragPayload {
    /// Dragging a fresh icon out of the tray.
    pub fn new_ornament(kind: OrnamentKind) -> Self {
        Self {
            kind,
            existing: None,
        }
    }

    /// Dragging an ornament that already hangs on the tree.
    pub fn existing(kind: OrnamentKind, id: DocId) -> Self {
        Self {
            kind,
            existing: Some(id),
        }
    }
}

/// A dropped-but-unconfirmed ornament waiting for a sender name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPlacement {
    pub kind: OrnamentKind,
    pub position: Position,
}

/// The sender/message input fields of the placement dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub sender: String,
    pub message: String,
}

impl Draft {
    /// A draft can be persisted once it names a sender.
    pub fn is_sendable(&self) -> bool {
        !self.sender.trim().is_empty()
    }
}
