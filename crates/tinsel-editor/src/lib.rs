//! Client-side engine for a shared ornament tree.
//!
//! Keeps local UI state consistent with the remote document store under
//! concurrent writers: a live, deterministically ordered ornament list,
//! drag-and-drop placement with a bounded-time failsafe around every
//! blocking store call, tree creation/loading, and ownership-based
//! permissions. [`App`] ties the pieces together and is the surface the UI
//! layer binds to.

pub mod app;
pub mod config;
pub mod error;
pub mod failsafe;
pub mod host;
pub mod lifecycle;
pub mod notice;
pub mod placement;
pub mod session;
pub mod state;
pub mod sync;

pub use app::{App, DeleteOutcome};
pub use config::SessionConfig;
pub use error::ActionError;
pub use host::{Host, MemoryHost};
pub use notice::{Notice, NoticeReceiver, Notifier};
pub use placement::{ConfirmOutcome, ConfirmSkipped, DropIgnored, DropOutcome};
pub use state::{AppState, Bindings};
