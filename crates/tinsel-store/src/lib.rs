//! Seams to the two external collaborators: the remote document store and
//! the authentication provider. The `memory` module implements both
//! in-process for tests and the CLI driver.

pub mod auth;
pub mod memory;
pub mod store;

pub use auth::{AuthError, AuthProvider};
pub use memory::{MemoryAuth, MemoryStore, StoreCall};
pub use store::{Collection, DocumentStore, Filter, SnapshotEvent, SnapshotFeed, StoreError};
