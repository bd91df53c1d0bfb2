//! The remote document store interface.
//!
//! Collections of JSON documents with store-assigned ids, per-document
//! get/add/update/delete, and filtered real-time subscriptions that deliver
//! the *full* matching document set on every change.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tinsel_core::document::{Document, Fields};
use tinsel_core::id::DocId;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Trees,
    Ornaments,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Trees => "trees",
            Collection::Ornaments => "ornaments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store client was never initialized or has gone away.
    #[error("document store unavailable")]
    Unavailable,

    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: DocId },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Equality filter on a single field. Subscriptions request no ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub equals: Value,
}

impl Filter {
    pub fn field_eq(field: &'static str, equals: impl Into<Value>) -> Self {
        Self {
            field,
            equals: equals.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(self.field) == Some(&self.equals)
    }
}

/// One delivery on a subscription: the full current document set, or a
/// transport error. Errors do not end the feed.
pub type SnapshotEvent = Result<Vec<Document>, StoreError>;

/// Live feed of snapshot events. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SnapshotFeed {
    rx: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl SnapshotFeed {
    pub fn new(rx: mpsc::UnboundedReceiver<SnapshotEvent>) -> Self {
        Self { rx }
    }

    /// Next event, or `None` once the store closes the feed.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document, returning its store-assigned id.
    async fn add(&self, collection: Collection, fields: Fields) -> Result<DocId, StoreError>;

    /// Fetch one document; `Ok(None)` when it does not exist.
    async fn get(&self, collection: Collection, id: DocId)
    -> Result<Option<Document>, StoreError>;

    /// Merge `fields` into an existing document.
    async fn update(
        &self,
        collection: Collection,
        id: DocId,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: DocId) -> Result<(), StoreError>;

    /// Start a real-time subscription. The first event is the initial
    /// document set; every later event is the complete set after a change.
    fn subscribe(&self, collection: Collection, filter: Filter)
    -> Result<SnapshotFeed, StoreError>;
}
