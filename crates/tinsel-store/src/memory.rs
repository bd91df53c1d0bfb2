//! In-process store and auth backends.
//!
//! `MemoryStore` behaves like a remote document store seen from one client:
//! store-assigned ids, server timestamps resolved at commit, and full-set
//! snapshots pushed to every affected subscription. It also records every
//! call and can inject latency, hold writes open, go unavailable, or fail
//! subscriptions, so the client's timing and error paths can be driven
//! deterministically.

use crate::auth::{AuthError, AuthProvider};
use crate::store::{Collection, DocumentStore, Filter, SnapshotFeed, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tinsel_core::document::{Document, Fields, is_server_timestamp, timestamp_value};
use tinsel_core::id::DocId;
use tinsel_core::model::{Identity, Timestamp};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// A store call as issued by the client, recorded before it settles.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Add {
        collection: Collection,
        fields: Fields,
    },
    Get {
        collection: Collection,
        id: DocId,
    },
    Update {
        collection: Collection,
        id: DocId,
        fields: Fields,
    },
    Delete {
        collection: Collection,
        id: DocId,
    },
    Subscribe {
        collection: Collection,
        filter: Filter,
    },
}

struct Subscriber {
    collection: Collection,
    filter: Filter,
    tx: mpsc::UnboundedSender<crate::store::SnapshotEvent>,
}

#[derive(Default)]
struct Inner {
    /// Documents keyed by id text, so snapshots come out in id order
    /// rather than creation order.
    docs: HashMap<Collection, BTreeMap<String, Document>>,
    subscribers: Vec<Subscriber>,
    calls: Vec<StoreCall>,
    unavailable: bool,
    latency: Duration,
    latency_compensation: bool,
}

impl Inner {
    fn snapshot(&self, collection: Collection, filter: &Filter) -> Vec<Document> {
        self.docs
            .get(&collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push the full matching set to every subscription the change touched.
    fn publish(&mut self, collection: Collection, before: Option<&Fields>, after: Option<&Fields>) {
        self.subscribers.retain(|sub| !sub.tx.is_closed());
        let touched: Vec<usize> = self
            .subscribers
            .iter()
            .enumerate()
            .filter(|(_, sub)| {
                sub.collection == collection
                    && (before.is_some_and(|f| sub.filter.matches(f))
                        || after.is_some_and(|f| sub.filter.matches(f)))
            })
            .map(|(i, _)| i)
            .collect();
        for i in touched {
            let snapshot = self.snapshot(collection, &self.subscribers[i].filter);
            log::trace!(
                "memory store: {} docs → {collection} subscriber #{i}",
                snapshot.len()
            );
            let _ = self.subscribers[i].tx.send(Ok(snapshot));
        }
    }

    fn put(&mut self, collection: Collection, doc: Document) -> Option<Fields> {
        self.docs
            .entry(collection)
            .or_default()
            .insert(doc.id.as_str().to_string(), doc)
            .map(|old| old.fields)
    }
}

fn resolve_server_timestamps(fields: &mut Fields) {
    let now = timestamp_value(Timestamp::now());
    for value in fields.values_mut() {
        if is_server_timestamp(value) {
            *value = now.clone();
        }
    }
}

// ─── MemoryStore ─────────────────────────────────────────────────────────

pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// Writes and reads wait here while the gate is closed (`false`).
    gate: watch::Sender<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            gate: watch::channel(true).0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, fail fast when unavailable, else return the
    /// latency to apply before settling.
    fn begin(&self, call: StoreCall) -> Result<Duration, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.unavailable {
            return Err(StoreError::Unavailable);
        }
        Ok(inner.latency)
    }

    async fn settle(&self, latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let mut open = self.gate.subscribe();
        let _ = open.wait_for(|open| *open).await;
    }

    // ─── Test & driver controls ──────────────────────────────────────────

    /// Every call issued so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Delay applied to every read and write before it settles.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Park all reads and writes until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    pub fn set_available(&self, available: bool) {
        self.lock().unavailable = !available;
    }

    /// When set, an add first publishes the new document with its server
    /// timestamps still pending, then the committed version.
    pub fn set_latency_compensation(&self, enabled: bool) {
        self.lock().latency_compensation = enabled;
    }

    /// Write a document as another client would: not recorded as a call,
    /// published to subscribers. Server timestamp sentinels are resolved.
    pub fn insert(&self, collection: Collection, id: &str, mut fields: Fields) -> DocId {
        let id = DocId::intern(id);
        resolve_server_timestamps(&mut fields);
        let mut inner = self.lock();
        let before = inner.put(collection, Document::new(id, fields.clone()));
        inner.publish(collection, before.as_ref(), Some(&fields));
        id
    }

    /// Delete a document as another client would.
    pub fn remove(&self, collection: Collection, id: DocId) {
        let mut inner = self.lock();
        let removed = inner
            .docs
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id.as_str()));
        if let Some(doc) = removed {
            inner.publish(collection, Some(&doc.fields), None);
        }
    }

    pub fn documents(&self, collection: Collection) -> Vec<Document> {
        self.lock()
            .docs
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn document(&self, collection: Collection, id: DocId) -> Option<Document> {
        self.lock()
            .docs
            .get(&collection)
            .and_then(|docs| docs.get(id.as_str()))
            .cloned()
    }

    /// Deliver a transport error to every subscription on `collection`.
    pub fn fail_subscriptions(&self, collection: Collection, error: StoreError) {
        let inner = self.lock();
        for sub in inner.subscribers.iter().filter(|s| s.collection == collection) {
            let _ = sub.tx.send(Err(error.clone()));
        }
    }

    /// Number of live subscriptions on `collection`.
    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| s.collection == collection && !s.tx.is_closed())
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<DocId, StoreError> {
        let latency = self.begin(StoreCall::Add {
            collection,
            fields: fields.clone(),
        })?;
        self.settle(latency).await;

        let id = DocId::intern(&Uuid::new_v4().simple().to_string());
        let mut inner = self.lock();
        if inner.latency_compensation && fields.values().any(is_server_timestamp) {
            let mut local = fields.clone();
            local.retain(|_, value| !is_server_timestamp(value));
            inner.put(collection, Document::new(id, local.clone()));
            inner.publish(collection, None, Some(&local));
        }
        let mut committed = fields;
        resolve_server_timestamps(&mut committed);
        let before = inner.put(collection, Document::new(id, committed.clone()));
        inner.publish(collection, before.as_ref(), Some(&committed));
        log::debug!("memory store: added {collection}/{id}");
        Ok(id)
    }

    async fn get(
        &self,
        collection: Collection,
        id: DocId,
    ) -> Result<Option<Document>, StoreError> {
        let latency = self.begin(StoreCall::Get { collection, id })?;
        self.settle(latency).await;
        Ok(self.document(collection, id))
    }

    async fn update(
        &self,
        collection: Collection,
        id: DocId,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let latency = self.begin(StoreCall::Update {
            collection,
            id,
            fields: fields.clone(),
        })?;
        self.settle(latency).await;

        let mut inner = self.lock();
        let Some(mut doc) = inner
            .docs
            .get(&collection)
            .and_then(|docs| docs.get(id.as_str()))
            .cloned()
        else {
            return Err(StoreError::NotFound { collection, id });
        };
        let before = doc.fields.clone();
        let mut patch = fields;
        resolve_server_timestamps(&mut patch);
        doc.fields.extend(patch);
        let after = doc.fields.clone();
        inner.put(collection, doc);
        inner.publish(collection, Some(&before), Some(&after));
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: DocId) -> Result<(), StoreError> {
        let latency = self.begin(StoreCall::Delete { collection, id })?;
        self.settle(latency).await;
        self.remove(collection, id);
        Ok(())
    }

    fn subscribe(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<SnapshotFeed, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Subscribe {
            collection,
            filter: filter.clone(),
        });
        if inner.unavailable {
            return Err(StoreError::Unavailable);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(inner.snapshot(collection, &filter)));
        inner.subscribers.push(Subscriber {
            collection,
            filter,
            tx,
        });
        Ok(SnapshotFeed::new(rx))
    }
}

// ─── MemoryAuth ──────────────────────────────────────────────────────────

pub struct MemoryAuth {
    identity: watch::Sender<Option<Identity>>,
    /// Outcome of the next `sign_in`; an empty script means the user
    /// dismissed the flow.
    next_sign_in: Mutex<Option<Result<Identity, AuthError>>>,
    sign_out_error: Mutex<Option<AuthError>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self {
            identity: watch::channel(None).0,
            next_sign_in: Mutex::new(None),
            sign_out_error: Mutex::new(None),
        }
    }

    /// Start with `identity` already signed in.
    pub fn signed_in(identity: Identity) -> Self {
        let auth = Self::new();
        auth.identity.send_replace(Some(identity));
        auth
    }

    pub fn script_sign_in(&self, outcome: Result<Identity, AuthError>) {
        *self
            .next_sign_in
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(outcome);
    }

    pub fn fail_sign_out(&self, error: AuthError) {
        *self
            .sign_out_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Change identity out-of-band (session expiry, another tab).
    pub fn set_identity(&self, identity: Option<Identity>) {
        self.identity.send_replace(identity);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    async fn sign_in(&self) -> Result<Identity, AuthError> {
        let outcome = self
            .next_sign_in
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or(Err(AuthError::Cancelled));
        let identity = outcome?;
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(err) = self
            .sign_out_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(err);
        }
        self.identity.send_replace(None);
        Ok(())
    }
}
