//! Integration tests: in-memory store and auth backends.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tinsel_core::document::{self, Fields};
use tinsel_core::id::DocId;
use tinsel_core::model::{Identity, Position};
use tinsel_store::{
    AuthError, AuthProvider, Collection, DocumentStore, Filter, MemoryAuth, MemoryStore,
    StoreCall, StoreError,
};

fn ornament_fields(tree: &str, sender: &str) -> Fields {
    let serde_json::Value::Object(fields) = json!({
        "tree_id": tree,
        "creator_id": null,
        "sender": sender,
        "message": "",
        "ornament_type": "Ornament1.png",
        "x": 10.0,
        "y": 20.0,
        "created_at": document::server_timestamp(),
    }) else {
        unreachable!()
    };
    fields
}

// ─── Documents ──────────────────────────────────────────────────────────

#[tokio::test]
async fn add_assigns_id_and_resolves_server_timestamp() {
    let store = MemoryStore::new();
    let id = store
        .add(Collection::Ornaments, ornament_fields("t1", "Ivy"))
        .await
        .unwrap();

    let doc = store.get(Collection::Ornaments, id).await.unwrap().unwrap();
    assert_eq!(doc.id, id);
    assert!(!document::is_server_timestamp(&doc.fields["created_at"]));
    let ornament = document::decode_ornament(&doc).unwrap();
    assert!(ornament.created_at.is_some());
}

#[tokio::test]
async fn get_missing_document_is_none() {
    let store = MemoryStore::new();
    let found = store
        .get(Collection::Trees, DocId::intern("nope"))
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn update_merges_and_rejects_missing() {
    let store = MemoryStore::new();
    let id = store.insert(Collection::Ornaments, "o1", ornament_fields("t1", "Ivy"));

    store
        .update(
            Collection::Ornaments,
            id,
            document::encode_move(Position::new(50.0, 60.0)),
        )
        .await
        .unwrap();
    let doc = store.document(Collection::Ornaments, id).unwrap();
    assert_eq!(doc.fields["x"], json!(50.0));
    assert_eq!(doc.fields["sender"], json!("Ivy"));

    let err = store
        .update(Collection::Ornaments, DocId::intern("ghost"), Fields::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn unavailable_store_fails_but_records_the_call() {
    let store = MemoryStore::new();
    store.set_available(false);
    let err = store.add(Collection::Trees, Fields::new()).await.unwrap_err();
    assert_eq!(err, StoreError::Unavailable);
    assert_eq!(store.calls().len(), 1);
    assert!(store.documents(Collection::Trees).is_empty());
}

// ─── Subscriptions ──────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_delivers_initial_then_full_sets() {
    let store = MemoryStore::new();
    store.insert(Collection::Ornaments, "a", ornament_fields("t1", "A"));
    store.insert(Collection::Ornaments, "other", ornament_fields("t2", "X"));

    let mut feed = store
        .subscribe(Collection::Ornaments, Filter::field_eq("tree_id", "t1"))
        .unwrap();
    let initial = feed.next().await.unwrap().unwrap();
    assert_eq!(initial.len(), 1);

    store.insert(Collection::Ornaments, "b", ornament_fields("t1", "B"));
    let after_add = feed.next().await.unwrap().unwrap();
    assert_eq!(after_add.len(), 2);

    store.remove(Collection::Ornaments, DocId::intern("a"));
    let after_remove = feed.next().await.unwrap().unwrap();
    let ids: Vec<&str> = after_remove.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
}

#[tokio::test]
async fn unrelated_writes_do_not_wake_subscription() {
    let store = MemoryStore::new();
    let mut feed = store
        .subscribe(Collection::Ornaments, Filter::field_eq("tree_id", "t1"))
        .unwrap();
    let _initial = feed.next().await.unwrap();

    store.insert(Collection::Ornaments, "x", ornament_fields("t2", "X"));
    let pending = tokio::time::timeout(Duration::from_millis(10), feed.next()).await;
    assert!(pending.is_err(), "no snapshot expected for another tree");
}

#[tokio::test]
async fn latency_compensation_publishes_pending_then_committed() {
    let store = MemoryStore::new();
    store.set_latency_compensation(true);
    let mut feed = store
        .subscribe(Collection::Ornaments, Filter::field_eq("tree_id", "t1"))
        .unwrap();
    let _initial = feed.next().await.unwrap();

    store
        .add(Collection::Ornaments, ornament_fields("t1", "Ivy"))
        .await
        .unwrap();

    let local = feed.next().await.unwrap().unwrap();
    assert!(document::decode_ornament(&local[0]).unwrap().is_pending());
    let committed = feed.next().await.unwrap().unwrap();
    assert!(!document::decode_ornament(&committed[0]).unwrap().is_pending());
}

#[tokio::test]
async fn transport_errors_do_not_close_the_feed() {
    let store = MemoryStore::new();
    let mut feed = store
        .subscribe(Collection::Ornaments, Filter::field_eq("tree_id", "t1"))
        .unwrap();
    let _initial = feed.next().await.unwrap();

    store.fail_subscriptions(
        Collection::Ornaments,
        StoreError::Transport("index missing".into()),
    );
    assert!(feed.next().await.unwrap().is_err());

    store.insert(Collection::Ornaments, "a", ornament_fields("t1", "A"));
    assert_eq!(feed.next().await.unwrap().unwrap().len(), 1);
}

#[tokio::test]
async fn dropped_feed_unsubscribes() {
    let store = MemoryStore::new();
    let feed = store
        .subscribe(Collection::Ornaments, Filter::field_eq("tree_id", "t1"))
        .unwrap();
    assert_eq!(store.subscriber_count(Collection::Ornaments), 1);
    drop(feed);
    assert_eq!(store.subscriber_count(Collection::Ornaments), 0);
}

// ─── Timing controls ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn latency_delays_settlement() {
    let store = MemoryStore::new();
    store.set_latency(Duration::from_secs(3));
    let started = tokio::time::Instant::now();
    store.add(Collection::Trees, Fields::new()).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn held_writes_wait_for_release() {
    let store = std::sync::Arc::new(MemoryStore::new());
    store.hold();
    let write = tokio::spawn({
        let store = store.clone();
        async move { store.add(Collection::Trees, Fields::new()).await }
    });
    tokio::task::yield_now().await;
    assert!(matches!(store.calls()[0], StoreCall::Add { .. }));
    assert!(store.documents(Collection::Trees).is_empty());

    store.release();
    write.await.unwrap().unwrap();
    assert_eq!(store.documents(Collection::Trees).len(), 1);
}

// ─── Auth ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_follows_script_and_publishes_identity() {
    let auth = MemoryAuth::new();
    let changes = auth.identity_changes();
    assert_eq!(*changes.borrow(), None);

    assert_eq!(auth.sign_in().await, Err(AuthError::Cancelled));

    let noel = Identity::new("u1", "Noel");
    auth.script_sign_in(Ok(noel.clone()));
    assert_eq!(auth.sign_in().await, Ok(noel.clone()));
    assert_eq!(*changes.borrow(), Some(noel));

    auth.sign_out().await.unwrap();
    assert_eq!(*changes.borrow(), None);
}

#[tokio::test]
async fn sign_out_failure_keeps_identity() {
    let noel = Identity::new("u1", "Noel");
    let auth = MemoryAuth::signed_in(noel.clone());
    auth.fail_sign_out(AuthError::Provider("network".into()));
    assert!(auth.sign_out().await.is_err());
    assert_eq!(*auth.identity_changes().borrow(), Some(noel));
}
