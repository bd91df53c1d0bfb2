//! Integration tests: raw store documents → ordered, permission-checked
//! ornaments.
//!
//! Exercises decode, ordering, and the permission engine together, the way
//! a subscription snapshot flows through them.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tinsel_core::document::{self, Document};
use tinsel_core::*;

fn doc(id: &str, value: Value) -> Document {
    let Value::Object(fields) = value else {
        panic!("fixture must be an object");
    };
    Document::new(DocId::intern(id), fields)
}

fn snapshot() -> Vec<Document> {
    vec![
        doc(
            "late",
            json!({
                "tree_id": "t1",
                "creator_id": "u2",
                "sender": "Ivy",
                "message": "Ho ho ho",
                "ornament_type": "Ornament1.png",
                "x": 10, "y": 20,
                "created_at": { "seconds": 1_700_000_300, "nanos": 5 },
            }),
        ),
        doc(
            "saving",
            json!({
                "tree_id": "t1",
                "creator_id": null,
                "sender": "Hal",
                "ornament_type": "Ornanent7.png",
                "x": 50, "y": 50,
                "created_at": { ".sv": "timestamp" },
            }),
        ),
        doc(
            "early",
            json!({
                "tree_id": "t1",
                "sender": "Ann",
                "message": "",
                "ornament_type": "Ornament8.png",
                "x": 99.5, "y": 0,
                "created_at": { "seconds": 1_700_000_100 },
            }),
        ),
        doc(
            "first",
            json!({
                "tree_id": "t1",
                "sender": "Bo",
                "ornament_type": "Ornament2.png",
                "x": 1, "y": 1,
                "created_at": { "seconds": 1_700_000_000 },
            }),
        ),
    ]
}

fn decode_all(docs: &[Document]) -> Vec<Ornament> {
    docs.iter()
        .map(|d| document::decode_ornament(d).unwrap())
        .collect()
}

// ─── Ordering ───────────────────────────────────────────────────────────

#[test]
fn pending_ornament_splits_the_ordering() {
    let mut ornaments = decode_all(&snapshot());
    order_snapshot(&mut ornaments);

    let ids: Vec<&str> = ornaments.iter().map(|o| o.id.as_str()).collect();
    // "saving" holds its slot; each side is sorted on its own.
    assert_eq!(ids, vec!["late", "saving", "first", "early"]);
    assert!(ornaments[1].is_pending());
}

#[test]
fn committed_snapshot_is_fully_chronological() {
    let mut docs = snapshot();
    docs[1].fields.insert(
        document::CREATED_AT.into(),
        document::timestamp_value(Timestamp::new(1_700_000_200, 0)),
    );
    let mut ornaments = decode_all(&docs);
    order_snapshot(&mut ornaments);

    let ids: Vec<&str> = ornaments.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "early", "saving", "late"]);
}

#[test]
fn unknown_kind_is_reported_with_its_value() {
    let bad = doc(
        "odd",
        json!({
            "tree_id": "t1",
            "sender": "Ann",
            "ornament_type": "Star.png",
            "x": 0, "y": 0,
        }),
    );
    assert_eq!(
        document::decode_ornament(&bad),
        Err(DecodeError::UnknownKind {
            id: DocId::intern("odd"),
            value: "Star.png".into(),
        })
    );
}

// ─── Decoded fields feed permissions ────────────────────────────────────

#[test]
fn creator_and_owner_may_delete_decoded_ornament() {
    let ornaments = decode_all(&snapshot());
    let late = &ornaments[0];
    let owner = Some(UserId::intern("u1"));

    let creator = Identity::new("u2", "Ivy");
    let tree_owner = Identity::new("u1", "Noel");
    let stranger = Identity::new("u3", "Hal");

    assert!(can_delete(Some(&creator), owner, Some(late)));
    assert!(can_delete(Some(&tree_owner), owner, Some(late)));
    assert!(!can_delete(Some(&stranger), owner, Some(late)));
    assert!(!can_delete(None, owner, Some(late)));

    // Anonymous placements are deletable by the owner alone.
    let saving = &ornaments[1];
    assert_eq!(saving.creator_id, None);
    assert!(!can_delete(Some(&stranger), owner, Some(saving)));
    assert!(can_delete(Some(&tree_owner), owner, Some(saving)));
}

#[test]
fn dropped_pointer_round_trips_through_move_encoding() {
    let zone = DropZone::new(100.0, 50.0, 400.0, 200.0);
    let position = map_pointer(Point::new(200.0, 100.0), &zone, true).unwrap();
    let fields = document::encode_move(position);

    let mut moved = snapshot().remove(0);
    moved.fields.extend(fields);
    let ornament = document::decode_ornament(&moved).unwrap();
    assert_eq!(ornament.position, Position::new(25.0, 25.0));
}
