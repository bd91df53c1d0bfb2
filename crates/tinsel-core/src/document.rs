//! Wire codec between the model and store documents.
//!
//! Store documents are flat JSON field maps keyed by the field names below.
//! Decoding is lenient where the store is known to be eventually consistent
//! (a pending server timestamp decodes as `None`) and strict where a field
//! is required for rendering.
//!
//! Server-assigned timestamps are written as the [`server_timestamp`]
//! sentinel; the store replaces it with the commit time.

use crate::error::DecodeError;
use crate::id::{DocId, UserId};
use crate::model::{Identity, Ornament, OrnamentKind, Position, Timestamp, Tree};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};

/// A document's fields.
pub type Fields = Map<String, Value>;

pub const TREE_ID: &str = "tree_id";
pub const CREATOR_ID: &str = "creator_id";
pub const SENDER: &str = "sender";
pub const MESSAGE: &str = "message";
pub const ORNAMENT_TYPE: &str = "ornament_type";
pub const X: &str = "x";
pub const Y: &str = "y";
pub const CREATED_AT: &str = "created_at";
pub const OWNER_ID: &str = "owner_id";
pub const OWNER_NAME: &str = "owner_name";

/// A stored document: store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: DocId, fields: Fields) -> Self {
        Self { id, fields }
    }
}

// ─── Server timestamps ───────────────────────────────────────────────────

/// Placeholder the store swaps for its own commit time.
pub fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get(".sv"))
        .and_then(Value::as_str)
        == Some("timestamp")
}

pub fn timestamp_value(ts: Timestamp) -> Value {
    json!({ "seconds": ts.seconds, "nanos": ts.nanos })
}

/// Anything that is not a concrete timestamp (absent, null, or a pending
/// sentinel) reads as `None`.
fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

// ─── Encoding ────────────────────────────────────────────────────────────

/// Fields for a new tree, stamped with the creator as owner when signed in.
pub fn encode_new_tree(owner: Option<&Identity>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(CREATED_AT.into(), server_timestamp());
    if let Some(owner) = owner {
        fields.insert(OWNER_ID.into(), Value::from(owner.id.as_str()));
        fields.insert(
            OWNER_NAME.into(),
            owner
                .display_name
                .as_deref()
                .map_or(Value::Null, Value::from),
        );
    }
    fields
}

/// Everything the client supplies for a new ornament. The id and the
/// creation time come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrnament<'a> {
    pub tree_id: DocId,
    pub creator_id: Option<UserId>,
    pub sender: &'a str,
    pub message: &'a str,
    pub kind: OrnamentKind,
    pub position: Position,
}

pub fn encode_new_ornament(new: &NewOrnament<'_>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(TREE_ID.into(), Value::from(new.tree_id.as_str()));
    fields.insert(
        CREATOR_ID.into(),
        new.creator_id.map_or(Value::Null, |id| Value::from(id.as_str())),
    );
    fields.insert(SENDER.into(), Value::from(new.sender));
    fields.insert(MESSAGE.into(), Value::from(new.message));
    fields.insert(ORNAMENT_TYPE.into(), Value::from(new.kind.asset()));
    fields.insert(X.into(), Value::from(new.position.x));
    fields.insert(Y.into(), Value::from(new.position.y));
    fields.insert(CREATED_AT.into(), server_timestamp());
    fields
}

/// Partial update for a move: position only.
pub fn encode_move(position: Position) -> Fields {
    let mut fields = Fields::new();
    fields.insert(X.into(), Value::from(position.x));
    fields.insert(Y.into(), Value::from(position.y));
    fields
}

// ─── Decoding ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TreeFields {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<Timestamp>,
    #[serde(default)]
    owner_id: Option<UserId>,
    #[serde(default)]
    owner_name: Option<String>,
}

#[derive(Deserialize)]
struct OrnamentFields {
    tree_id: DocId,
    #[serde(default)]
    creator_id: Option<UserId>,
    sender: String,
    #[serde(default)]
    message: Option<String>,
    ornament_type: String,
    x: f64,
    y: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<Timestamp>,
}

fn malformed(id: DocId, err: serde_json::Error) -> DecodeError {
    DecodeError::Malformed {
        id,
        reason: err.to_string(),
    }
}

pub fn decode_tree(doc: &Document) -> Result<Tree, DecodeError> {
    let raw: TreeFields = serde_json::from_value(Value::Object(doc.fields.clone()))
        .map_err(|e| malformed(doc.id, e))?;
    Ok(Tree {
        id: doc.id,
        created_at: raw.created_at,
        owner_id: raw.owner_id,
        owner_name: raw.owner_name,
    })
}

pub fn decode_ornament(doc: &Document) -> Result<Ornament, DecodeError> {
    let raw: OrnamentFields = serde_json::from_value(Value::Object(doc.fields.clone()))
        .map_err(|e| malformed(doc.id, e))?;
    let kind = raw
        .ornament_type
        .parse::<OrnamentKind>()
        .map_err(|_| DecodeError::UnknownKind {
            id: doc.id,
            value: raw.ornament_type.clone(),
        })?;
    Ok(Ornament {
        id: doc.id,
        tree_id: raw.tree_id,
        creator_id: raw.creator_id,
        sender: raw.sender,
        message: raw.message.unwrap_or_default(),
        kind,
        position: Position::new(raw.x, raw.y),
        created_at: raw.created_at,
    })
}
