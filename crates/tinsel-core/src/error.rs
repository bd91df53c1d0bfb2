use crate::id::DocId;

/// A stored document could not be read as a tree or ornament.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("document {id}: {reason}")]
    Malformed { id: DocId, reason: String },

    #[error("document {id}: unknown ornament type '{value}'")]
    UnknownKind { id: DocId, value: String },
}

/// A location path that does not name a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a tree route: '{0}'")]
pub struct RouteError(pub String);
