use tinsel_store::{AuthError, StoreError};

/// Failure of a UI action. Validation and permission no-ops are not
/// errors; they come back as outcomes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("clipboard: {0}")]
    Clipboard(String),
}
