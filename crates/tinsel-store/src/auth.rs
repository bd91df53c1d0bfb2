//! The authentication provider interface.

use async_trait::async_trait;
use tinsel_core::model::Identity;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The user closed the sign-in flow.
    #[error("sign-in cancelled")]
    Cancelled,

    #[error("{0}")]
    Provider(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Identity feed. The receiver's current value is the identity right
    /// now; it changes on every sign-in and sign-out.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;

    async fn sign_in(&self) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}
