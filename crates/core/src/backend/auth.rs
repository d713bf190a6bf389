use async_trait::async_trait;

use crate::errors::CoreError;

/// Opaque user identity returned by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable unique id, used to scope per-user documents.
    pub id: String,
    pub email: String,
}

/// Email/password authentication capability, consumed as-is from the
/// external provider. Token and session management live behind this trait;
/// the core only ever sees the resulting user identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, CoreError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, CoreError>;

    async fn sign_out(&self) -> Result<(), CoreError>;

    /// The currently authenticated user, if any.
    async fn current_user(&self) -> Option<AuthUser>;
}
