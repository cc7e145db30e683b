use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use malldir_core::IdentityId;

/// Raw identity as reported by the provider (no role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: IdentityId,
    pub email: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthProviderError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already in use: {0}")]
    EmailInUse(String),

    #[error("password must be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Credential + session authority.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account without signing it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError>;

    /// Start a session for an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError>;

    /// End the current session (no-op when signed out).
    async fn sign_out(&self) -> Result<(), AuthProviderError>;

    /// Session notifications.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}

#[async_trait::async_trait]
impl<P> AuthProvider for Arc<P>
where
    P: AuthProvider + ?Sized,
{
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError> {
        (**self).create_account(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError> {
        (**self).sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        (**self).sign_out().await
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        (**self).subscribe()
    }
}
