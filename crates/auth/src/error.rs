use thiserror::Error;

use malldir_infra::{AuthProviderError, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Provider(#[from] AuthProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("auth gate is not initialized")]
    NotInitialized,

    #[error("auth gate is already initialized")]
    AlreadyInitialized,

    #[error("auth gate stopped before the session change was applied")]
    Closed,
}
