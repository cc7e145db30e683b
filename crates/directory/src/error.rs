use thiserror::Error;

use malldir_core::DocumentId;
use malldir_infra::StoreError;

/// Failure of a directory service call.
///
/// Input validation is not part of this taxonomy: forms check input with
/// `EntityKind::validate` before calling a service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The requested record does not exist (single-record reads only).
    #[error("{label} not found")]
    NotFound { label: &'static str, id: DocumentId },

    /// Any store failure: availability, permission, missing update target.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored document no longer matches its schema.
    #[error("cannot decode {collection}/{id}: {reason}")]
    Decode {
        collection: &'static str,
        id: DocumentId,
        reason: String,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}
