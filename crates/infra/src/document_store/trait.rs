use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use malldir_core::DocumentId;

use super::query::Query;

/// Body of a stored document.
pub type Fields = Map<String, Value>;

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

/// A write request: literal fields plus fields the store stamps with its own
/// clock at commit time.
///
/// All server timestamps of one write resolve to the same instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    pub fields: Fields,
    pub server_timestamps: Vec<String>,
}

impl DocumentWrite {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Build a write from any value that serializes to a JSON object.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, StoreError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => Ok(Self::new(fields)),
            Ok(other) => Err(StoreError::InvalidDocument(format!(
                "expected an object, got {other}"
            ))),
            Err(e) => Err(StoreError::InvalidDocument(e.to_string())),
        }
    }

    /// Ask the store to stamp `field` with its commit time.
    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }
}

/// Document store operation error.
///
/// These are collaborator failures (availability, permission, missing target)
/// as opposed to domain errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("collection '{collection}' unavailable: {reason}")]
    Unavailable { collection: String, reason: String },

    #[error("no document to update: {collection}/{id}")]
    MissingDocument { collection: String, id: DocumentId },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Async, collection-based document store.
///
/// Implementations must:
/// - assign ids on `add` and never change them afterwards
/// - resolve `DocumentWrite::server_timestamps` from their own clock
/// - apply `update` as a top-level merge, failing with
///   `StoreError::MissingDocument` when the target does not exist
/// - make every single-document write atomic
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Equality-filtered, optionally ordered listing.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Insert a new document and return its assigned id.
    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError>;

    /// Create or fully replace the document at `id`.
    async fn set(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError>;

    /// Merge `write` into the existing document at `id`.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError>;

    /// Remove the document at `id`. Removing an absent document succeeds.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        (**self).query(collection, query).await
    }

    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError> {
        (**self).add(collection, write).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        (**self).set(collection, id, write).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        (**self).update(collection, id, write).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        (**self).delete(collection, id).await
    }
}
