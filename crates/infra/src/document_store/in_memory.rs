use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use malldir_core::DocumentId;

use super::query::Query;
use super::r#trait::{Document, DocumentStore, DocumentWrite, Fields, StoreError};
use crate::clock::{Clock, SystemClock};

/// In-memory document store.
///
/// Intended for tests/dev. Collections keep insertion order, which is the
/// natural order returned by unordered queries. Individual collections can be
/// taken offline to exercise failure paths.
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    outages: RwLock<HashMap<String, String>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("collections", &self.collections)
            .field("outages", &self.outages)
            .finish_non_exhaustive()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            outages: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make every operation on `collection` fail with `StoreError::Unavailable`.
    pub fn fail_collection(&self, collection: impl Into<String>, reason: impl Into<String>) {
        if let Ok(mut outages) = self.outages.write() {
            outages.insert(collection.into(), reason.into());
        }
    }

    /// Bring `collection` back after `fail_collection`.
    pub fn restore_collection(&self, collection: &str) {
        if let Ok(mut outages) = self.outages.write() {
            outages.remove(collection);
        }
    }

    /// Snapshot of a collection in natural order (bypasses outages).
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).cloned())
            .unwrap_or_default()
    }

    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        let outages = self.outages.read().map_err(|_| StoreError::Poisoned)?;
        match outages.get(collection) {
            Some(reason) => Err(StoreError::Unavailable {
                collection: collection.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Resolve server timestamps against a single commit instant.
    fn materialize(&self, write: DocumentWrite) -> Result<Fields, StoreError> {
        let DocumentWrite {
            mut fields,
            server_timestamps,
        } = write;
        if server_timestamps.is_empty() {
            return Ok(fields);
        }
        let now = serde_json::to_value(self.clock.now())
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        for field in server_timestamps {
            fields.insert(field, now.clone());
        }
        Ok(fields)
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        self.check_available(collection)?;
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| &d.id == id))
            .cloned())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check_available(collection)?;
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.matches(&d.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut docs);
        Ok(docs)
    }

    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError> {
        self.check_available(collection)?;
        let fields = self.materialize(write)?;
        let id = DocumentId::new(Uuid::now_v7().simple().to_string());

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });

        tracing::trace!(collection, %id, "document added");
        Ok(id)
    }

    async fn set(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        self.check_available(collection)?;
        let fields = self.materialize(write)?;

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| &d.id == id) {
            Some(existing) => existing.fields = fields,
            None => docs.push(Document {
                id: id.clone(),
                fields,
            }),
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        self.check_available(collection)?;
        let patch = self.materialize(write)?;

        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| &d.id == id))
            .ok_or_else(|| StoreError::MissingDocument {
                collection: collection.to_string(),
                id: id.clone(),
            })?;

        for (key, value) in patch {
            existing.fields.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        self.check_available(collection)?;
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|d| &d.id != id);
        }
        Ok(())
    }
}
