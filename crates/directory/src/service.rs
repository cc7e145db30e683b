//! Generic CRUD service over one entity kind.

use core::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value, json};

use malldir_audit::AuditLogger;
use malldir_core::{CREATED_AT, DocumentId, EntityKind, Record, UPDATED_AT};
use malldir_infra::{Document, DocumentStore, DocumentWrite};

use crate::error::ServiceError;
use crate::filter::ListFilter;

/// List/get/create/update/delete for entity kind `E`.
///
/// Each operation makes exactly one store call and then records exactly one
/// audit entry: `info` on success, `error` on failure. Failures are returned
/// unchanged after logging; there are no retries.
pub struct EntityService<E, S> {
    store: S,
    logger: AuditLogger<S>,
    _kind: PhantomData<fn() -> E>,
}

impl<E, S: Clone> Clone for EntityService<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            logger: self.logger.clone(),
            _kind: PhantomData,
        }
    }
}

impl<E: EntityKind, S> core::fmt::Debug for EntityService<E, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntityService")
            .field("collection", &E::COLLECTION)
            .finish_non_exhaustive()
    }
}

impl<E, S> EntityService<E, S>
where
    E: EntityKind,
    S: DocumentStore,
{
    pub fn new(store: S, logger: AuditLogger<S>) -> Self {
        Self {
            store,
            logger,
            _kind: PhantomData,
        }
    }

    pub async fn list(&self, filter: impl Into<ListFilter>) -> Result<Vec<Record<E>>, ServiceError> {
        let filter = filter.into();
        match self.fetch_all(&filter).await {
            Ok(records) => {
                let details = json!({ "count": records.len(), "filters": filter });
                self.logger
                    .info(&format!("{} retrieved", E::PLURAL), E::MODULE, details)
                    .await;
                Ok(records)
            }
            Err(err) => {
                let action = format!("Failed to get {}", E::PLURAL.to_lowercase());
                self.logger
                    .error(&action, E::MODULE, json!({ "error": err.to_string() }))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: &DocumentId) -> Result<Record<E>, ServiceError> {
        match self.fetch_one(id).await {
            Ok(record) => {
                self.logger
                    .info(&format!("{} retrieved", E::LABEL), E::MODULE, id_details::<E>(id))
                    .await;
                Ok(record)
            }
            Err(err) => {
                self.log_failure("get", failure_details::<E>(Some(id), &err)).await;
                Err(err)
            }
        }
    }

    /// Persist `data` as a new record and return its store-assigned id.
    pub async fn create(&self, data: &E) -> Result<DocumentId, ServiceError> {
        match self.insert(data).await {
            Ok(id) => {
                let details = data_details::<E, _>(&id, data);
                self.logger
                    .info(&format!("{} created", E::LABEL), E::MODULE, details)
                    .await;
                Ok(id)
            }
            Err(err) => {
                self.log_failure("create", failure_details::<E>(None, &err)).await;
                Err(err)
            }
        }
    }

    /// Merge `patch` over the stored record. Fails if `id` does not exist.
    pub async fn update(&self, id: &DocumentId, patch: &E::Patch) -> Result<(), ServiceError> {
        match self.merge(id, patch).await {
            Ok(()) => {
                let details = data_details::<E, _>(id, patch);
                self.logger
                    .info(&format!("{} updated", E::LABEL), E::MODULE, details)
                    .await;
                Ok(())
            }
            Err(err) => {
                self.log_failure("update", failure_details::<E>(Some(id), &err)).await;
                Err(err)
            }
        }
    }

    /// Remove the record. Deleting an absent id succeeds.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), ServiceError> {
        match self.store.delete(E::COLLECTION, id).await {
            Ok(()) => {
                self.logger
                    .info(&format!("{} deleted", E::LABEL), E::MODULE, id_details::<E>(id))
                    .await;
                Ok(())
            }
            Err(err) => {
                let err = ServiceError::from(err);
                self.log_failure("delete", failure_details::<E>(Some(id), &err)).await;
                Err(err)
            }
        }
    }

    async fn fetch_all(&self, filter: &ListFilter) -> Result<Vec<Record<E>>, ServiceError> {
        let query = filter.to_query(E::ORDER_BY);
        let docs = self.store.query(E::COLLECTION, &query).await?;
        docs.into_iter().map(decode::<E>).collect()
    }

    async fn fetch_one(&self, id: &DocumentId) -> Result<Record<E>, ServiceError> {
        match self.store.get(E::COLLECTION, id).await? {
            Some(doc) => decode(doc),
            None => Err(ServiceError::NotFound {
                label: E::LABEL,
                id: id.clone(),
            }),
        }
    }

    async fn insert(&self, data: &E) -> Result<DocumentId, ServiceError> {
        let mut write = DocumentWrite::from_serializable(data)?.with_server_timestamp(CREATED_AT);
        if E::TRACKS_UPDATES {
            write = write.with_server_timestamp(UPDATED_AT);
        }
        Ok(self.store.add(E::COLLECTION, write).await?)
    }

    async fn merge(&self, id: &DocumentId, patch: &E::Patch) -> Result<(), ServiceError> {
        let mut write = DocumentWrite::from_serializable(patch)?;
        if E::TRACKS_UPDATES {
            write = write.with_server_timestamp(UPDATED_AT);
        }
        self.store.update(E::COLLECTION, id, write).await?;
        Ok(())
    }

    async fn log_failure(&self, verb: &str, details: Value) {
        let action = format!("Failed to {verb} {}", E::LABEL.to_lowercase());
        self.logger.error(&action, E::MODULE, details).await;
    }
}

fn decode<E: EntityKind>(doc: Document) -> Result<Record<E>, ServiceError> {
    let id = doc.id;
    Record::from_fields(id.clone(), doc.fields).map_err(|e| ServiceError::Decode {
        collection: E::COLLECTION,
        id,
        reason: e.to_string(),
    })
}

fn id_details<E: EntityKind>(id: &DocumentId) -> Value {
    let mut details = Map::new();
    details.insert(E::ID_FIELD.to_string(), json!(id));
    Value::Object(details)
}

fn data_details<E: EntityKind, T: Serialize>(id: &DocumentId, data: &T) -> Value {
    let mut details = Map::new();
    details.insert(E::ID_FIELD.to_string(), json!(id));
    details.insert(E::DATA_FIELD.to_string(), json!(data));
    Value::Object(details)
}

fn failure_details<E: EntityKind>(id: Option<&DocumentId>, err: &ServiceError) -> Value {
    let mut details = Map::new();
    if let Some(id) = id {
        details.insert(E::ID_FIELD.to_string(), json!(id));
    }
    details.insert("error".to_string(), json!(err.to_string()));
    Value::Object(details)
}
