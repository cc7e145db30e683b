use serde_json::Value;

use malldir_infra::{DocumentStore, DocumentWrite, Query, StoreError};

use crate::actor::ActorContext;
use crate::entry::{LogContext, LogEntry, LogLevel};

/// Collection audit entries are appended to unless configured otherwise.
pub const DEFAULT_LOG_COLLECTION: &str = "logs";

/// Best-effort audit logger.
///
/// `log` always emits a `tracing` event, then appends a `LogEntry` to the
/// store. The append is awaited so entries land before the triggering
/// operation returns, but its failure is only traced: callers never see it.
#[derive(Debug, Clone)]
pub struct AuditLogger<S> {
    store: S,
    actor: ActorContext,
    context: LogContext,
    collection: String,
}

impl<S> AuditLogger<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, actor: ActorContext) -> Self {
        Self {
            store,
            actor,
            context: LogContext::default(),
            collection: DEFAULT_LOG_COLLECTION.to_string(),
        }
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Actor that the next entry will be attributed to.
    pub fn actor_id(&self) -> String {
        self.actor.actor_id()
    }

    pub async fn log(&self, action: &str, module: &str, details: Value, level: LogLevel) {
        // Read at log time so sign-in/out transitions are reflected immediately.
        let user_id = self.actor.actor_id();

        match level {
            LogLevel::Info => {
                tracing::info!(module, action, actor = %user_id, details = %details, "[{module}] {action}")
            }
            LogLevel::Warning => {
                tracing::warn!(module, action, actor = %user_id, details = %details, "[{module}] {action}")
            }
            LogLevel::Error => {
                tracing::error!(module, action, actor = %user_id, details = %details, "[{module}] {action}")
            }
        }

        let entry = LogEntry {
            action: action.to_string(),
            module: module.to_string(),
            details,
            level,
            user_id,
            timestamp: None,
            context: self.context.clone(),
        };

        if let Err(err) = self.append(&entry).await {
            tracing::warn!(
                collection = %self.collection,
                error = %err,
                "failed to persist audit entry for [{module}] {action}"
            );
        }
    }

    pub async fn info(&self, action: &str, module: &str, details: Value) {
        self.log(action, module, details, LogLevel::Info).await;
    }

    pub async fn warning(&self, action: &str, module: &str, details: Value) {
        self.log(action, module, details, LogLevel::Warning).await;
    }

    pub async fn error(&self, action: &str, module: &str, details: Value) {
        self.log(action, module, details, LogLevel::Error).await;
    }

    /// Read the audit trail back in commit order.
    ///
    /// Documents that do not decode as entries are skipped.
    pub async fn entries(&self) -> Result<Vec<LogEntry>, StoreError> {
        let docs = self.store.query(&self.collection, &Query::new()).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                match serde_json::from_value::<LogEntry>(Value::Object(doc.fields)) {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        tracing::debug!(id = %doc.id, error = %err, "skipping malformed audit entry");
                        None
                    }
                }
            })
            .collect())
    }

    async fn append(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let write = DocumentWrite::from_serializable(entry)?.with_server_timestamp("timestamp");
        self.store.add(&self.collection, write).await?;
        Ok(())
    }
}
