//! Entity traits: identity, schema and the stored record shape.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainResult;
use crate::id::DocumentId;

/// Field holding the store-assigned creation timestamp.
pub const CREATED_AT: &str = "createdAt";

/// Field holding the store-assigned last-update timestamp.
pub const UPDATED_AT: &str = "updatedAt";

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Schema of one kind of directory document (shop, offer, category, floor).
///
/// The associated constants describe where the kind lives and how its audit
/// entries are worded, so a single generic service can serve every kind.
pub trait EntityKind:
    Serialize + DeserializeOwned + Clone + PartialEq + core::fmt::Debug + Send + Sync + 'static
{
    /// Partial-update shape: the schema's fields, all optional.
    type Patch: Serialize + Clone + core::fmt::Debug + Send + Sync;

    /// Store collection name.
    const COLLECTION: &'static str;
    /// Name of the service reported as the audit `module`.
    const MODULE: &'static str;
    /// Singular label used in audit actions ("Shop").
    const LABEL: &'static str;
    /// Plural label used in audit actions ("Shops").
    const PLURAL: &'static str;
    /// Audit detail key carrying the record id ("shopId").
    const ID_FIELD: &'static str;
    /// Audit detail key carrying the submitted data ("shopData").
    const DATA_FIELD: &'static str;
    /// Whether the kind carries `updatedAt`.
    const TRACKS_UPDATES: bool = true;
    /// Field the listing is sorted by (ascending), if any.
    const ORDER_BY: Option<&'static str> = None;

    /// Input checks for forms. The storage layer never calls this.
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }
}

/// A stored entity with its store-assigned metadata attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<E> {
    pub id: DocumentId,
    #[serde(flatten)]
    pub data: E,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl<E: DeserializeOwned> Record<E> {
    /// Decode a raw document body into a typed record.
    ///
    /// Timestamp fields are lifted out before the schema is decoded; unknown
    /// fields are ignored.
    pub fn from_fields(id: DocumentId, mut fields: Map<String, Value>) -> serde_json::Result<Self> {
        let created_at = take_timestamp(&mut fields, CREATED_AT)?;
        let updated_at = take_timestamp(&mut fields, UPDATED_AT)?;
        let data = serde_json::from_value(Value::Object(fields))?;
        Ok(Self {
            id,
            data,
            created_at,
            updated_at,
        })
    }
}

impl<E> Entity for Record<E> {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn take_timestamp(
    fields: &mut Map<String, Value>,
    key: &str,
) -> serde_json::Result<Option<DateTime<Utc>>> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v).map(Some),
    }
}
