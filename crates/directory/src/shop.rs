//! Shop schema.

use serde::{Deserialize, Serialize};

use malldir_core::{DomainError, DomainResult, EntityKind};

/// A store unit in the mall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub name: String,
    /// Category name (not an id; the directory filters on the name).
    pub category: String,
    /// Floor label as shown to visitors ("1", "G", "B1").
    pub floor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
}

impl Shop {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        floor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            floor: floor.into(),
            description: None,
            phone: None,
            website: None,
            logo_url: None,
            opening_hours: None,
        }
    }
}

/// Partial shop update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
}

impl EntityKind for Shop {
    type Patch = ShopPatch;

    const COLLECTION: &'static str = "shops";
    const MODULE: &'static str = "ShopService";
    const LABEL: &'static str = "Shop";
    const PLURAL: &'static str = "Shops";
    const ID_FIELD: &'static str = "shopId";
    const DATA_FIELD: &'static str = "shopData";

    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("shop name is required"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("shop category is required"));
        }
        if self.floor.trim().is_empty() {
            return Err(DomainError::validation("shop floor is required"));
        }
        Ok(())
    }
}
