use serde::{Deserialize, Serialize};

use malldir_core::{DomainError, DomainResult, EntityKind};

/// Shop category. Categories carry no `updatedAt` and list by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl EntityKind for Category {
    type Patch = CategoryPatch;

    const COLLECTION: &'static str = "categories";
    const MODULE: &'static str = "CategoryService";
    const LABEL: &'static str = "Category";
    const PLURAL: &'static str = "Categories";
    const ID_FIELD: &'static str = "categoryId";
    const DATA_FIELD: &'static str = "categoryData";
    const TRACKS_UPDATES: bool = false;
    const ORDER_BY: Option<&'static str> = Some("name");

    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("category name is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        assert!(Category::new("Fashion").validate().is_ok());
        assert!(Category::new(" ").validate().is_err());
    }
}
