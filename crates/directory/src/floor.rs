use serde::{Deserialize, Serialize};

use malldir_core::{DomainError, DomainResult, EntityKind};

/// A mall level. Floors carry no `updatedAt` and list by number, so
/// basements (negative numbers) come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub number: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Floor {
    pub fn new(number: i64, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EntityKind for Floor {
    type Patch = FloorPatch;

    const COLLECTION: &'static str = "floors";
    const MODULE: &'static str = "FloorService";
    const LABEL: &'static str = "Floor";
    const PLURAL: &'static str = "Floors";
    const ID_FIELD: &'static str = "floorId";
    const DATA_FIELD: &'static str = "floorData";
    const TRACKS_UPDATES: bool = false;
    const ORDER_BY: Option<&'static str> = Some("number");

    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("floor name is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required_and_basements_are_allowed() {
        assert!(Floor::new(-2, "Parking").validate().is_ok());
        assert!(Floor::new(3, "").validate().is_err());
    }
}
