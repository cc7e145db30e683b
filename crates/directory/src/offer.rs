//! Offer schema: a promotion attached to a shop.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use malldir_core::{DocumentId, DomainError, DomainResult, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Owning shop. Not checked against the shops collection.
    pub shop_id: DocumentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Offer {
    pub fn new(shop_id: DocumentId, title: impl Into<String>) -> Self {
        Self {
            shop_id,
            title: title.into(),
            description: None,
            discount_percent: None,
            valid_from: None,
            valid_until: None,
            image_url: None,
        }
    }

    /// Whether `day` falls inside the validity window. Open ends are unbounded.
    pub fn is_running_on(&self, day: NaiveDate) -> bool {
        self.valid_from.is_none_or(|from| from <= day)
            && self.valid_until.is_none_or(|until| day <= until)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EntityKind for Offer {
    type Patch = OfferPatch;

    const COLLECTION: &'static str = "offers";
    const MODULE: &'static str = "OfferService";
    const LABEL: &'static str = "Offer";
    const PLURAL: &'static str = "Offers";
    const ID_FIELD: &'static str = "offerId";
    const DATA_FIELD: &'static str = "offerData";

    fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("offer title is required"));
        }
        if let Some(pct) = self.discount_percent.filter(|pct| *pct > 100) {
            return Err(DomainError::validation(format!(
                "discount must be at most 100%, got {pct}%"
            )));
        }
        if let (Some(from), Some(until)) = (self.valid_from, self.valid_until) {
            if from > until {
                return Err(DomainError::validation(format!(
                    "offer ends ({until}) before it starts ({from})"
                )));
            }
        }
        Ok(())
    }
}
