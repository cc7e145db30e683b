//! Listing filters.
//!
//! A filter is a conjunction of `field == value` conditions. Absent or empty
//! criteria add no condition, so an empty filter lists the whole collection.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use malldir_core::DocumentId;
use malldir_infra::{Direction, Query};

/// Generic equality filter, serialized as `{field: value}` in audit details.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ListFilter(BTreeMap<String, Value>);

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field == value`. Null values and empty strings are ignored.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let blank = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if !blank {
            self.0.insert(field.into(), value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Store query for this filter, optionally ordered ascending by `order_by`.
    pub fn to_query(&self, order_by: Option<&str>) -> Query {
        let query = self
            .0
            .iter()
            .fold(Query::new(), |q, (field, value)| q.where_eq(field.clone(), value.clone()));
        match order_by {
            Some(field) => query.order_by(field, Direction::Ascending),
            None => query,
        }
    }
}

/// Shop listing criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopFilter {
    pub category: Option<String>,
    pub floor: Option<String>,
}

impl ShopFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn floor(mut self, floor: impl Into<String>) -> Self {
        self.floor = Some(floor.into());
        self
    }
}

impl From<ShopFilter> for ListFilter {
    fn from(f: ShopFilter) -> Self {
        let mut out = ListFilter::new();
        if let Some(category) = f.category {
            out = out.eq("category", category);
        }
        if let Some(floor) = f.floor {
            out = out.eq("floor", floor);
        }
        out
    }
}

/// Offer listing criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferFilter {
    pub shop_id: Option<DocumentId>,
}

impl OfferFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shop(mut self, shop_id: DocumentId) -> Self {
        self.shop_id = Some(shop_id);
        self
    }
}

impl From<OfferFilter> for ListFilter {
    fn from(f: OfferFilter) -> Self {
        match f.shop_id {
            Some(id) => ListFilter::new().eq("shopId", id.into_inner()),
            None => ListFilter::new(),
        }
    }
}
