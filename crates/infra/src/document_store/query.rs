//! Query model: conjunctive equality filters plus an optional ordering.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::r#trait::{Document, Fields};

/// `field == value` match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Listing request. An empty query returns the whole collection in the
/// store's natural order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// True when every filter matches `fields`.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|f| {
            fields
                .get(&f.field)
                .is_some_and(|v| values_equal(v, &f.value))
        })
    }

    /// Sort `docs` by the ordering field (stable; documents lacking the field
    /// sort first).
    pub fn sort(&self, docs: &mut [Document]) {
        let Some(order) = &self.order_by else {
            return;
        };
        docs.sort_by(|a, b| {
            let ord = compare_values(a.fields.get(&order.field), b.fields.get(&order.field));
            match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order across JSON values: null < bool < number < string < array < object.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(Some(l), Some(r));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use malldir_core::DocumentId;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("fixture must be an object")
        };
        Document {
            id: DocumentId::new(id),
            fields,
        }
    }

    #[test]
    fn filters_are_conjunctive() {
        let q = Query::new()
            .where_eq("category", "electronics")
            .where_eq("floor", "1");

        assert!(q.matches(&doc("a", json!({"category": "electronics", "floor": "1"})).fields));
        assert!(!q.matches(&doc("b", json!({"category": "electronics", "floor": "2"})).fields));
        assert!(!q.matches(&doc("c", json!({"category": "electronics"})).fields));
    }

    #[test]
    fn numeric_filters_ignore_integer_float_representation() {
        let q = Query::new().where_eq("number", 2);
        assert!(q.matches(&doc("a", json!({"number": 2.0})).fields));
    }

    #[test]
    fn sort_orders_numbers_and_puts_missing_fields_first() {
        let q = Query::new().order_by("number", Direction::Ascending);
        let mut docs = vec![
            doc("two", json!({"number": 2})),
            doc("basement", json!({"number": -1})),
            doc("unknown", json!({})),
            doc("ground", json!({"number": 0})),
        ];
        q.sort(&mut docs);

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["unknown", "basement", "ground", "two"]);
    }

    #[test]
    fn descending_reverses_string_order() {
        let q = Query::new().order_by("name", Direction::Descending);
        let mut docs = vec![
            doc("a", json!({"name": "Books"})),
            doc("b", json!({"name": "Fashion"})),
            doc("c", json!({"name": "Cafes"})),
        ];
        q.sort(&mut docs);

        let names: Vec<_> = docs.iter().map(|d| d.fields["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Fashion", "Cafes", "Books"]);
    }
}
