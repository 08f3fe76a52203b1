//! Documents and list queries.

use std::cmp::Ordering;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Document body: a JSON object.
pub type Fields = Map<String, Value>;

/// Length of generated document ids.
pub const AUTO_ID_LEN: usize = 20;

/// A stored document.
///
/// Serializes flattened as `{"id": ..., ...data}`. A field named `id` inside
/// `data` is dropped from the output in favour of the real id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    #[must_use]
    pub const fn new(id: String, data: Fields) -> Self {
        Self { id, data }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// String value of `field`, if it holds one.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self.data.keys().filter(|k| k.as_str() != "id").count();
        let mut map = serializer.serialize_map(Some(extra + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.data {
            if key != "id" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Generate a random alphanumeric document id.
#[must_use]
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// Ordering and limit for a collection listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl ListQuery {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply this query to documents already sorted by id.
    ///
    /// With an ordering field, documents lacking the field are dropped. Ties
    /// keep id order.
    #[must_use]
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if let Some(order) = &self.order_by {
            docs.retain(|d| d.data.contains_key(&order.field));
            docs.sort_by(|a, b| {
                let ord = compare_values(&a.data[&order.field], &b.data[&order.field]);
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

const fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values used for `order_by`.
///
/// Values of different types order null < bool < number < string < array <
/// object. Arrays and objects compare equal among themselves.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
