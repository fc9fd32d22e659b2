use serde_json::{Value, json};

use super::RecordId;

/// A dynamically typed field value as exchanged with the remote stores.
///
/// Relational values arrive in several shapes: a many2one may be a bare id or
/// an `[id, label]` pair, a many2many is a list of ids. Values are normalized
/// into this enum at the store boundary so the rest of the pipeline never has
/// to inspect raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `null`, or a field the remote store reported as unset.
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// A reference to a single record by id.
    IdRef(RecordId),
    /// A reference to a single record together with its display label.
    LabeledIdRef(RecordId, String),
    /// References to several records, in order.
    IdList(Vec<RecordId>),
    /// Any other structured value, passed through untouched.
    Json(Value),
}

impl FieldValue {
    /// Returns true when the value carries nothing worth migrating or resolving.
    ///
    /// The remote stores report unset fields as `false`, so `Bool(false)` counts
    /// as empty here. Scalar passthrough does not consult this.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(b) => !b,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::IdList(ids) => ids.is_empty(),
            FieldValue::Json(v) => v.is_null() || v.as_array().is_some_and(|a| a.is_empty()),
            _ => false,
        }
    }

    /// Extracts the id of a single-record reference.
    ///
    /// Accepts a bare integer, an `IdRef` or an `[id, label]` pair.
    pub fn as_id(&self) -> Option<RecordId> {
        match self {
            FieldValue::Integer(id) | FieldValue::IdRef(id) | FieldValue::LabeledIdRef(id, _) => {
                Some(*id)
            }
            _ => None,
        }
    }

    /// Extracts every referenced id, for single and multi-record references alike.
    pub fn as_ids(&self) -> Vec<RecordId> {
        match self {
            FieldValue::IdList(ids) => ids.clone(),
            other => other.as_id().into_iter().collect(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FieldValue::IdList(_))
    }

    /// Reduces relational representations to their bare id, leaving scalars alone.
    ///
    /// Used when a relational value takes part in an equality predicate.
    pub fn to_bare(&self) -> FieldValue {
        match self {
            FieldValue::IdRef(id) | FieldValue::LabeledIdRef(id, _) => FieldValue::Integer(*id),
            other => other.clone(),
        }
    }

    /// Normalizes a raw JSON value read from a remote store.
    pub fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => {
                if let [Value::Number(id), Value::String(label)] = items.as_slice() {
                    if let Some(id) = id.as_i64() {
                        return FieldValue::LabeledIdRef(id, label.clone());
                    }
                }
                let ids: Option<Vec<RecordId>> = items.iter().map(Value::as_i64).collect();
                match ids {
                    Some(ids) => FieldValue::IdList(ids),
                    None => FieldValue::Json(value.clone()),
                }
            }
            Value::Object(_) => FieldValue::Json(value.clone()),
        }
    }

    /// Plain JSON rendering, with references reduced to their ids.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => json!(b),
            FieldValue::Integer(i) => json!(i),
            FieldValue::Float(f) => json!(f),
            FieldValue::Text(s) => json!(s),
            FieldValue::IdRef(id) | FieldValue::LabeledIdRef(id, _) => json!(id),
            FieldValue::IdList(ids) => json!(ids),
            FieldValue::Json(v) => v.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}
