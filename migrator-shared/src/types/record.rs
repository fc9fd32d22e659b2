use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{FieldValue, RecordId};

/// Name of the identifier field every remote record carries.
pub const ID_FIELD: &str = "id";

/// An ordered mapping from field name to value, as read from or written to a
/// remote store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// The record's identifier, if the projection included it.
    pub fn id(&self) -> Option<RecordId> {
        self.fields.get(ID_FIELD).and_then(FieldValue::as_id)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Restricts the record to the given fields, keeping `id` when present.
    pub fn project(&self, fields: &[String]) -> Record {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| name.as_str() == ID_FIELD || fields.iter().any(|f| f == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Record { fields }
    }

    /// Builds a record from a JSON object returned by a remote store.
    ///
    /// Non-object values yield an empty record.
    pub fn from_json(value: &Value) -> Record {
        let fields = value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(name, value)| (name.clone(), FieldValue::from_json(value)))
                    .collect()
            })
            .unwrap_or_default();
        Record { fields }
    }

    /// Plain JSON object rendering of the record.
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(object)
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_field_order_and_id() {
        let record = Record::from_json(&json!({
            "id": 5,
            "name": "Acme",
            "country_id": [10, "France"],
        }));

        assert_eq!(record.id(), Some(5));
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "name", "country_id"]);
        assert_eq!(
            record.get("country_id"),
            Some(&FieldValue::LabeledIdRef(10, "France".to_string()))
        );
    }

    #[test]
    fn test_project_keeps_id() {
        let record = Record::new().with("id", 1).with("code", "FR").with("name", "France");
        let projected = record.project(&["code".to_string()]);

        assert_eq!(projected.len(), 2);
        assert_eq!(projected.id(), Some(1));
        assert!(projected.contains("code"));
        assert!(!projected.contains("name"));
    }
}
