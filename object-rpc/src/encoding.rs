//! Conversion between the shared value types and the JSON-RPC wire format.
use migrator_shared::types::{Domain, FieldValue, Record};
use serde_json::{Map, Value, json};

/// Encodes a domain in prefix notation.
///
/// A conjunction or disjunction of `n` children emits `n - 1` operator
/// tokens followed by the children. An empty domain encodes as `[]`.
pub fn encode_domain(domain: &Domain) -> Value {
    let mut tokens = Vec::new();
    push_domain(domain, &mut tokens);
    Value::Array(tokens)
}

fn push_domain(domain: &Domain, tokens: &mut Vec<Value>) {
    match domain {
        Domain::Leaf(condition) => tokens.push(json!([
            condition.field,
            condition.operator.as_str(),
            condition.value.to_json()
        ])),
        Domain::And(children) | Domain::Or(children) => {
            let op = if matches!(domain, Domain::And(_)) { "&" } else { "|" };
            let children: Vec<&Domain> = children.iter().filter(|c| !c.is_empty()).collect();
            for _ in 1..children.len() {
                tokens.push(json!(op));
            }
            for child in children {
                push_domain(child, tokens);
            }
        }
    }
}

/// Encodes a value for `create`/`write`.
///
/// Id lists use the replace-all command so the destination relation ends
/// up holding exactly the given ids.
pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Bool(false),
        FieldValue::IdList(ids) => json!([[6, 0, ids]]),
        other => other.to_json(),
    }
}

pub fn encode_record(record: &Record) -> Value {
    let object: Map<String, Value> = record
        .iter()
        .map(|(name, value)| (name.to_string(), encode_value(value)))
        .collect();
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_leaf() {
        let domain = Domain::all_eq(vec![("code".to_string(), FieldValue::from("FR"))]);
        assert_eq!(encode_domain(&domain), json!([["code", "=", "FR"]]));
    }

    #[test]
    fn test_conjunction_uses_prefix_operators() {
        let domain = Domain::all_eq(vec![
            ("code".to_string(), FieldValue::from("FR")),
            ("name".to_string(), FieldValue::from("France")),
            ("active".to_string(), FieldValue::from(true)),
        ]);
        assert_eq!(
            encode_domain(&domain),
            json!(["&", "&", ["code", "=", "FR"], ["name", "=", "France"], ["active", "=", true]])
        );
    }

    #[test]
    fn test_nested_disjunction() {
        let domain = Domain::And(vec![
            Domain::eq("a", 1),
            Domain::Or(vec![Domain::eq("b", 2), Domain::eq("c", 3)]),
        ]);
        assert_eq!(
            encode_domain(&domain),
            json!(["&", ["a", "=", 1], "|", ["b", "=", 2], ["c", "=", 3]])
        );
    }

    #[test]
    fn test_empty_domain() {
        assert_eq!(encode_domain(&Domain::all()), json!([]));
    }

    #[test]
    fn test_relational_values_encoding() {
        let record = Record::new()
            .with("name", "Acme")
            .with("country_id", FieldValue::LabeledIdRef(10, "France".into()))
            .with("category_id", FieldValue::IdList(vec![3, 1]))
            .with("parent_id", FieldValue::Null);

        assert_eq!(
            encode_record(&record),
            json!({
                "name": "Acme",
                "country_id": 10,
                "category_id": [[6, 0, [3, 1]]],
                "parent_id": false,
            })
        );
    }
}
