use std::fmt;

use super::{FieldValue, Record};

/// Comparison operator of a single domain condition. Natural-key matching
/// only ever compares for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
        }
    }
}

/// A `(field, operator, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: FieldValue,
}

/// A search predicate: a conjunction/disjunction tree of conditions.
///
/// An empty `And` matches every record.
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    Leaf(Condition),
    And(Vec<Domain>),
    Or(Vec<Domain>),
}

impl Domain {
    /// The match-everything domain.
    pub fn all() -> Self {
        Domain::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Domain::Leaf(Condition {
            field: field.into(),
            operator: Operator::Eq,
            value: value.into(),
        })
    }

    /// Conjunction of equality clauses, one per `(field, value)` pair.
    pub fn all_eq<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        Domain::And(
            clauses
                .into_iter()
                .map(|(field, value)| Domain::eq(field, value))
                .collect(),
        )
    }

    /// Number of leaf conditions in the tree.
    pub fn condition_count(&self) -> usize {
        match self {
            Domain::Leaf(_) => 1,
            Domain::And(children) | Domain::Or(children) => {
                children.iter().map(Domain::condition_count).sum()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.condition_count() == 0
    }

    /// Evaluates the domain against an in-memory record.
    ///
    /// Relational values compare by id, so `[10, "France"]` equals `10`.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Domain::Leaf(condition) => condition.matches(record),
            Domain::And(children) => children.iter().all(|d| d.matches(record)),
            Domain::Or(children) => children.iter().any(|d| d.matches(record)),
        }
    }
}

impl Condition {
    fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.field).map(FieldValue::to_bare).unwrap_or(FieldValue::Null);
        match self.operator {
            Operator::Eq => actual == self.value.to_bare(),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Leaf(c) => write!(f, "({}, '{}', {})", c.field, c.operator.as_str(), c.value.to_json()),
            Domain::And(children) | Domain::Or(children) => {
                let joiner = if matches!(self, Domain::And(_)) { " & " } else { " | " };
                write!(f, "[")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{joiner}")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, "]")
            }
        }
    }
}
