//! In-memory evaluation of predicates against JSON documents.

use serde_json::Value;
use std::cmp::Ordering;

use super::{Criterion, Predicate, Scalar, Target, Test};
use crate::schema::EntityKind;

static NULL: Value = Value::Null;

/// Resolves relation references to related documents.
///
/// A relation property may hold an embedded object or the numeric id of the
/// related entity; ids are resolved through this trait.
pub trait RelationLookup {
    /// Returns the document of `kind` with primary key `id`.
    fn related(&self, kind: EntityKind, id: i64) -> Option<&Value>;
}

/// Lookup for documents whose relations are always embedded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelations;

impl RelationLookup for NoRelations {
    fn related(&self, _kind: EntityKind, _id: i64) -> Option<&Value> {
        None
    }
}

impl Predicate {
    /// Evaluates the predicate against a document.
    #[must_use]
    pub fn matches(&self, doc: &Value, lookup: &dyn RelationLookup) -> bool {
        match self {
            Self::Always => true,
            Self::Compare(criterion) => criterion.matches(doc, lookup),
            Self::Not(inner) => !inner.matches(doc, lookup),
            Self::All(children) => children.iter().all(|p| p.matches(doc, lookup)),
            Self::Any(children) => children.iter().any(|p| p.matches(doc, lookup)),
        }
    }
}

impl Criterion {
    /// Evaluates the criterion against a document.
    #[must_use]
    pub fn matches(&self, doc: &Value, lookup: &dyn RelationLookup) -> bool {
        match &self.target {
            Target::Column { property } => self.test_value(doc.get(*property)),
            Target::Joined {
                relation,
                entity,
                property,
            } => {
                let related = doc
                    .get(*relation)
                    .and_then(|r| resolve(r, *entity, lookup));
                self.test_value(related.and_then(|r| r.get(*property)))
            }
            Target::Each {
                relation,
                entity,
                property,
            } => doc
                .get(*relation)
                .and_then(Value::as_array)
                .is_some_and(|elements| {
                    elements.iter().any(|element| {
                        let related = resolve(element, *entity, lookup);
                        self.test_value(related.and_then(|r| r.get(*property)))
                    })
                }),
            Target::MapEntry { property, key } => {
                let entry = doc
                    .get(*property)
                    .and_then(Value::as_object)
                    .and_then(|map| map.get(key.as_str()));
                // A missing key reads as null for null tests and never matches otherwise.
                match self.test {
                    Test::IsNull | Test::IsNotNull => self.test_value(entry),
                    _ => entry.is_some_and(|value| self.test_value(Some(value))),
                }
            }
        }
    }

    fn test_value(&self, value: Option<&Value>) -> bool {
        let value = value.filter(|v| !v.is_null());
        let ci = self.case_insensitive;

        match &self.test {
            Test::IsNull => value.is_none(),
            Test::IsNotNull => value.is_some(),
            Test::NullOrEmpty => value.is_none_or(|v| v.as_str() == Some("")),
            Test::NotNullNorEmpty => value.is_some_and(|v| v.as_str() != Some("")),
            Test::Equals(s) => value.is_some_and(|v| scalar_eq(v, s, ci)),
            Test::NotEquals(s) => value.is_none_or(|v| !scalar_eq(v, s, ci)),
            Test::In(list) => value.is_some_and(|v| list.iter().any(|s| scalar_eq(v, s, ci))),
            Test::NotIn(list) => value.is_none_or(|v| !list.iter().any(|s| scalar_eq(v, s, ci))),
            Test::Like(pattern) => {
                value.is_some_and(|v| v.as_str().is_some_and(|s| pattern.matches(s, ci)))
            }
            Test::NotLike(pattern) => {
                value.is_none_or(|v| !v.as_str().is_some_and(|s| pattern.matches(s, ci)))
            }
            Test::Less(s) => compare(value, s, ci) == Some(Ordering::Less),
            Test::LessOrEqual(s) => {
                matches!(compare(value, s, ci), Some(Ordering::Less | Ordering::Equal))
            }
            Test::Greater(s) => compare(value, s, ci) == Some(Ordering::Greater),
            Test::GreaterOrEqual(s) => {
                matches!(compare(value, s, ci), Some(Ordering::Greater | Ordering::Equal))
            }
        }
    }
}

/// Resolves an embedded object or an id reference.
fn resolve<'a>(
    reference: &'a Value,
    entity: EntityKind,
    lookup: &'a dyn RelationLookup,
) -> Option<&'a Value> {
    match reference {
        Value::Object(_) => Some(reference),
        Value::Number(n) => n.as_i64().and_then(|id| lookup.related(entity, id)),
        _ => None,
    }
}

fn scalar_eq(value: &Value, scalar: &Scalar, case_insensitive: bool) -> bool {
    match (value, scalar) {
        (Value::String(a), Scalar::Text(b)) => {
            if case_insensitive {
                a.to_lowercase() == b.to_lowercase()
            } else {
                a == b
            }
        }
        (Value::Number(a), Scalar::Integer(b)) => match a.as_i64() {
            Some(a) => a == *b,
            None => a.as_f64().is_some_and(|a| (a - *b as f64).abs() < f64::EPSILON),
        },
        (Value::Bool(a), Scalar::Boolean(b)) => a == b,
        _ => false,
    }
}

/// Compares a document value with a scalar. `None` for null or mismatched types.
fn compare(value: Option<&Value>, scalar: &Scalar, case_insensitive: bool) -> Option<Ordering> {
    match (value?, scalar) {
        (Value::String(a), Scalar::Text(b)) => Some(if case_insensitive {
            a.to_lowercase().cmp(&b.to_lowercase())
        } else {
            a.as_str().cmp(b.as_str())
        }),
        (Value::Number(a), Scalar::Integer(b)) => match a.as_i64() {
            Some(a) => Some(a.cmp(b)),
            None => a.as_f64().and_then(|a| a.partial_cmp(&(*b as f64))),
        },
        _ => None,
    }
}

/// Total order on JSON values used for sorting pages.
///
/// Nulls sort last; values of different types order by type rank.
#[must_use]
pub(crate) fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Array(_) => 3,
            Value::Object(_) => 4,
            Value::Null => 5,
        }
    }

    let a = a.unwrap_or(&NULL);
    let b = b.unwrap_or(&NULL);
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .zip(y.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
