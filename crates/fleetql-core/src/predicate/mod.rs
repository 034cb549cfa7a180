//! Storage predicates lowered from bound filter expressions.
//!
//! A [`Predicate`] is what the storage layer executes. It names document
//! properties instead of RSQL field names, carries typed [`Scalar`] values,
//! and makes relation handling explicit: to-one relations are joined, to-many
//! relations are quantified, map entries are keyed lookups.
//!
//! ```ignore
//! use fleetql_core::predicate::{to_predicate, LoweringOptions};
//!
//! let predicate = to_predicate(&bound, LoweringOptions::default())?;
//! assert!(predicate.matches(&doc, &store_view));
//! ```

mod like;
mod matching;
mod sql;


pub use like::{LikePattern, Segment};
pub(crate) use matching::sort_order;
pub use matching::{NoRelations, RelationLookup};
pub use sql::{SqlQuery, SqlRenderer};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ql::{BoundComparison, BoundExpression, BoundNode, Operator, ParseError, ResolvedPath, Value};
use crate::schema::{EntityKind, FieldKind};

/// Typed value handed to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Text, including canonical enum literals.
    Text(String),
    /// Integer or epoch millis.
    Integer(i64),
    /// Boolean.
    Boolean(bool),
}

impl Scalar {
    /// Lowercases text; other scalars are returned unchanged.
    #[must_use]
    pub fn to_lowercase(&self) -> Self {
        match self {
            Self::Text(text) => Self::Text(text.to_lowercase()),
            other => other.clone(),
        }
    }
}

/// What a criterion reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Target {
    /// Property of the root document.
    Column {
        /// Document property.
        property: &'static str,
    },
    /// Property of the entity referenced by a to-one relation.
    Joined {
        /// Relation property on the root document.
        relation: &'static str,
        /// Related entity kind.
        entity: EntityKind,
        /// Property on the related document.
        property: &'static str,
    },
    /// Property of each entity referenced by a to-many relation.
    ///
    /// The criterion holds when at least one element satisfies the test.
    Each {
        /// Relation property on the root document.
        relation: &'static str,
        /// Related entity kind.
        entity: EntityKind,
        /// Property on the related documents.
        property: &'static str,
    },
    /// Entry of a string map. A missing key never satisfies any test.
    MapEntry {
        /// Map property on the root document.
        property: &'static str,
        /// Entry key.
        key: String,
    },
}

/// Test applied to the value a criterion reads.
///
/// Negated tests treat a null value as a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum Test {
    /// Equal to.
    Equals(Scalar),
    /// Null or not equal to.
    NotEquals(Scalar),
    /// Strictly less than.
    Less(Scalar),
    /// Less than or equal.
    LessOrEqual(Scalar),
    /// Strictly greater than.
    Greater(Scalar),
    /// Greater than or equal.
    GreaterOrEqual(Scalar),
    /// Equal to one of.
    In(Vec<Scalar>),
    /// Null or equal to none of.
    NotIn(Vec<Scalar>),
    /// Matches the wildcard pattern.
    Like(LikePattern),
    /// Null or does not match the wildcard pattern.
    NotLike(LikePattern),
    /// Is null.
    IsNull,
    /// Is not null.
    IsNotNull,
    /// Null or the empty string.
    NullOrEmpty,
    /// Neither null nor the empty string.
    NotNullNorEmpty,
}

impl Test {
    /// For negated tests, the positive test whose complement they are.
    #[must_use]
    pub fn positive_counterpart(&self) -> Option<Self> {
        match self {
            Self::NotEquals(v) => Some(Self::Equals(v.clone())),
            Self::NotIn(v) => Some(Self::In(v.clone())),
            Self::NotLike(p) => Some(Self::Like(p.clone())),
            Self::IsNotNull => Some(Self::IsNull),
            Self::NotNullNorEmpty => Some(Self::NullOrEmpty),
            _ => None,
        }
    }
}

/// A single test on a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
    /// What is read.
    pub target: Target,
    /// How it is tested.
    pub test: Test,
    /// Compare text ignoring case.
    pub case_insensitive: bool,
}

/// Lowered filter, ready for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches everything (no filter).
    Always,
    /// Leaf criterion.
    Compare(Criterion),
    /// Complement.
    Not(Box<Predicate>),
    /// Conjunction.
    All(Vec<Predicate>),
    /// Disjunction.
    Any(Vec<Predicate>),
}

/// Options applied while lowering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Compare text fields ignoring case.
    pub ignore_case: bool,
}

/// Lowers a bound expression into a storage predicate.
///
/// # Errors
///
/// - [`Error::UnknownField`] when a field is declared but not queryable.
/// - [`Error::MalformedQuery`] when the operator cannot apply to the field
///   type (wildcard on numbers, ordering on booleans or enums, null in
///   an ordering or a list).
pub fn to_predicate(expr: &BoundExpression, options: LoweringOptions) -> Result<Predicate> {
    let lowering = Lowering {
        entity: expr.entity,
        options,
    };
    let predicate = lowering.lower(&expr.root)?;
    debug!(entity = %expr.entity, "lowered filter to predicate");
    Ok(predicate)
}

struct Lowering {
    entity: EntityKind,
    options: LoweringOptions,
}

impl Lowering {
    fn lower(&self, node: &BoundNode) -> Result<Predicate> {
        match node {
            BoundNode::Comparison(c) => self.lower_comparison(c),
            BoundNode::And(children) => children
                .iter()
                .map(|c| self.lower(c))
                .collect::<Result<_>>()
                .map(Predicate::All),
            BoundNode::Or(children) => children
                .iter()
                .map(|c| self.lower(c))
                .collect::<Result<_>>()
                .map(Predicate::Any),
        }
    }

    fn lower_comparison(&self, comparison: &BoundComparison) -> Result<Predicate> {
        self.check_queryable(&comparison.path)?;

        let kind = comparison.path.value_kind();
        let test = build_test(comparison, kind)?;
        let case_insensitive = match kind {
            FieldKind::Enum(_) => true,
            FieldKind::Text => self.options.ignore_case,
            _ => false,
        };

        let (target, quantified) = match &comparison.path {
            ResolvedPath::Attribute { field } => (
                Target::Column {
                    property: field.property,
                },
                false,
            ),
            ResolvedPath::Related {
                relation,
                target,
                attribute,
                many: false,
            } => (
                Target::Joined {
                    relation: relation.property,
                    entity: *target,
                    property: attribute.property,
                },
                false,
            ),
            ResolvedPath::Related {
                relation,
                target,
                attribute,
                many: true,
            } => (
                Target::Each {
                    relation: relation.property,
                    entity: *target,
                    property: attribute.property,
                },
                true,
            ),
            ResolvedPath::MapEntry { field, key } => (
                Target::MapEntry {
                    property: field.property,
                    key: key.clone(),
                },
                false,
            ),
        };

        // On to-many relations a negated test means "no element matches".
        if quantified {
            if let Some(positive) = test.positive_counterpart() {
                return Ok(Predicate::Not(Box::new(Predicate::Compare(Criterion {
                    target,
                    test: positive,
                    case_insensitive,
                }))));
            }
        }

        Ok(Predicate::Compare(Criterion {
            target,
            test,
            case_insensitive,
        }))
    }

    fn check_queryable(&self, path: &ResolvedPath) -> Result<()> {
        let allowed = match path {
            ResolvedPath::Attribute { field } | ResolvedPath::MapEntry { field, .. } => {
                field.queryable
            }
            ResolvedPath::Related {
                relation,
                attribute,
                ..
            } => relation.queryable && attribute.queryable,
        };
        if allowed {
            Ok(())
        } else {
            warn!(entity = %self.entity, field = %path.display_name(), "rejected non-queryable field");
            Err(Error::unknown_field(
                self.entity.display_name(),
                path.display_name(),
            ))
        }
    }
}

fn build_test(comparison: &BoundComparison, kind: FieldKind) -> Result<Test> {
    let op = comparison.operator;
    let unsupported = |message: String| {
        Error::MalformedQuery(ParseError::unsupported_operator(
            comparison.position,
            op.token(),
            message,
        ))
    };
    let field = comparison.path.display_name();

    match op {
        Operator::Is => Ok(Test::IsNull),
        Operator::Not => Ok(Test::IsNotNull),
        Operator::In | Operator::Out => {
            let values = comparison
                .values
                .iter()
                .map(|v| to_scalar(v, &field, comparison.position))
                .collect::<Result<Vec<_>>>()?;
            Ok(if op == Operator::In {
                Test::In(values)
            } else {
                Test::NotIn(values)
            })
        }
        Operator::Eq | Operator::Ne => {
            let negated = op == Operator::Ne;
            let value = single_value(comparison)?;
            match value {
                Value::Null => Ok(if negated { Test::IsNotNull } else { Test::IsNull }),
                Value::Pattern(pattern) => {
                    if kind != FieldKind::Text {
                        return Err(unsupported(format!(
                            "Wildcards are not supported on {} field '{field}'",
                            kind.type_name()
                        )));
                    }
                    Ok(if negated {
                        Test::NotLike(pattern.clone())
                    } else {
                        Test::Like(pattern.clone())
                    })
                }
                Value::Text(text) if text.is_empty() && kind == FieldKind::Text => {
                    Ok(if negated {
                        Test::NotNullNorEmpty
                    } else {
                        Test::NullOrEmpty
                    })
                }
                other => {
                    let scalar = to_scalar(other, &field, comparison.position)?;
                    Ok(if negated {
                        Test::NotEquals(scalar)
                    } else {
                        Test::Equals(scalar)
                    })
                }
            }
        }
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
            if !matches!(
                kind,
                FieldKind::Text | FieldKind::Integer | FieldKind::Timestamp
            ) {
                return Err(unsupported(format!(
                    "Operator '{op}' cannot be applied to {} field '{field}'",
                    kind.type_name()
                )));
            }
            let value = single_value(comparison)?;
            if *value == Value::Null {
                return Err(unsupported(format!(
                    "Operator '{op}' cannot compare '{field}' with null"
                )));
            }
            let scalar = to_scalar(value, &field, comparison.position)?;
            Ok(match op {
                Operator::Lt => Test::Less(scalar),
                Operator::Le => Test::LessOrEqual(scalar),
                Operator::Gt => Test::Greater(scalar),
                _ => Test::GreaterOrEqual(scalar),
            })
        }
    }
}

fn single_value(comparison: &BoundComparison) -> Result<&Value> {
    match comparison.values.as_slice() {
        [value] => Ok(value),
        _ => Err(Error::MalformedQuery(ParseError::unexpected_token(
            comparison.position,
            comparison.path.display_name(),
            &format!("a single value for operator '{}'", comparison.operator),
        ))),
    }
}

fn to_scalar(value: &Value, field: &str, position: usize) -> Result<Scalar> {
    match value {
        Value::Text(text) | Value::Enum(text) => Ok(Scalar::Text(text.clone())),
        Value::Integer(i) => Ok(Scalar::Integer(*i)),
        Value::Boolean(b) => Ok(Scalar::Boolean(*b)),
        Value::Null => Err(Error::MalformedQuery(ParseError::type_mismatch(
            position,
            "null",
            format!("null is not allowed in a value list for '{field}'"),
        ))),
        Value::Pattern(pattern) => Err(Error::MalformedQuery(ParseError::type_mismatch(
            position,
            pattern.to_string(),
            format!("Wildcards are not allowed here for '{field}'"),
        ))),
    }
}
