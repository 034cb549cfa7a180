//! Schema binding: resolves field paths and coerces literals.
//!
//! Binding is where an expression meets an [`EntitySchema`]. Unknown
//! segments, traversals deeper than one relation hop and literals that do
//! not fit the declared field type are rejected here with a
//! [`ParseError`], before anything reaches storage.

use serde::Serialize;
use tracing::debug;

use super::ast::{Comparison, FilterExpression, Literal, Operator};
use super::error::{ParseError, ParseErrorKind};
use super::virtual_props::VirtualPropertyResolver;
use crate::predicate::LikePattern;
use crate::schema::{EntityKind, EntitySchema, FieldDef, FieldKind};

/// An expression whose paths and values are checked against a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundExpression {
    /// Root entity kind.
    pub entity: EntityKind,
    /// Bound tree.
    pub root: BoundNode,
}

/// Node of a bound expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundNode {
    /// Leaf comparison.
    Comparison(BoundComparison),
    /// Conjunction.
    And(Vec<BoundNode>),
    /// Disjunction.
    Or(Vec<BoundNode>),
}

/// A comparison with a resolved path and typed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundComparison {
    /// Resolved field path.
    pub path: ResolvedPath,
    /// Operator as written.
    pub operator: Operator,
    /// Coerced values; exactly one unless the operator takes a list.
    pub values: Vec<Value>,
    /// Byte offset of the term in the query.
    pub position: usize,
}

/// Where a comparison reads its value from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedPath {
    /// Scalar attribute of the root entity.
    Attribute {
        /// Field declaration.
        #[serde(serialize_with = "field_name")]
        field: &'static FieldDef,
    },
    /// Scalar attribute of an entity one relation away.
    Related {
        /// Relation on the root entity.
        #[serde(serialize_with = "field_name")]
        relation: &'static FieldDef,
        /// Related entity kind.
        target: EntityKind,
        /// Attribute on the related entity.
        #[serde(serialize_with = "field_name")]
        attribute: &'static FieldDef,
        /// True for to-many relations.
        many: bool,
    },
    /// Entry of a string map.
    MapEntry {
        /// Map field declaration.
        #[serde(serialize_with = "field_name")]
        field: &'static FieldDef,
        /// Map key.
        key: String,
    },
}

fn field_name<S: serde::Serializer>(field: &&'static FieldDef, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(field.name)
}

impl ResolvedPath {
    /// Type of the value the comparison reads.
    #[must_use]
    pub fn value_kind(&self) -> FieldKind {
        match self {
            Self::Attribute { field } => field.kind,
            Self::Related { attribute, .. } => attribute.kind,
            Self::MapEntry { .. } => FieldKind::Text,
        }
    }

    /// Canonical dotted name, e.g. `tag.name`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Attribute { field } => field.name.to_string(),
            Self::Related {
                relation,
                attribute,
                ..
            } => format!("{}.{}", relation.name, attribute.name),
            Self::MapEntry { field, key } => format!("{}.{key}", field.name),
        }
    }
}

/// Typed literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// The bare keyword `null`.
    Null,
    /// Text value.
    Text(String),
    /// Text containing an unescaped `*`.
    Pattern(LikePattern),
    /// Integer or timestamp (epoch millis).
    Integer(i64),
    /// Boolean.
    Boolean(bool),
    /// Canonical enum literal.
    Enum(String),
}

/// Binds a parsed expression to the schema of `entity`.
///
/// # Errors
///
/// Returns a `ParseError` for unknown fields, traversals deeper than one
/// hop and literals that cannot be coerced.
pub fn bind(
    expr: &FilterExpression,
    entity: EntityKind,
    resolver: &VirtualPropertyResolver,
) -> Result<BoundExpression, ParseError> {
    let binder = Binder {
        schema: entity.schema(),
        resolver,
    };
    let root = binder.bind_node(expr)?;
    debug!(entity = %entity, "bound filter expression");
    Ok(BoundExpression { entity, root })
}

struct Binder<'a> {
    schema: &'static EntitySchema,
    resolver: &'a VirtualPropertyResolver,
}

impl Binder<'_> {
    fn bind_node(&self, expr: &FilterExpression) -> Result<BoundNode, ParseError> {
        match expr {
            FilterExpression::Comparison(c) => self.bind_comparison(c).map(BoundNode::Comparison),
            FilterExpression::And(children) => children
                .iter()
                .map(|c| self.bind_node(c))
                .collect::<Result<_, _>>()
                .map(BoundNode::And),
            FilterExpression::Or(children) => children
                .iter()
                .map(|c| self.bind_node(c))
                .collect::<Result<_, _>>()
                .map(BoundNode::Or),
        }
    }

    fn bind_comparison(&self, comparison: &Comparison) -> Result<BoundComparison, ParseError> {
        let path = self.resolve_path(comparison)?;
        let kind = path.value_kind();

        let values = comparison
            .argument
            .literals()
            .iter()
            .map(|lit| self.coerce(lit, kind, comparison))
            .collect::<Result<Vec<_>, _>>()?;

        if matches!(comparison.operator, Operator::Is | Operator::Not)
            && values.iter().any(|v| *v != Value::Null)
        {
            return Err(ParseError::type_mismatch(
                comparison.position,
                comparison.field.to_string(),
                format!("Operator '{}' only accepts null", comparison.operator),
            ));
        }

        Ok(BoundComparison {
            path,
            operator: comparison.operator,
            values,
            position: comparison.position,
        })
    }

    fn resolve_path(&self, comparison: &Comparison) -> Result<ResolvedPath, ParseError> {
        let path = &comparison.field;
        let position = comparison.position;
        let segments = path.segments();

        let head = self.schema.field(path.head()).ok_or_else(|| {
            ParseError::unknown_field(position, path.to_string(), &self.schema.queryable_names())
        })?;

        match head.kind {
            FieldKind::Map => {
                let key = path.tail().ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::UnknownField,
                        position,
                        path.to_string(),
                        format!("Map field '{}' requires a key, e.g. '{}.key'", head.name, head.name),
                    )
                })?;
                Ok(ResolvedPath::MapEntry { field: head, key })
            }
            FieldKind::Relation {
                target,
                default_attribute,
            }
            | FieldKind::RelationSet {
                target,
                default_attribute,
            } => {
                let related = target.schema();
                let attribute_name = match segments {
                    [_] => default_attribute.ok_or_else(|| {
                        ParseError::unknown_field(position, path.to_string(), &related.scalar_names())
                    })?,
                    [_, attribute] => attribute.as_str(),
                    _ => return Err(too_deep(position, &path.to_string())),
                };
                let attribute = related.field(attribute_name).ok_or_else(|| {
                    ParseError::unknown_field(position, path.to_string(), &related.scalar_names())
                })?;
                if !attribute.kind.is_scalar() {
                    return Err(too_deep(position, &path.to_string()));
                }
                Ok(ResolvedPath::Related {
                    relation: head,
                    target,
                    attribute,
                    many: matches!(head.kind, FieldKind::RelationSet { .. }),
                })
            }
            _ if segments.len() > 1 => Err(ParseError::new(
                ParseErrorKind::UnknownField,
                position,
                path.to_string(),
                format!("Field '{}' has no sub-attributes", head.name),
            )),
            _ => Ok(ResolvedPath::Attribute { field: head }),
        }
    }

    fn coerce(
        &self,
        literal: &Literal,
        kind: FieldKind,
        comparison: &Comparison,
    ) -> Result<Value, ParseError> {
        if literal.is_null_keyword() {
            return Ok(Value::Null);
        }

        let text = self.resolver.resolve(&literal.text);
        if matches!(comparison.operator, Operator::Eq | Operator::Ne)
            && LikePattern::has_wildcard(&text)
        {
            return Ok(Value::Pattern(LikePattern::parse(&text)));
        }
        let text = LikePattern::unescape(&text);
        let mismatch = |expected: String| {
            ParseError::type_mismatch(
                comparison.position,
                text.clone(),
                format!(
                    "Value '{text}' for field '{}' is not {expected}",
                    comparison.field
                ),
            )
        };

        match kind {
            FieldKind::Integer | FieldKind::Timestamp => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| mismatch(format!("a valid {}", kind.type_name()))),
            FieldKind::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(mismatch("true or false".to_string())),
            },
            FieldKind::Enum(allowed) => allowed
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(&text))
                .map(|canonical| Value::Enum((*canonical).to_string()))
                .ok_or_else(|| mismatch(format!("one of: {}", allowed.join(", ")))),
            _ => Ok(Value::Text(text)),
        }
    }
}

fn too_deep(position: usize, path: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::UnknownField,
        position,
        path,
        format!("Field path '{path}' traverses more than one relation"),
    )
}
