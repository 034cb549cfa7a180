//! Syntax tree produced by the RSQL parser.
//!
//! The tree is schema-agnostic: field paths are kept as written and values
//! are raw text. The binder turns it into a [`BoundExpression`] once the
//! entity kind is known.
//!
//! [`BoundExpression`]: super::BoundExpression

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    /// Single `field operator value` term.
    Comparison(Comparison),
    /// All children must hold (`;` or `and`).
    And(Vec<FilterExpression>),
    /// At least one child must hold (`,` or `or`).
    Or(Vec<FilterExpression>),
}

impl FilterExpression {
    /// Iterates over every comparison in the tree, depth first.
    pub fn comparisons(&self) -> Box<dyn Iterator<Item = &Comparison> + '_> {
        match self {
            Self::Comparison(c) => Box::new(std::iter::once(c)),
            Self::And(children) | Self::Or(children) => {
                Box::new(children.iter().flat_map(FilterExpression::comparisons))
            }
        }
    }
}

/// A single comparison term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Field path as written.
    pub field: FieldPath,
    /// Comparison operator.
    pub operator: Operator,
    /// One value or a parenthesized list.
    pub argument: Argument,
    /// Byte offset of the term in the query.
    pub position: usize,
}

/// Dotted field path, e.g. `distributionSet.name` or `metadata.some.key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits a dotted selector into segments.
    #[must_use]
    pub fn parse(selector: &str) -> Self {
        Self {
            segments: selector.split('.').map(str::to_string).collect(),
        }
    }

    /// Path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment.
    #[must_use]
    pub fn head(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    /// Segments after the first, re-joined with dots.
    #[must_use]
    pub fn tail(&self) -> Option<String> {
        if self.segments.len() > 1 {
            Some(self.segments[1..].join("."))
        } else {
            None
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// RSQL comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `==`, wildcard match when the value contains `*`.
    Eq,
    /// `!=`, negated wildcard match when the value contains `*`.
    Ne,
    /// `=lt=` or `<`.
    Lt,
    /// `=le=` or `<=`.
    Le,
    /// `=gt=` or `>`.
    Gt,
    /// `=ge=` or `>=`.
    Ge,
    /// `=in=`.
    In,
    /// `=out=`.
    Out,
    /// `=is=`, null test.
    Is,
    /// `=not=`, negated null test.
    Not,
}

impl Operator {
    /// Parses an operator token. Named forms are case-insensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "=lt=" | "<" => Some(Self::Lt),
            "=le=" | "<=" => Some(Self::Le),
            "=gt=" | ">" => Some(Self::Gt),
            "=ge=" | ">=" => Some(Self::Ge),
            "=in=" => Some(Self::In),
            "=out=" => Some(Self::Out),
            "=is=" => Some(Self::Is),
            "=not=" => Some(Self::Not),
            _ => None,
        }
    }

    /// Canonical token.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "=lt=",
            Self::Le => "=le=",
            Self::Gt => "=gt=",
            Self::Ge => "=ge=",
            Self::In => "=in=",
            Self::Out => "=out=",
            Self::Is => "=is=",
            Self::Not => "=not=",
        }
    }

    /// True for operators that accept a value list.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::Out)
    }

    /// True for ordering comparators.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    /// True for operators whose match set is the complement of another.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(self, Self::Ne | Self::Out | Self::Not)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// A single literal.
    Single(Literal),
    /// Parenthesized literal list.
    List(Vec<Literal>),
}

impl Argument {
    /// All literals, regardless of form.
    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        match self {
            Self::Single(lit) => std::slice::from_ref(lit),
            Self::List(list) => list,
        }
    }
}

/// A literal value with quotes removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    /// Unquoted text; `\*` escapes are preserved for the binder.
    pub text: String,
    /// Whether the literal was written in quotes.
    pub quoted: bool,
}

impl Literal {
    /// Creates an unquoted literal.
    #[must_use]
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    /// Creates a quoted literal.
    #[must_use]
    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    /// True for the bare keyword `null`.
    #[must_use]
    pub fn is_null_keyword(&self) -> bool {
        !self.quoted && self.text.eq_ignore_ascii_case("null")
    }
}
