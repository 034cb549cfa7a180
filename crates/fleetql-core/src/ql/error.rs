//! Error types for RSQL parsing and binding.

use std::fmt;

use serde::Serialize;

/// Error that occurred while parsing or binding a filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    /// Kind of error.
    pub kind: ParseErrorKind,
    /// Byte position in the input where the error occurred.
    pub position: usize,
    /// The problematic input fragment.
    pub fragment: String,
    /// Human-readable message.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(
        kind: ParseErrorKind,
        position: usize,
        fragment: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            position,
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(
        position: usize,
        fragment: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ParseErrorKind::SyntaxError, position, fragment, message)
    }

    /// Creates an unexpected token error.
    #[must_use]
    pub fn unexpected_token(position: usize, fragment: impl Into<String>, expected: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            position,
            fragment,
            format!("Expected {expected}"),
        )
    }

    /// Creates an unknown field error.
    #[must_use]
    pub fn unknown_field(position: usize, field: impl Into<String>, hint: &[&str]) -> Self {
        let field = field.into();
        let message = if hint.is_empty() {
            format!("Unknown field '{field}'")
        } else {
            format!("Unknown field '{field}', valid fields: {}", hint.join(", "))
        };
        Self::new(ParseErrorKind::UnknownField, position, field, message)
    }

    /// Creates a type mismatch error for a literal that cannot be coerced.
    #[must_use]
    pub fn type_mismatch(
        position: usize,
        literal: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ParseErrorKind::TypeMismatch, position, literal, message)
    }

    /// Creates an unsupported operator error.
    #[must_use]
    pub fn unsupported_operator(
        position: usize,
        operator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ParseErrorKind::UnsupportedOperator,
            position,
            operator,
            message,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at position {}",
            self.kind.code(),
            self.message,
            self.position
        )
    }
}

impl std::error::Error for ParseError {}

/// Kind of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Syntax error (E001).
    SyntaxError,
    /// Unexpected token (E001).
    UnexpectedToken,
    /// Unknown field or relation traversal (E002).
    UnknownField,
    /// Literal does not fit the field type (E003).
    TypeMismatch,
    /// Operator cannot be applied to the field (E004).
    UnsupportedOperator,
    /// Input exceeds the configured length (E005).
    TooLong,
}

impl ParseErrorKind {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SyntaxError | Self::UnexpectedToken => "E001",
            Self::UnknownField => "E002",
            Self::TypeMismatch => "E003",
            Self::UnsupportedOperator => "E004",
            Self::TooLong => "E005",
        }
    }
}
