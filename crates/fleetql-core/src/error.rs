//! Error types for `FleetQL`.
//!
//! This module provides a unified error type for all engine operations.
//! Error codes follow the pattern `FQL-XXX` so that REST clients and log
//! readers can match on a stable identifier instead of the message text.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ql::ParseError;

/// Result type alias for `FleetQL` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `FleetQL` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The filter, sort or literal could not be parsed or coerced (FQL-001).
    ///
    /// Carries the offending fragment and its position in the input.
    #[error("[FQL-001] Malformed query: {0}")]
    MalformedQuery(ParseError),

    /// Field exists in no allow-list for this entity (FQL-002).
    #[error("[FQL-002] Unknown field '{field}' for entity '{entity}'")]
    UnknownField {
        /// Entity the field was looked up on.
        entity: String,
        /// Field name as written by the caller.
        field: String,
    },

    /// One or more referenced entities do not exist (FQL-003).
    #[error("[FQL-003] {entity_type} not found: [{}]", .ids.join(", "))]
    EntityNotFound {
        /// Entity type of the missing references.
        entity_type: String,
        /// Missing identifiers, sorted.
        ids: Vec<String>,
    },

    /// A create or update value failed validation (FQL-004).
    #[error("[FQL-004] Validation error: {0}")]
    Validation(String),

    /// Configuration error (FQL-005).
    #[error("[FQL-005] Configuration error: {0}")]
    Config(String),

    /// Storage layer error, passed through unchanged (FQL-006).
    #[error("[FQL-006] Storage error: {0}")]
    Storage(String),

    /// IO error (FQL-007).
    #[error("[FQL-007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (FQL-008).
    #[error("[FQL-008] Serialization error: {0}")]
    Serialization(String),

    /// Internal error (FQL-009).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[FQL-009] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "FQL-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedQuery(_) => "FQL-001",
            Self::UnknownField { .. } => "FQL-002",
            Self::EntityNotFound { .. } => "FQL-003",
            Self::Validation(_) => "FQL-004",
            Self::Config(_) => "FQL-005",
            Self::Storage(_) => "FQL-006",
            Self::Io(_) => "FQL-007",
            Self::Serialization(_) => "FQL-008",
            Self::Internal(_) => "FQL-009",
        }
    }

    /// Returns true if the error was caused by the caller's input.
    ///
    /// Client errors are reported back unchanged and are never retried.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedQuery(_)
                | Self::UnknownField { .. }
                | Self::EntityNotFound { .. }
                | Self::Validation(_)
        )
    }

    /// Builds an [`Error::EntityNotFound`] from any displayable identifiers.
    ///
    /// Identifiers are rendered in the order given; callers pass them sorted.
    pub fn not_found<I, T>(entity_type: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        Self::EntityNotFound {
            entity_type: entity_type.into(),
            ids: ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }

    /// Builds an [`Error::UnknownField`].
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::MalformedQuery(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
