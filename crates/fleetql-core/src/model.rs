//! Validated create values.
//!
//! Each value is immutable once validated: `validate(self)` either returns the
//! value unchanged (trimmed) or an [`Error::Validation`] naming the field.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::predicate::{to_predicate, LoweringOptions};
use crate::ql::{bind, Parser, VirtualPropertyResolver};
use crate::schema::EntityKind;

/// Maximum length of entity names.
pub const NAME_MAX_LEN: usize = 128;
/// Maximum length of descriptions.
pub const DESCRIPTION_MAX_LEN: usize = 512;
/// Maximum length of type keys.
pub const KEY_MAX_LEN: usize = 64;
/// Maximum length of stored filter queries.
pub const QUERY_MAX_LEN: usize = 1024;

fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    bounded(field, value, max)?;
    Ok(value.to_string())
}

fn bounded(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::Validation(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

fn optional_description(value: Option<String>) -> Result<Option<String>> {
    match value {
        Some(text) => {
            bounded("description", &text, DESCRIPTION_MAX_LEN)?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

fn optional_colour(value: Option<String>) -> Result<Option<String>> {
    let Some(colour) = value else {
        return Ok(None);
    };
    let colour = colour.trim();
    let valid = colour.len() == 7
        && colour.starts_with('#')
        && colour[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(Some(colour.to_string()))
    } else {
        Err(Error::Validation(format!(
            "colour must be written as #RRGGBB, got '{colour}'"
        )))
    }
}

/// A tag to create, for targets or distribution sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    /// Display name.
    pub name: String,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
    /// `#RRGGBB`.
    #[serde(default)]
    pub colour: Option<String>,
}

impl NewTag {
    /// Checks name, description and colour.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first invalid field.
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            name: required("name", &self.name, NAME_MAX_LEN)?,
            description: optional_description(self.description)?,
            colour: optional_colour(self.colour)?,
        })
    }

    /// Document to store; the id is assigned by the store.
    #[must_use]
    pub fn into_document(self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "colour": self.colour,
        })
    }
}

/// A target, distribution set or software module type to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntityType {
    /// Unique technical key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
    /// `#RRGGBB`.
    #[serde(default)]
    pub colour: Option<String>,
}

impl NewEntityType {
    /// Checks key, name, description and colour.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first invalid field.
    pub fn validate(self) -> Result<Self> {
        let key = required("key", &self.key, KEY_MAX_LEN)?;
        if key.chars().any(char::is_whitespace) {
            return Err(Error::Validation(format!(
                "key must not contain whitespace, got '{key}'"
            )));
        }
        Ok(Self {
            key,
            name: required("name", &self.name, NAME_MAX_LEN)?,
            description: optional_description(self.description)?,
            colour: optional_colour(self.colour)?,
        })
    }

    /// Document to store; the id is assigned by the store.
    #[must_use]
    pub fn into_document(self) -> Value {
        json!({
            "key": self.key,
            "name": self.name,
            "description": self.description,
            "colour": self.colour,
        })
    }
}

/// A stored target filter query to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTargetFilterQuery {
    /// Display name.
    pub name: String,
    /// RSQL query over targets.
    pub query: String,
    /// Distribution set assigned automatically to matching targets.
    #[serde(default)]
    pub auto_assign_distribution_set: Option<i64>,
    /// Weight of automatic assignments.
    #[serde(default)]
    pub auto_assign_weight: Option<i64>,
}

impl NewTargetFilterQuery {
    /// Checks the name and that the query compiles against the target schema.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for name, length and weight violations.
    /// - [`Error::MalformedQuery`] or [`Error::UnknownField`] if the query
    ///   does not compile.
    pub fn validate(self) -> Result<Self> {
        let name = required("name", &self.name, NAME_MAX_LEN)?;
        let query = required("query", &self.query, QUERY_MAX_LEN)?;

        let expr = Parser::parse(&query)?;
        let bound = bind(&expr, EntityKind::Target, &VirtualPropertyResolver::default())?;
        to_predicate(&bound, LoweringOptions::default())?;

        if let Some(weight) = self.auto_assign_weight {
            if !(0..=1000).contains(&weight) {
                return Err(Error::Validation(format!(
                    "autoAssignWeight must be between 0 and 1000, got {weight}"
                )));
            }
        }

        Ok(Self {
            name,
            query,
            auto_assign_distribution_set: self.auto_assign_distribution_set,
            auto_assign_weight: self.auto_assign_weight,
        })
    }

    /// Document to store; the id is assigned by the store.
    #[must_use]
    pub fn into_document(self) -> Value {
        json!({
            "name": self.name,
            "query": self.query,
            "autoAssignDistributionSet": self.auto_assign_distribution_set,
            "autoAssignWeight": self.auto_assign_weight,
        })
    }
}
