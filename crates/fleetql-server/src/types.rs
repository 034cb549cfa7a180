//! Request/Response types for the FleetQL REST API.

use fleetql_core::{BatchOutcome, EntityKey, Error, NotFoundPolicy, PageResult};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

// ============================================================================
// Query parameters
// ============================================================================

/// Filtering and paging parameters of list endpoints.
///
/// Built from raw query pairs so that `sort` may repeat.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// RSQL filter expression.
    #[param(example = "name==edge*;updateStatus=in=(pending,error)")]
    pub q: Option<String>,
    /// Rows to skip, clamped to zero.
    #[param(example = 0)]
    pub offset: Option<i64>,
    /// Page size, clamped into `[1, max_limit]`.
    #[param(example = 50)]
    pub limit: Option<i64>,
    /// `FIELD:ASC|DESC` sort keys, comma separated or repeated.
    #[param(example = json!(["name:ASC", "id:DESC"]))]
    pub sort: Vec<String>,
}

impl ListParams {
    /// Collects the known parameters, ignoring unknown ones.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `offset` or `limit` is not an integer.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "q" => params.q = Some(value),
                "offset" => params.offset = Some(integer(&key, &value)?),
                "limit" => params.limit = Some(integer(&key, &value)?),
                "sort" => params.sort.push(value),
                _ => {}
            }
        }
        Ok(params)
    }
}

fn integer(name: &str, value: &str) -> Result<i64, ApiError> {
    value.trim().parse().map_err(|_| {
        ApiError(Error::Validation(format!(
            "{name} must be an integer, got '{value}'"
        )))
    })
}

/// Parameters of batch assignment endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PolicyParams {
    /// How unknown identifiers are handled: `FAIL`, `ON_WHAT_FOUND_AND_FAIL`
    /// or `ON_WHAT_FOUND_AND_SUCCESS`.
    #[param(example = "FAIL")]
    pub on_not_found_policy: Option<String>,
}

impl PolicyParams {
    /// Parsed policy, defaulting to fail-on-any-missing.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown policy name.
    pub fn policy(&self) -> Result<NotFoundPolicy, ApiError> {
        Ok(self
            .on_not_found_policy
            .as_deref()
            .map(str::parse::<NotFoundPolicy>)
            .transpose()?
            .unwrap_or_default())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Entities a tag is assigned to or removed from.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignmentRequest {
    /// Numeric ids or business keys, e.g. `[1, "dev-42"]`.
    #[schema(value_type = Vec<Object>)]
    pub keys: Vec<EntityKey>,
}

// ============================================================================
// Responses
// ============================================================================

/// One page of entities.
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse {
    /// Entities of this page.
    pub content: Vec<serde_json::Value>,
    /// Number of matching entities across all pages.
    pub total: u64,
    /// Number of entities in `content`.
    pub size: usize,
}

impl From<PageResult<serde_json::Value>> for PagedResponse {
    fn from(page: PageResult<serde_json::Value>) -> Self {
        Self {
            content: page.content,
            total: page.total,
            size: page.size,
        }
    }
}

/// Result of a tag assignment or unassignment.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    /// Ids of the entities the change was applied to.
    pub applied: Vec<i64>,
    /// Entities whose tag set actually changed.
    pub changed: usize,
}

impl From<BatchOutcome<i64, usize>> for AssignmentResponse {
    fn from(outcome: BatchOutcome<i64, usize>) -> Self {
        Self {
            applied: outcome.applied,
            changed: outcome.value,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Stable error code, e.g. `FQL-001`.
    #[schema(example = "FQL-001")]
    pub error_code: String,
    /// Error category.
    #[schema(example = "MalformedQuery")]
    pub exception_class: String,
    /// Human readable message.
    pub message: String,
    /// Structured details, when the error carries any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<serde_json::Value>,
}
