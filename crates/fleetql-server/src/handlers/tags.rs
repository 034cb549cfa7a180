//! Batch tag assignment handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::entity_kind;
use crate::error::ApiError;
use crate::types::{AssignmentRequest, AssignmentResponse, ErrorResponse, PolicyParams};
use crate::AppState;

/// Assign a tag to targets or distribution sets.
///
/// Keys are ids or business keys, e.g. `{"keys": [1, "dev-42"]}`.
#[utoipa::path(
    post,
    path = "/rest/v1/{collection}/{id}/assigned",
    tag = "tags",
    params(
        ("collection" = String, Path, description = "targettags or distributionsettags"),
        ("id" = i64, Path, description = "Tag id"),
        PolicyParams
    ),
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Tag assigned", body = AssignmentResponse),
        (status = 400, description = "Invalid policy or collection", body = ErrorResponse),
        (status = 404, description = "Tag or tagged entities not found", body = ErrorResponse)
    )
)]
pub async fn assign_tag(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
    Query(params): Query<PolicyParams>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let kind = entity_kind(&collection)?;
    let outcome = state.store.assign_tag(kind, id, &req.keys, params.policy()?)?;
    Ok(Json(outcome.into()))
}

/// Remove a tag from targets or distribution sets.
#[utoipa::path(
    delete,
    path = "/rest/v1/{collection}/{id}/assigned",
    tag = "tags",
    params(
        ("collection" = String, Path, description = "targettags or distributionsettags"),
        ("id" = i64, Path, description = "Tag id"),
        PolicyParams
    ),
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Tag removed", body = AssignmentResponse),
        (status = 400, description = "Invalid policy or collection", body = ErrorResponse),
        (status = 404, description = "Tag or tagged entities not found", body = ErrorResponse)
    )
)]
pub async fn unassign_tag(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
    Query(params): Query<PolicyParams>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let kind = entity_kind(&collection)?;
    let outcome = state.store.unassign_tag(kind, id, &req.keys, params.policy()?)?;
    Ok(Json(outcome.into()))
}
