//! Targets matched by a stored target filter query.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use fleetql_core::{EntityKind, Error};
use std::sync::Arc;

use super::entity_kind;
use crate::error::ApiError;
use crate::types::{ErrorResponse, ListParams, PagedResponse};
use crate::AppState;

/// Page the targets matched by a stored filter query.
///
/// `q` is ignored; the stored query text is the filter. Sort keys refer to
/// target fields.
#[utoipa::path(
    get,
    path = "/rest/v1/{collection}/{id}/targets",
    tag = "filters",
    params(
        ("collection" = String, Path, description = "Always targetfilters"),
        ("id" = i64, Path, description = "Target filter query id"),
        ListParams
    ),
    responses(
        (status = 200, description = "Matching targets", body = PagedResponse),
        (status = 400, description = "Stored query is invalid", body = ErrorResponse),
        (status = 404, description = "Filter query not found", body = ErrorResponse)
    )
)]
pub async fn filter_targets(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PagedResponse>, ApiError> {
    if entity_kind(&collection)? != EntityKind::TargetFilterQuery {
        return Err(ApiError(Error::Validation(format!(
            "{collection} has no matched targets"
        ))));
    }
    let params = ListParams::from_pairs(pairs)?;
    let page = state.engine.page_request(
        EntityKind::Target,
        params.offset,
        params.limit,
        &params.sort,
    )?;
    let result = state
        .engine
        .targets_for_filter_query(&state.store, id, &page)?;
    Ok(Json(result.into()))
}
