//! Filtered listing, lookup and creation of entities.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use fleetql_core::{EntityKind, EntityStore, Error, NewEntityType, NewTag, NewTargetFilterQuery};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::entity_kind;
use crate::error::ApiError;
use crate::types::{ErrorResponse, ListParams, PagedResponse};
use crate::AppState;

/// List entities of a collection, filtered by an RSQL query.
#[utoipa::path(
    get,
    path = "/rest/v1/{collection}",
    tag = "entities",
    params(
        ("collection" = String, Path, description = "Collection, e.g. targets or actions"),
        ListParams
    ),
    responses(
        (status = 200, description = "One page of matching entities", body = PagedResponse),
        (status = 400, description = "Malformed query or unknown field", body = ErrorResponse),
        (status = 404, description = "Unknown collection", body = ErrorResponse)
    )
)]
pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PagedResponse>, ApiError> {
    let kind = entity_kind(&collection)?;
    let params = ListParams::from_pairs(pairs)?;
    let page = state
        .engine
        .page_request(kind, params.offset, params.limit, &params.sort)?;
    let result = state
        .engine
        .find(&state.store, kind, params.q.as_deref(), &page)?;
    Ok(Json(result.into()))
}

/// Get a single entity by id.
#[utoipa::path(
    get,
    path = "/rest/v1/{collection}/{id}",
    tag = "entities",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = i64, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Entity found", body = Object),
        (status = 404, description = "Entity not found", body = ErrorResponse)
    )
)]
pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, i64)>,
) -> Result<Json<Value>, ApiError> {
    let kind = entity_kind(&collection)?;
    state
        .store
        .get(kind, id)?
        .map(Json)
        .ok_or_else(|| ApiError(Error::not_found(kind.display_name(), [id])))
}

/// Create a tag, a type or a target filter query.
///
/// The body is validated before it is stored; the stored entity is returned.
#[utoipa::path(
    post,
    path = "/rest/v1/{collection}",
    tag = "entities",
    params(
        ("collection" = String, Path, description = "targettags, distributionsettags, *types or targetfilters")
    ),
    request_body = Object,
    responses(
        (status = 201, description = "Entity created", body = Object),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 404, description = "Unknown collection", body = ErrorResponse)
    )
)]
pub async fn create_entity(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = entity_kind(&collection)?;
    let document = match kind {
        EntityKind::TargetTag | EntityKind::DistributionSetTag => {
            decode::<NewTag>(body)?.validate()?.into_document()
        }
        EntityKind::TargetType | EntityKind::DistributionSetType | EntityKind::SoftwareModuleType => {
            decode::<NewEntityType>(body)?.validate()?.into_document()
        }
        EntityKind::TargetFilterQuery => decode::<NewTargetFilterQuery>(body)?
            .validate()?
            .into_document(),
        other => {
            return Err(ApiError(Error::Validation(format!(
                "Creating {} is not supported",
                other.display_name()
            ))))
        }
    };

    let id = state.store.insert(kind, document)?;
    tracing::info!(entity = kind.display_name(), id, "Entity created");
    let stored = state
        .store
        .get(kind, id)?
        .ok_or_else(|| Error::Internal(format!("{} {id} vanished after insert", kind.display_name())))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError(Error::Validation(e.to_string())))
}
