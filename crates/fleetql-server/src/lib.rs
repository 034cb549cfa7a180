#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]
#![allow(clippy::needless_for_each)]
//! `FleetQL` Server - REST API library over the `FleetQL` filter engine.
//!
//! Every collection is listed at `GET /rest/v1/{collection}` and accepts the
//! query parameters `q`, `offset`, `limit` and `sort`. Batch tag assignment
//! honours `onNotFoundPolicy`.
//!
//! ## OpenAPI Documentation
//!
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod error;
mod handlers;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use fleetql_core::{FilterEngine, MemoryStore};
use std::sync::Arc;
use utoipa::OpenApi;

pub use error::ApiError;
pub use types::*;

pub use handlers::{
    assign_tag, create_entity, filter_targets, get_entity, health_check, list_entities,
    unassign_tag,
};

// ============================================================================
// OpenAPI Documentation
// ============================================================================

/// FleetQL API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FleetQL API",
        version = "0.3.0",
        description = "RSQL filtering, paging and batch tag assignment over device update fleets.",
        license(name = "EPL-2.0", url = "https://www.eclipse.org/legal/epl-2.0/")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "entities", description = "Filtered listing and creation"),
        (name = "tags", description = "Batch tag assignment"),
        (name = "filters", description = "Stored target filter queries")
    ),
    paths(
        handlers::health::health_check,
        handlers::entities::list_entities,
        handlers::entities::get_entity,
        handlers::entities::create_entity,
        handlers::tags::assign_tag,
        handlers::tags::unassign_tag,
        handlers::filters::filter_targets
    ),
    components(
        schemas(
            PagedResponse,
            AssignmentRequest,
            AssignmentResponse,
            ErrorResponse
        )
    )
)]
pub struct ApiDoc;

// ============================================================================
// Application State
// ============================================================================

/// Application state shared across handlers.
#[derive(Debug, Default)]
pub struct AppState {
    /// Query compiler with its parse cache.
    pub engine: FilterEngine,
    /// Entity documents.
    pub store: MemoryStore,
}

/// Builds the API router without middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/rest/v1/{collection}",
            get(list_entities).post(create_entity),
        )
        .route("/rest/v1/{collection}/{id}", get(get_entity))
        .route(
            "/rest/v1/{collection}/{id}/assigned",
            post(assign_tag).delete(unassign_tag),
        )
        .route("/rest/v1/{collection}/{id}/targets", get(filter_targets))
        .with_state(state)
}

// ============================================================================
// Tests
// ============================================================================
