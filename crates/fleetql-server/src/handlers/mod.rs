//! HTTP handlers for the FleetQL REST API.
//!
//! This module organizes handlers by domain:
//! - `health`: Health check endpoint
//! - `entities`: Filtered listing, lookup and creation per collection
//! - `tags`: Batch tag assignment with not-found policies
//! - `filters`: Targets matched by stored target filter queries

pub mod entities;
pub mod filters;
pub mod health;
pub mod tags;

pub use entities::{create_entity, get_entity, list_entities};
pub use filters::filter_targets;
pub use health::health_check;
pub use tags::{assign_tag, unassign_tag};

use fleetql_core::{EntityKind, Error};

use crate::error::ApiError;

/// Resolves a `/rest/v1/{collection}` path segment.
pub(crate) fn entity_kind(collection: &str) -> Result<EntityKind, ApiError> {
    EntityKind::from_collection(collection)
        .ok_or_else(|| ApiError(Error::not_found("Collection", [collection])))
}
