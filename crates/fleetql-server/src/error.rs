//! Mapping of engine errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fleetql_core::Error;
use serde_json::json;

use crate::types::ErrorResponse;

/// Engine error returned from a handler.
///
/// Caller mistakes become 400, missing entities 404, everything else 500.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body for the wrapped error.
    #[must_use]
    pub fn body(&self) -> ErrorResponse {
        let info = match &self.0 {
            Error::MalformedQuery(parse) => serde_json::to_value(parse).ok(),
            Error::UnknownField { entity, field } => {
                Some(json!({ "entity": entity, "field": field }))
            }
            Error::EntityNotFound { entity_type, ids } => {
                Some(json!({ "entityType": entity_type, "ids": ids }))
            }
            _ => None,
        };
        ErrorResponse {
            error_code: self.0.code().to_string(),
            exception_class: exception_class(&self.0).to_string(),
            message: self.0.to_string(),
            info,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(code = self.0.code(), error = %self.0, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

fn exception_class(err: &Error) -> &'static str {
    match err {
        Error::MalformedQuery(_) => "MalformedQuery",
        Error::UnknownField { .. } => "UnknownField",
        Error::EntityNotFound { .. } => "EntityNotFound",
        Error::Validation(_) => "Validation",
        Error::Config(_) => "Config",
        Error::Storage(_) => "Storage",
        Error::Io(_) => "Io",
        Error::Serialization(_) => "Serialization",
        Error::Internal(_) => "Internal",
    }
}
