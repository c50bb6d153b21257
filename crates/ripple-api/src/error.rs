use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error taxonomy. Everything here aborts the request before any
/// broadcast: frames are only ever published after a successful write.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Acting principal lacks permission for the requested mutation.
    #[error("{0}")]
    Forbidden(String),

    /// Input failed schema checks; rejected before any persistence.
    #[error("The given data was invalid.")]
    Validation(BTreeMap<&'static str, Vec<String>>),

    #[error("{0}")]
    NotFound(String),

    /// Datastore or task failure. Logged; clients get an opaque 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field, vec![message.into()]);
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": message })),
            )
                .into_response(),
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": errors,
                })),
            )
                .into_response(),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": message })),
            )
                .into_response(),
            Self::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
