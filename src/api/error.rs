use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ErrorResponse;
use crate::services::TenderError;

#[derive(Debug)]
pub enum ApiError {
    /// Upstream failed and there was no cached data to fall back on.
    Upstream(String),

    ValidationError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Upstream(msg) => {
                tracing::error!("No cached tenders available: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = ErrorResponse::new(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<TenderError> for ApiError {
    fn from(err: TenderError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
