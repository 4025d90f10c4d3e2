use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;

use crate::error::StoreError;
use crate::webhook::Rejected;

use super::activity::ActivityNote;

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    InvalidPayload { message: String, details: String },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Internal {
        message: &'static str,
        details: String,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: &'static str, details: impl ToString) -> Self {
        Self::Internal {
            message,
            details: details.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(filename) => Self::NotFound(format!("Post not found: {filename}")),
            StoreError::InvalidFilename(_) => Self::BadRequest("Invalid file type".to_string()),
            other => Self::internal("Storage error", other),
        }
    }
}

impl From<Rejected> for ApiError {
    fn from(e: Rejected) -> Self {
        Self::BadRequest(e.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::InvalidPayload {
            message: "Invalid JSON payload".to_string(),
            details: e.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::InvalidPayload {
            message: "Invalid query string".to_string(),
            details: e.body_text(),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(e: FormRejection) -> Self {
        Self::InvalidPayload {
            message: "Invalid form submission".to_string(),
            details: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match self {
            Self::InvalidPayload { message, details } => (message, Some(details)),
            Self::Internal { message, details } => {
                error!("{message}: {details}");
                (message.to_string(), Some(details))
            }
            other => (other.to_string(), None),
        };
        let note = ActivityNote::Error(error.clone());
        let mut response = (status, Json(ApiErrorBody { error, details })).into_response();
        response.extensions_mut().insert(note);
        response
    }
}
