// Closed set of failures the endpoint reports to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use tailorbook_core::StoreError;

use crate::protocol::{Envelope, NoPayload};

/// Every error a client can see. Storage failures collapse into
/// [`ApiError::Internal`]; their detail goes to the log only.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// The customer name is taken. HTTP 400.
    #[error("A customer with this name is already registered")]
    Duplicate,

    /// POST body without an `action`. HTTP 400.
    #[error("Action is required")]
    MissingAction,

    /// POST body with an `action` this endpoint does not know. HTTP 400.
    #[error("Invalid action")]
    UnknownAction,

    /// HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// HTTP 405.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Storage or other unexpected failure. HTTP 500.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Duplicate
            | ApiError::MissingAction
            | ApiError::UnknownAction => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => ApiError::Validation(message),
            StoreError::Duplicate { .. } => ApiError::Duplicate,
            StoreError::NotFound(message) => ApiError::NotFound(message),
            StoreError::Sqlite(e) => {
                error!(error = %e, "store operation failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Envelope {
            success: false,
            message: Some(self.to_string()),
            payload: NoPayload::default(),
        };
        (status, axum::Json(body)).into_response()
    }
}
