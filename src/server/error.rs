use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::backend::BackendError;
use crate::dataset::DatasetError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid request")]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Backend answered, but not with what the route needs
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Backend(BackendError::Status { status, .. }) => *status,
            AppError::Upstream(_) | AppError::Backend(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DatasetError> for AppError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::NotFound { .. } | DatasetError::Malformed { .. } => {
                AppError::NotFound("Data file not found".to_string())
            }
            DatasetError::Io { .. } => AppError::Internal(e.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

fn envelope(status: StatusCode, message: &str) -> Value {
    json!({
        "code": status.as_u16(),
        "error": message,
        "data": null,
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            // Relay the backend's own error body when it is JSON
            AppError::Backend(BackendError::Status { body, .. }) => {
                match serde_json::from_str::<Value>(&body) {
                    Ok(value) => (status, Json(value)).into_response(),
                    Err(_) => (
                        status,
                        Json(envelope(status, &format!("Backend returned HTTP {}", status.as_u16()))),
                    )
                        .into_response(),
                }
            }
            AppError::Validation(details) => {
                let mut body = envelope(status, "Invalid request");
                body["details"] = json!(details);
                (status, Json(body)).into_response()
            }
            AppError::Backend(e) => {
                error!(error = %e, "backend call failed");
                (status, Json(envelope(status, "Backend request failed"))).into_response()
            }
            AppError::Internal(e) => {
                error!(error = %format!("{:#}", e), "request failed");
                (status, Json(envelope(status, "Internal server error"))).into_response()
            }
            other => (status, Json(envelope(status, &other.to_string()))).into_response(),
        }
    }
}
