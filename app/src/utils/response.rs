use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::services::tasks::TaskError;

pub enum APIError {
    BadRequest(String),
    UnAuthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(String),
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::UnAuthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (
            status,
            Json(serde_json::json!({"status": "error", "error": msg})),
        )
            .into_response()
    }
}

impl From<TaskError> for APIError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(msg) => APIError::BadRequest(msg),
            TaskError::NotFound(msg) => APIError::NotFound(msg),
            TaskError::Unauthorized(msg) => APIError::Forbidden(msg),
            TaskError::Consistency(msg) => APIError::InternalServerError(msg),
            TaskError::Store(e) => {
                tracing::error!("Store error: {}", e);
                APIError::InternalServerError("Database error".to_string())
            }
        }
    }
}
