use axum::response::IntoResponse;

use crate::utils::response::APIError;

pub async fn global_error_handler() -> impl IntoResponse {
    APIError::NotFound("Not Found".to_string())
}
