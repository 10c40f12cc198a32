use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::error;

use crate::{core::state::AppState, utils::response::APIError};

pub async fn check_database_connection(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, APIError> {
    state.database.ping().await.map_err(|e| {
        error!("Database health check failed: {}", e);
        APIError::InternalServerError(format!("Database connection failed: {}", e))
    })?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Database connection is healthy"
    })))
}
