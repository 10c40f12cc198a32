use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{core::state::AppState, handlers::health::check_database_connection};

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/db", get(check_database_connection))
}
