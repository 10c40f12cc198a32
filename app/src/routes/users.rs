use std::sync::Arc;

use axum::{routing::post, Router};

use crate::{core::state::AppState, handlers::auth::login_user};

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login_user))
}
