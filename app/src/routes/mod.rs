pub mod health;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use crate::{
    core::state::AppState,
    middlewares::auth::require_auth,
    routes::{health::health_routes, tasks::task_routes, users::user_routes},
    utils::global_error_handler::global_error_handler,
};

pub fn create_routers(state: Arc<AppState>) -> Router<()> {
    let public_routes = Router::new()
        .nest("/users", user_routes())
        .nest("/health", health_routes());

    let protected_routes = Router::new()
        .nest("/tasks", task_routes())
        .nest("/users", protected_user_routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .fallback(global_error_handler)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn protected_user_routes() -> Router<Arc<AppState>> {
    use crate::handlers::auth::{get_profile, register_user};
    use axum::routing::{get, post};

    Router::new()
        .route("/register", post(register_user))
        .route("/profile", get(get_profile))
}
