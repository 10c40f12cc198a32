use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    core::state::AppState,
    repos::users::UsersRepo,
    utils::{jwt::verify_jwt, response::APIError},
};

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(tok) if tok.starts_with("Bearer ") => &tok[7..],
        _ => {
            error!("Auth Failed, Missing or invalid authorization header");
            return APIError::UnAuthorized("Missing or invalid authorization header".to_string())
                .into_response();
        }
    };

    let claims = match verify_jwt(token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            error!("Auth Failed, Invalid token: {}", e);
            return APIError::UnAuthorized("Invalid token".to_string()).into_response();
        }
    };

    let users_repo = UsersRepo::new(state.database.clone());
    let user = match users_repo.get_by_id(claims.user_id).await {
        Ok(u) => u,
        Err(e) => {
            error!("User not found: {}", e);
            return APIError::UnAuthorized("User not found".to_string()).into_response();
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}
