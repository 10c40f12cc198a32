use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    core::state::AppState,
    models::user::{Model as User, UserRole},
    repos::users::UsersRepo,
    utils::{
        jwt::create_jwt,
        password::{hash_password, verify_password},
        response::APIError,
    },
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, APIError> {
    if !current_user.is_admin() {
        return Err(APIError::Forbidden(
            "You are not authorized to register users.".to_string(),
        ));
    }

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(APIError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let users_repo = UsersRepo::new(state.database.clone());

    if users_repo
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up username: {}", e);
            APIError::InternalServerError("Database error".to_string())
        })?
        .is_some()
    {
        return Err(APIError::Conflict("Username already exists".to_string()));
    }

    let role = match payload.role.as_deref() {
        Some("admin") => UserRole::Admin,
        _ => UserRole::User,
    };

    let user = users_repo
        .create(
            payload.username.clone(),
            hash_password(&payload.password),
            role,
        )
        .await
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            APIError::InternalServerError("Database error".to_string())
        })?;

    info!("User registered: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User registered successfully",
            "user": user
        })),
    ))
}

pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, APIError> {
    let users_repo = UsersRepo::new(state.database.clone());

    let user = users_repo
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up username: {}", e);
            APIError::InternalServerError("Database error".to_string())
        })?
        .ok_or_else(|| APIError::UnAuthorized("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password) {
        return Err(APIError::UnAuthorized("Invalid credentials".to_string()));
    }

    let role = match user.role {
        UserRole::Admin => "admin".to_string(),
        UserRole::User => "user".to_string(),
    };

    let token = create_jwt(
        user.username.clone(),
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )
    .map_err(|e| {
        error!("Failed to create JWT: {}", e);
        APIError::InternalServerError("Failed to create session".to_string())
    })?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: token,
    }))
}

pub async fn get_profile(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(serde_json::json!({
        "username": user.username,
        "role": user.role
    }))
}
