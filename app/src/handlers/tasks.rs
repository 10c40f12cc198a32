use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::Duration;
use tracing::error;

use crate::{
    core::state::AppState,
    models::user::Model as User,
    repos::{task_logs::TaskLogsRepo, tasks::TasksRepo},
    services::tasks::{NewTask, TaskChanges, TaskImportRecord, TaskService},
    utils::response::APIError,
};

pub async fn api_index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Task Management API!",
        "endpoints": {
            "GET": [
                "/tasks/task-records",
                "/tasks/task-log/{id}",
                "/tasks/task/{date}"
            ],
            "POST": [
                "/tasks/create-task",
                "/tasks/update-task/{task_id}",
                "/tasks/import"
            ],
            "DELETE": [
                "/tasks/delete/{task_id}"
            ]
        }
    }))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewTask>,
) -> Result<impl IntoResponse, APIError> {
    let service = TaskService::new(state.database.clone());
    let task = service.create(payload, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Task created successfully",
            "task": task
        })),
    ))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(task_id): Path<i32>,
    Json(changes): Json<TaskChanges>,
) -> Result<impl IntoResponse, APIError> {
    let service = TaskService::new(state.database.clone());
    let task = service.update(task_id, changes, &user).await?;

    Ok(Json(serde_json::json!({
        "message": "Task updated successfully",
        "task": task
    })))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(task_id): Path<i32>,
) -> Result<impl IntoResponse, APIError> {
    let service = TaskService::new(state.database.clone());
    service.deactivate(task_id, &user).await?;

    Ok(Json(serde_json::json!({
        "message": "Task deleted successfully"
    })))
}

pub async fn import_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(records): Json<Vec<TaskImportRecord>>,
) -> Result<impl IntoResponse, APIError> {
    let service = TaskService::new(state.database.clone());
    let imported = service.bulk_import(records, &user).await?;

    Ok(Json(serde_json::json!({
        "message": format!("Import complete. {} tasks imported successfully.", imported),
        "imported": imported
    })))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
}

fn default_page() -> u64 {
    1
}

pub async fn get_task_records(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, APIError> {
    let tasks_repo = TasksRepo::new(state.database.clone());

    let page = tasks_repo
        .get_task_records(pagination.page)
        .await
        .map_err(|e| {
            error!("Failed to fetch task records: {}", e);
            APIError::InternalServerError("Failed to fetch task records".to_string())
        })?;

    Ok(Json(page))
}

pub async fn get_task_log(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i32>,
) -> Result<impl IntoResponse, APIError> {
    let task_logs_repo = TaskLogsRepo::new(state.database.clone());

    let log = task_logs_repo
        .first_for_task(task_id)
        .await
        .map_err(|e| {
            error!("Failed to fetch task log: {}", e);
            APIError::InternalServerError("Failed to fetch task log".to_string())
        })?
        .ok_or_else(|| APIError::NotFound("Task log not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "log_id": log.id,
        "task_id": log.task_id,
        "logged_at": log.logged_at
    })))
}

pub async fn get_tasks_by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, APIError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| APIError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string()))?;

    let service = TaskService::new(state.database.clone());
    let ttl = Duration::from_secs(state.config.cache_ttl_seconds);

    let body = service
        .tasks_for_date(state.cache.as_ref(), date, ttl)
        .await?;

    // The cached serialization is returned verbatim, byte for byte.
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
