use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{
    core::state::AppState,
    handlers::tasks::{
        api_index, create_task, delete_task, get_task_log, get_task_records, get_tasks_by_date,
        import_tasks, update_task,
    },
};

pub fn task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api_index))
        .route("/create-task", post(create_task))
        .route("/update-task/:task_id", post(update_task))
        .route("/delete/:task_id", delete(delete_task))
        .route("/import", post(import_tasks))
        .route("/task-records", get(get_task_records))
        .route("/task-log/:task_id", get(get_task_log))
        .route("/task/:date", get(get_tasks_by_date))
}
