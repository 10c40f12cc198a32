use chrono::Utc;
use sea_orm::{
    prelude::Date, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::{
    models::{
        audit_log::{self, Entity as AuditLogEntity},
        task::{self, Entity as TaskEntity, Model as Task, Priority},
        user::{self, Entity as UserEntity, Model as User, UserRole},
    },
    repos::tasks::TasksRepo,
    services::cache::CacheStore,
    utils::password::hash_password,
};

pub const STATE_TASK_ADDED: &str = "Task added";
pub const STATE_TASK_UPDATED: &str = "Task updated";

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Store error: {0}")]
    Store(#[from] DbErr),
}

#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub task_name: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub created_at: Option<Date>,
    pub assigned_user: Option<i32>,
}

/// Partial update: absent fields are left untouched. The nullable fields
/// use a double Option so an explicit null in the payload (clear the
/// field) is distinguishable from the field being absent.
#[derive(Debug, Default, Deserialize)]
pub struct TaskChanges {
    pub task_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub priority: Option<String>,
    pub created_at: Option<Date>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_user: Option<Option<i32>>,
}

/// Wraps the inner deserialization so a present-but-null field becomes
/// `Some(None)` instead of collapsing into the serde default `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// A validated record arriving from a bulk import. Parsing and column
/// validation happen upstream; this is already typed data.
#[derive(Debug, Deserialize)]
pub struct TaskImportRecord {
    pub task_name: String,
    pub description: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub priority: Option<String>,
    pub created_at: Option<Date>,
    pub assigned_user: Option<String>,
}

fn default_is_active() -> bool {
    true
}

pub struct TaskService {
    db: DatabaseConnection,
}

impl TaskService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new task and its "Task added" audit entry in one
    /// transaction.
    pub async fn create(&self, new_task: NewTask, actor: &User) -> Result<Task, TaskError> {
        require_admin(actor)?;

        if new_task.task_name.trim().is_empty() {
            return Err(TaskError::Validation("task_name is required".to_string()));
        }

        let action_by = actor.id.to_string();

        self.db
            .transaction(move |txn| {
                Box::pin(async move {
                    let task = insert_task(
                        txn,
                        new_task.task_name,
                        new_task.description,
                        true,
                        new_task
                            .priority
                            .as_deref()
                            .map(Priority::normalize)
                            .unwrap_or(Priority::Low),
                        new_task.created_at,
                        new_task.assigned_user,
                    )
                    .await?;

                    append_audit(txn, task.id, None, STATE_TASK_ADDED, &action_by).await?;

                    Ok(task)
                })
            })
            .await
            .map_err(flatten_txn_err)
    }

    /// Apply a partial update, then append an audit entry whose
    /// previous-state is sourced from the most recent entry for the task.
    /// A task with no audit history gets previous-state NULL.
    pub async fn update(
        &self,
        task_id: i32,
        changes: TaskChanges,
        actor: &User,
    ) -> Result<Task, TaskError> {
        require_admin(actor)?;

        let action_by = actor.id.to_string();

        self.db
            .transaction(move |txn| {
                Box::pin(async move {
                    let task = TaskEntity::find_by_id(task_id).one(txn).await?.ok_or_else(
                        || TaskError::NotFound(format!("Task {} not found", task_id)),
                    )?;

                    let mut active: task::ActiveModel = task.into();
                    apply_changes(&mut active, changes);
                    let task = active.update(txn).await?;

                    let previous = latest_audit(txn, task_id).await?.map(|e| e.current_state);
                    if previous.is_none() {
                        warn!(
                            "Task {} has no audit history, recording previous state as null",
                            task_id
                        );
                    }

                    append_audit(txn, task.id, previous, STATE_TASK_UPDATED, &action_by).await?;

                    Ok(task)
                })
            })
            .await
            .map_err(flatten_txn_err)
    }

    /// Soft delete. Deactivating an already-inactive task is a no-op and
    /// writes no audit entry.
    pub async fn deactivate(&self, task_id: i32, actor: &User) -> Result<Task, TaskError> {
        require_admin(actor)?;

        let action_by = actor.id.to_string();

        self.db
            .transaction(move |txn| {
                Box::pin(async move {
                    let task = TaskEntity::find_by_id(task_id).one(txn).await?.ok_or_else(
                        || TaskError::NotFound(format!("Task {} not found", task_id)),
                    )?;

                    if !task.is_active {
                        info!("Task {} is already inactive, nothing to do", task_id);
                        return Ok(task);
                    }

                    let previous = task.is_active.to_string();

                    let mut active: task::ActiveModel = task.into();
                    active.is_active = Set(false);
                    let task = active.update(txn).await?;

                    append_audit(txn, task.id, Some(previous), "false", &action_by).await?;

                    Ok(task)
                })
            })
            .await
            .map_err(flatten_txn_err)
    }

    /// Insert a batch of validated records and their audit entries in one
    /// transaction. Unknown assignees are created as regular users with a
    /// derived default password. Returns the number of tasks inserted.
    pub async fn bulk_import(
        &self,
        records: Vec<TaskImportRecord>,
        actor: &User,
    ) -> Result<u64, TaskError> {
        require_admin(actor)?;

        if let Some(bad) = records.iter().find(|r| r.task_name.trim().is_empty()) {
            return Err(TaskError::Validation(format!(
                "task_name is required, got an empty name (assigned_user: {:?})",
                bad.assigned_user
            )));
        }

        let action_by = actor.id.to_string();

        self.db
            .transaction(move |txn| {
                Box::pin(async move {
                    let mut count: u64 = 0;

                    for record in records {
                        let assigned_user = match record.assigned_user {
                            Some(username) => Some(resolve_user(txn, &username).await?),
                            None => None,
                        };

                        let task = insert_task(
                            txn,
                            record.task_name,
                            record.description,
                            record.is_active,
                            record
                                .priority
                                .as_deref()
                                .map(Priority::normalize)
                                .unwrap_or(Priority::Low),
                            record.created_at,
                            assigned_user,
                        )
                        .await?;

                        append_audit(txn, task.id, None, STATE_TASK_ADDED, &action_by).await?;
                        count += 1;
                    }

                    Ok(count)
                })
            })
            .await
            .map_err(flatten_txn_err)
    }

    /// Read-through cache for the "tasks created on date D" query. A hit
    /// returns the cached serialization verbatim; a miss queries, caches
    /// for `ttl` and returns the fresh serialization. An empty result is
    /// a NotFound and is never cached.
    pub async fn tasks_for_date(
        &self,
        cache: &dyn CacheStore,
        date: Date,
        ttl: Duration,
    ) -> Result<String, TaskError> {
        let key = date_cache_key(date);

        if let Some(cached) = cache.get(&key).await {
            info!("Cache hit for {}", key);
            return Ok(cached);
        }

        let tasks = TasksRepo::new(self.db.clone())
            .get_by_created_date(date)
            .await?;

        if tasks.is_empty() {
            return Err(TaskError::NotFound(format!(
                "No task found for the date {}",
                date
            )));
        }

        let body = serde_json::to_string(&tasks)
            .map_err(|e| TaskError::Consistency(format!("Failed to serialize task list: {}", e)))?;

        cache.set(&key, body.clone(), ttl).await;
        cache.expire(&key, ttl).await;

        Ok(body)
    }
}

pub fn date_cache_key(date: Date) -> String {
    format!("task:{}", date)
}

fn require_admin(actor: &User) -> Result<(), TaskError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(TaskError::Unauthorized(format!(
            "User {} is not authorized to modify tasks",
            actor.username
        )))
    }
}

fn apply_changes(task: &mut task::ActiveModel, changes: TaskChanges) {
    if let Some(name) = changes.task_name {
        task.task_name = Set(name);
    }
    if let Some(description) = changes.description {
        task.description = Set(description);
    }
    if let Some(is_active) = changes.is_active {
        task.is_active = Set(is_active);
    }
    if let Some(priority) = changes.priority {
        task.priority = Set(Priority::normalize(&priority));
    }
    if let Some(created_at) = changes.created_at {
        task.created_at = Set(created_at);
    }
    if let Some(assigned_user) = changes.assigned_user {
        task.assigned_user = Set(assigned_user);
    }
}

async fn insert_task<C: ConnectionTrait>(
    conn: &C,
    task_name: String,
    description: Option<String>,
    is_active: bool,
    priority: Priority,
    created_at: Option<Date>,
    assigned_user: Option<i32>,
) -> Result<Task, DbErr> {
    let task_model = task::ActiveModel {
        task_name: Set(task_name),
        description: Set(description),
        is_active: Set(is_active),
        priority: Set(priority),
        created_at: Set(created_at.unwrap_or_else(|| Utc::now().date_naive())),
        assigned_user: Set(assigned_user),
        ..Default::default()
    };

    task_model.insert(conn).await
}

async fn append_audit<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    previous_state: Option<String>,
    current_state: &str,
    action_by: &str,
) -> Result<audit_log::Model, DbErr> {
    let entry = audit_log::ActiveModel {
        task_id: Set(task_id),
        previous_state: Set(previous_state),
        current_state: Set(current_state.to_string()),
        action_by: Set(action_by.to_string()),
        timestamp: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    entry.insert(conn).await
}

/// Most recent audit entry for a task, ties on timestamp broken by id.
async fn latest_audit<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
) -> Result<Option<audit_log::Model>, DbErr> {
    AuditLogEntity::find()
        .filter(audit_log::Column::TaskId.eq(task_id))
        .order_by_desc(audit_log::Column::Timestamp)
        .order_by_desc(audit_log::Column::Id)
        .one(conn)
        .await
}

/// Find a user by username, creating one with a derived default password
/// when missing (bulk imports may reference users that do not exist yet).
async fn resolve_user<C: ConnectionTrait>(conn: &C, username: &str) -> Result<i32, DbErr> {
    let existing = UserEntity::find()
        .filter(user::Column::Username.eq(username))
        .one(conn)
        .await?;

    if let Some(user) = existing {
        return Ok(user.id);
    }

    info!("Creating missing user '{}' referenced by import", username);

    let user_model = user::ActiveModel {
        username: Set(username.to_string()),
        password: Set(hash_password(&format!("{}123", username))),
        role: Set(UserRole::User),
        ..Default::default()
    };
    let user = user_model.insert(conn).await?;

    Ok(user.id)
}

fn flatten_txn_err(err: TransactionError<TaskError>) -> TaskError {
    match err {
        TransactionError::Connection(e) => TaskError::Store(e),
        TransactionError::Transaction(e) => e,
    }
}
