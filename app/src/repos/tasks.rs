use sea_orm::{
    prelude::{Date, DateTime},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;

use crate::models::{
    task::{self, Entity as TaskEntity, Model as Task, Priority},
    task_log, user,
};

pub const RECORDS_PER_PAGE: u64 = 5;

/// One row of the task-records listing: an active task joined with its
/// assignee and a snapshot time from the task log.
#[derive(Debug, FromQueryResult, Serialize)]
pub struct TaskRecord {
    pub username: String,
    pub user_id: i32,
    pub task_id: i32,
    pub task_name: String,
    pub description: Option<String>,
    pub created_at: Date,
    pub priority: Priority,
    pub logged_at: DateTime,
}

#[derive(Debug, Serialize)]
pub struct TaskRecordPage {
    pub data: Vec<TaskRecord>,
    pub page: u64,
    pub per_page: u64,
    pub total_records: u64,
    pub total_pages: u64,
}

pub struct TasksRepo {
    db: DatabaseConnection,
}

impl TasksRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_created_date(&self, date: Date) -> Result<Vec<Task>, DbErr> {
        let tasks = TaskEntity::find()
            .filter(task::Column::CreatedAt.eq(date))
            .all(&self.db)
            .await?;

        Ok(tasks)
    }

    /// Active tasks joined with their assignee and snapshot rows, newest
    /// snapshot first. Pages are 1-based; out-of-range pages come back
    /// empty rather than erroring.
    pub async fn get_task_records(&self, page: u64) -> Result<TaskRecordPage, DbErr> {
        let page = page.max(1);

        let paginator = TaskEntity::find()
            .select_only()
            .column_as(user::Column::Username, "username")
            .column_as(user::Column::Id, "user_id")
            .column_as(task::Column::Id, "task_id")
            .column(task::Column::TaskName)
            .column(task::Column::Description)
            .column(task::Column::CreatedAt)
            .column(task::Column::Priority)
            .column(task_log::Column::LoggedAt)
            .join(JoinType::InnerJoin, task::Relation::User.def())
            .join(JoinType::InnerJoin, task::Relation::TaskLog.def())
            .filter(task::Column::IsActive.eq(true))
            .order_by_desc(task_log::Column::LoggedAt)
            .into_model::<TaskRecord>()
            .paginate(&self.db, RECORDS_PER_PAGE);

        let totals = paginator.num_items_and_pages().await?;
        let data = paginator.fetch_page(page - 1).await?;

        Ok(TaskRecordPage {
            data,
            page,
            per_page: RECORDS_PER_PAGE,
            total_records: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }
}
