use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::models::task_log::{self, Entity as TaskLogEntity, Model as TaskLog};

pub struct TaskLogsRepo {
    db: DatabaseConnection,
}

impl TaskLogsRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn first_for_task(&self, task_id: i32) -> Result<Option<TaskLog>, DbErr> {
        let log = TaskLogEntity::find()
            .filter(task_log::Column::TaskId.eq(task_id))
            .order_by_asc(task_log::Column::LoggedAt)
            .one(&self.db)
            .await?;

        Ok(log)
    }
}
