pub mod task_logs;
pub mod tasks;
pub mod users;
