pub mod audit_log;
pub mod task;
pub mod task_log;
pub mod user;
