pub mod cache;
pub mod snapshot;
pub mod tasks;
