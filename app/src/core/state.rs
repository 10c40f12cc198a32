use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::config::Config, services::cache::CacheStore};

/// Shared handles, constructed once at startup and injected everywhere.
/// Nothing in the app reaches for a process-wide connection.
#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub config: Config,
    pub cache: Arc<dyn CacheStore>,
}
