//! Fixtures shared by unit tests.

use sea_orm::DatabaseConnection;

use crate::config::DatabaseConfig;
use crate::database::init_db;

/// Fresh in-memory SQLite database with the full schema.
pub async fn memory_db() -> DatabaseConnection {
    // One connection: every pooled connection would get its own memory database.
    init_db(&DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout_secs: 5,
        sqlx_logging: false,
    })
    .await
    .unwrap()
}
