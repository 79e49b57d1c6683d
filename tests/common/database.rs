//! Test database setup
#![allow(dead_code)]

use polls::app_config::DatabaseConfig;
use sea_orm::{DatabaseConnection, DbErr};

/// A fresh in-memory SQLite database with every migration applied.
///
/// Each call gets its own database, so tests never share rows. The pool is
/// limited to one connection because every SQLite memory connection is a
/// separate database.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_owned(),
        max_connections: 1,
        sqlx_logging: false,
    };

    polls::db::init_db(&config).await
}
