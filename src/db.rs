//! Database connection setup

use crate::app_config::DatabaseConfig;
use crate::migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Open a connection pool for the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.to_owned());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(config.sqlx_logging);

    Database::connect(options).await
}

/// Apply every pending migration.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await?;
    log::info!("Database schema is up to date");
    Ok(())
}

/// Connect and bring the schema up to date. Used at process start.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let db = connect(config).await?;
    migrate(&db).await?;
    Ok(db)
}
