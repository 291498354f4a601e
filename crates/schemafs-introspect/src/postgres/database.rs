//! Database-level housekeeping: names, existence checks, create and drop.

use schemafs_core::{Error, Executor, Logger, Result};

use super::queries;
use super::{PgExecutor, PoolSettings};

pub async fn database_name(executor: &dyn Executor) -> Result<String> {
    let rows = executor.query_rows(queries::DATABASE_NAME).await?;
    let row = rows
        .first()
        .ok_or_else(|| Error::InvalidRecord("current_database() returned no rows".to_string()))?;
    Ok(row.text("name")?.to_string())
}

pub async fn database_exists(executor: &dyn Executor, name: &str) -> Result<bool> {
    let rows = executor.query_rows(&queries::database_exists(name)).await?;
    match rows.first() {
        Some(row) => row.flag("exists"),
        None => Ok(false),
    }
}

pub async fn create_database(executor: &dyn Executor, name: &str) -> Result<()> {
    executor.execute(&queries::create_database(name)).await
}

pub async fn drop_database(executor: &dyn Executor, name: &str) -> Result<()> {
    executor.execute(&queries::drop_database(name)).await
}

/// Drop `name` if present, create it empty and return an executor connected to it.
///
/// `admin` must be connected to a different database on the same server.
pub async fn ensure_empty_database(
    admin: &dyn Executor,
    url: &str,
    name: &str,
    settings: &PoolSettings,
    logger: &dyn Logger,
) -> Result<PgExecutor> {
    if database_exists(admin, name).await? {
        logger.info(&format!("dropping existing database: {name}"));
        drop_database(admin, name).await?;
    }
    logger.info(&format!("creating database: {name}"));
    create_database(admin, name).await?;
    PgExecutor::connect_to_database(url, name, settings).await
}
