use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Column, PgPool, Row};

use schemafs_core::{CatalogRow, Error, Executor, Result};

pub mod database;
pub mod mapper;
pub mod queries;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// [`Executor`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Wrap a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self> {
        let options = PgConnectOptions::from_str(url).map_err(db_error)?;
        Self::connect_with(options, settings).await
    }

    /// Connect to `database` on the server `url` points at.
    pub async fn connect_to_database(
        url: &str,
        database: &str,
        settings: &PoolSettings,
    ) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)
            .map_err(db_error)?
            .database(database);
        Self::connect_with(options, settings).await
    }

    async fn connect_with(options: PgConnectOptions, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(db_error)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<CatalogRow>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                let mut catalog_row = CatalogRow::new();
                for (index, column) in row.columns().iter().enumerate() {
                    let value: Option<String> = row.try_get(index).map_err(db_error)?;
                    catalog_row.insert(column.name(), value);
                }
                Ok(catalog_row)
            })
            .collect()
    }
}

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}
