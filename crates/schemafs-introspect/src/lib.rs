//! Postgres catalog adapter for schemafs.
//!
//! Collects typed records from the system catalogs, provides the sqlx-backed
//! [`PgExecutor`] and drives a full capture through the core writer.

pub mod capture;
pub mod options;
pub mod postgres;

pub use capture::{Catalog, CaptureReport, capture_schema, collect_catalog, write_catalog};
pub use options::CaptureOptions;
pub use postgres::database::{
    create_database, database_exists, database_name, drop_database, ensure_empty_database,
};
pub use postgres::{PgExecutor, PoolSettings};
