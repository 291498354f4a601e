use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Capability to run SQL against a single logical database session.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run one statement, discarding any result rows.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Run a query whose columns are all text (or cast to text).
    async fn query_rows(&self, sql: &str) -> Result<Vec<CatalogRow>>;
}

/// One result row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    values: BTreeMap<String, Option<String>>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and adapters.
    pub fn with(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.insert(column, value.map(str::to_string));
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.values.insert(column.into(), value);
    }

    /// Non-null text value of `column`.
    pub fn text(&self, column: &str) -> Result<&str> {
        self.opt_text(column)?
            .ok_or_else(|| Error::InvalidRecord(format!("column {column} is null")))
    }

    /// Text value of `column`, `None` when SQL null.
    pub fn opt_text(&self, column: &str) -> Result<Option<&str>> {
        self.values
            .get(column)
            .map(|value| value.as_deref())
            .ok_or_else(|| Error::InvalidRecord(format!("column {column} missing from row")))
    }

    /// Boolean in Postgres text form (`t`/`f`, `true`/`false`).
    pub fn flag(&self, column: &str) -> Result<bool> {
        match self.text(column)? {
            "t" | "true" => Ok(true),
            "f" | "false" => Ok(false),
            other => Err(Error::InvalidRecord(format!(
                "column {column} is not a boolean: {other}"
            ))),
        }
    }
}
