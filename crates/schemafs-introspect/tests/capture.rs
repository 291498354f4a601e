use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use schemafs_core::{
    CatalogRow, Error as CoreError, Executor, NoopLogger, SchemaWriter, normalize_source,
};
use schemafs_introspect::postgres::queries;
use schemafs_introspect::{CaptureOptions, capture_schema};

/// Answers catalog queries from canned rows keyed by the exact query text.
#[derive(Default)]
struct CannedCatalog {
    rows: HashMap<String, Vec<CatalogRow>>,
}

impl CannedCatalog {
    fn with(mut self, query: String, rows: Vec<CatalogRow>) -> Self {
        self.rows.insert(query, rows);
        self
    }
}

#[async_trait]
impl Executor for CannedCatalog {
    async fn execute(&self, _sql: &str) -> schemafs_core::Result<()> {
        Err(CoreError::Db("read-only catalog".to_string()))
    }

    async fn query_rows(&self, sql: &str) -> schemafs_core::Result<Vec<CatalogRow>> {
        Ok(self.rows.get(sql).cloned().unwrap_or_default())
    }
}

fn listing(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

const FUNCTION_SRC: &str = "CREATE OR REPLACE FUNCTION public.is_my_num_one_two_three(num integer)\r\n RETURNS boolean\r\n LANGUAGE plpgsql\r\nAS $function$\r\nBEGIN\r\n\tRETURN num IN (1, 2, 3);\r\nEND;\r\n$function$\r\n";

#[tokio::test]
async fn empty_catalog_produces_no_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("dump");
    fs::create_dir_all(&root)?;
    fs::write(root.join("table.public.stale.sql"), "create table stale ()")?;

    let logger = NoopLogger;
    let writer = SchemaWriter::new(&root, &logger);
    let report = capture_schema(
        &CannedCatalog::default(),
        &writer,
        &CaptureOptions::default(),
        &logger,
    )
    .await?;

    assert!(report.files.is_empty());
    assert!(listing(&root)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn one_function_produces_function_and_schema_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let opts = CaptureOptions::default();
    let catalog = CannedCatalog::default().with(
        queries::functions(&opts),
        vec![
            CatalogRow::new()
                .with("schema", Some("public"))
                .with("name", Some("is_my_num_one_two_three"))
                .with("src", Some(FUNCTION_SRC)),
        ],
    );

    let logger = NoopLogger;
    let writer = SchemaWriter::new(dir.path(), &logger);
    let report = capture_schema(&catalog, &writer, &opts, &logger).await?;

    assert_eq!(report.schemas, vec!["public"]);
    assert_eq!(
        listing(dir.path())?,
        vec![
            "function.public.is_my_num_one_two_three.sql",
            "schema.public.sql"
        ]
    );
    let written = fs::read_to_string(dir.path().join("function.public.is_my_num_one_two_three.sql"))?;
    assert_eq!(written, normalize_source(FUNCTION_SRC));
    Ok(())
}

#[tokio::test]
async fn captures_every_object_kind() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let opts = CaptureOptions::default();
    let catalog = CannedCatalog::default()
        .with(
            queries::extensions(&opts),
            vec![CatalogRow::new().with("name", Some("uuid-ossp"))],
        )
        .with(
            queries::types(&opts),
            vec![
                CatalogRow::new()
                    .with("schema", Some("app"))
                    .with("name", Some("status"))
                    .with("labels", Some(r#"["active", "disabled"]"#)),
            ],
        )
        .with(
            queries::sequences(&opts),
            vec![
                CatalogRow::new()
                    .with("schema", Some("app"))
                    .with("name", Some("users_id_seq"))
                    .with("increment", Some("1"))
                    .with("minimum_value", Some("1"))
                    .with("maximum_value", Some("9223372036854775807")),
                CatalogRow::new()
                    .with("schema", Some("billing"))
                    .with("name", Some("invoice_no"))
                    .with("increment", Some("1"))
                    .with("minimum_value", Some("1000"))
                    .with("maximum_value", Some("999999")),
            ],
        )
        .with(
            queries::tables(&opts),
            vec![
                CatalogRow::new()
                    .with("schema", Some("app"))
                    .with("table", Some("users"))
                    .with(
                        "attributes",
                        Some(
                            r#"[
                              {"name": "id", "type": "bigint", "isNotNull": true, "isPrimaryKey": true,
                               "defaultValue": "nextval('users_id_seq'::regclass)"},
                              {"name": "status", "type": "app.status", "isNotNull": true, "isPrimaryKey": false,
                               "defaultValue": "'active'::app.status"}
                            ]"#,
                        ),
                    ),
                CatalogRow::new()
                    .with("schema", Some("app"))
                    .with("table", Some("orders"))
                    .with(
                        "attributes",
                        Some(
                            r#"[
                              {"name": "user_id", "type": "bigint", "isNotNull": true, "isPrimaryKey": false,
                               "references": {"table": "app.users", "attribute": {"name": "id", "isPrimaryKey": true}}}
                            ]"#,
                        ),
                    ),
            ],
        )
        .with(
            queries::indexes(&opts),
            vec![
                CatalogRow::new()
                    .with("schema", Some("app"))
                    .with("table", Some("users"))
                    .with("name", Some("users_pkey"))
                    .with(
                        "src",
                        Some("CREATE UNIQUE INDEX users_pkey ON app.users USING btree (id)\n"),
                    ),
            ],
        )
        .with(
            queries::views(&opts),
            vec![
                CatalogRow::new()
                    .with("schema", Some("reporting"))
                    .with("name", Some("active_users"))
                    .with("src", Some(" SELECT users.id\n   FROM app.users;")),
            ],
        )
        .with(
            queries::triggers(&opts),
            vec![
                CatalogRow::new()
                    .with("schema", Some("app"))
                    .with("table", Some("\"order\""))
                    .with("name", Some("touch"))
                    .with("src", Some("CREATE TRIGGER touch BEFORE UPDATE ON app.\"order\" FOR EACH ROW EXECUTE FUNCTION app.touch()")),
            ],
        );

    let logger = NoopLogger;
    let writer = SchemaWriter::new(dir.path(), &logger);
    let report = capture_schema(&catalog, &writer, &opts, &logger).await?;

    assert_eq!(report.schemas, vec!["app", "billing", "reporting"]);
    assert_eq!(
        listing(dir.path())?,
        vec![
            "extension.uuid-ossp.sql",
            "fk.app.orders.user_id_fk.sql",
            "index.app.users.users_pkey.sql",
            "schema.app.sql",
            "schema.billing.sql",
            "schema.reporting.sql",
            "sequence.billing.invoice_no.sql",
            "table.app.orders.sql",
            "table.app.users.sql",
            "trigger.app.order.touch.sql",
            "type.app.status.sql",
            "view.reporting.active_users.sql",
        ]
    );
    assert_eq!(report.files.len(), 12);

    let users = fs::read_to_string(dir.path().join("table.app.users.sql"))?;
    assert_eq!(
        users,
        "create table app.users (\n  id bigserial not null primary key,\n  status app.status not null default 'active'::app.status\n);\n"
    );
    let index = fs::read_to_string(dir.path().join("index.app.users.users_pkey.sql"))?;
    assert!(index.starts_with("CREATE UNIQUE INDEX IF NOT EXISTS users_pkey"));
    let extension = fs::read_to_string(dir.path().join("extension.uuid-ossp.sql"))?;
    assert_eq!(extension, "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"");
    Ok(())
}
