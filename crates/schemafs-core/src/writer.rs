use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::attribute::{attribute_to_sql, sorted_attributes};
use crate::error::Result;
use crate::kind::SchemaObjectKind;
use crate::logger::Logger;
use crate::normalize::{normalize_source, quote_if_unsafe, unquote_qualified};
use crate::records::{
    ExtensionRecord, FunctionRecord, IndexRecord, SequenceRecord, TableRecord, TriggerRecord,
    TypeRecord, ViewRecord,
};

/// Writes catalog records as one `.sql` file each into a flat directory.
pub struct SchemaWriter<'a> {
    root: PathBuf,
    logger: &'a dyn Logger,
}

impl<'a> SchemaWriter<'a> {
    pub fn new(root: impl Into<PathBuf>, logger: &'a dyn Logger) -> Self {
        Self {
            root: root.into(),
            logger,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove everything under the root and recreate it empty.
    pub fn clean(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn write_extension(&self, extension: &ExtensionRecord) -> Result<PathBuf> {
        let file = self.file_name(SchemaObjectKind::Extension, &[extension.name.as_str()]);
        self.write_safe(&file, &extension.src)
    }

    pub fn write_schema(&self, schema: &str) -> Result<PathBuf> {
        let file = self.file_name(SchemaObjectKind::Schema, &[schema]);
        self.write_safe(&file, &format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
    }

    pub fn write_sequence(&self, sequence: &SequenceRecord) -> Result<PathBuf> {
        let file = self.file_name(SchemaObjectKind::Sequence, &[sequence.schema.as_str(), sequence.name.as_str()]);
        self.write_safe(&file, &sequence.src)
    }

    pub fn write_type(&self, ty: &TypeRecord) -> Result<PathBuf> {
        let file = self.file_name(SchemaObjectKind::Type, &[ty.schema.as_str(), ty.name.as_str()]);
        self.write_safe(&file, &normalize_source(&ty.src))
    }

    pub fn write_function(&self, function: &FunctionRecord) -> Result<PathBuf> {
        let file = self.file_name(SchemaObjectKind::Function, &[function.schema.as_str(), function.name.as_str()]);
        self.write_safe(&file, &normalize_source(&function.src))
    }

    pub fn write_index(&self, index: &IndexRecord) -> Result<PathBuf> {
        let file = self.file_name(
            SchemaObjectKind::Index,
            &[index.schema.as_str(), index.table.as_str(), index.name.as_str()],
        );
        self.write_safe(&file, &index.src)
    }

    pub fn write_view(&self, view: &ViewRecord) -> Result<PathBuf> {
        let file = self.file_name(SchemaObjectKind::View, &[view.schema.as_str(), view.name.as_str()]);
        let sql = format!(
            "CREATE OR REPLACE VIEW {}.{} AS\n{}\n",
            view.schema, view.name, view.src
        );
        self.write_safe(&file, &sql)
    }

    /// Only the file name loses the table quoting; the statement is kept verbatim.
    pub fn write_trigger(&self, trigger: &TriggerRecord) -> Result<PathBuf> {
        let table = unquote_qualified(&trigger.table);
        let file = self.file_name(
            SchemaObjectKind::Trigger,
            &[trigger.schema.as_str(), table.as_str(), trigger.name.as_str()],
        );
        self.write_safe(&file, &format!("{}\n", trigger.src))
    }

    /// Write the `create table` file followed by one `fk.` file per
    /// referencing column. Returns every path written, table first.
    ///
    /// Foreign keys live in their own files so tables can be created in any
    /// order and the constraints applied once all of them exist.
    pub fn write_table(&self, table: &TableRecord) -> Result<Vec<PathBuf>> {
        let TableRecord {
            schema,
            table: name,
            attributes,
        } = table;

        let columns = sorted_attributes(attributes)
            .into_iter()
            .map(|attribute| attribute_to_sql(attribute, name).map(|sql| format!("  {sql}")))
            .collect::<Result<Vec<_>>>()?;
        let body = [
            format!("create table {schema}.{name} ("),
            columns.join(",\n"),
            ");\n".to_string(),
        ]
        .join("\n");

        let mut written = Vec::new();
        let file = self.file_name(SchemaObjectKind::Table, &[schema.as_str(), name.as_str()]);
        written.push(self.write_safe(&file, &body)?);

        for attribute in attributes {
            let Some(reference) = &attribute.references else {
                continue;
            };
            let fk_name = quote_if_unsafe(&format!("{}_fk", attribute.name));
            let target_column = if reference.attribute.is_primary_key {
                String::new()
            } else {
                format!(" ({})", reference.attribute.name)
            };
            let sql = [
                format!("ALTER TABLE {schema}.{name}"),
                format!("ADD CONSTRAINT {fk_name}"),
                format!("FOREIGN KEY ({})", quote_if_unsafe(&attribute.name)),
                format!("REFERENCES {}{target_column}", reference.table),
            ]
            .join("\n");
            let file = self.file_name(SchemaObjectKind::ForeignKey, &[schema.as_str(), name.as_str(), fk_name.as_str()]);
            written.push(self.write_safe(&file, &sql)?);
        }

        Ok(written)
    }

    fn file_name(&self, kind: SchemaObjectKind, parts: &[&str]) -> String {
        format!("{}{}.sql", kind.prefix(), parts.join("."))
    }

    /// Write `content` to `file` under the root, never overwriting: a taken
    /// path gets the first free `_v2`, `_v3`, ... suffix and a warning.
    fn write_safe(&self, file: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(file);
        if create_new(&path, content)? {
            return Ok(path);
        }

        let db_name = self
            .root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.logger.warn(&format!(
            "File already exists for db '{db_name}': {}",
            path.display()
        ));

        let mut version = 2;
        loop {
            let versioned = self.root.join(format!("{file}_v{version}"));
            if create_new(&versioned, content)? {
                return Ok(versioned);
            }
            version += 1;
        }
    }
}

/// Create `path` with `content`. Returns `false` when the path is taken.
fn create_new(path: &Path, content: &str) -> Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(content.as_bytes())?;
            file.flush()?;
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, Reference, ReferencedAttribute};
    use crate::logger::{LogLevel, MemoryLogger, NoopLogger};

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    fn listing(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn clean_empties_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dump");
        let logger = NoopLogger;
        let writer = SchemaWriter::new(&root, &logger);

        writer.write_schema("stale").unwrap();
        writer.clean().unwrap();

        assert!(root.is_dir());
        assert!(listing(&root).is_empty());
    }

    #[test]
    fn collisions_get_versioned_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MemoryLogger::new();
        let writer = SchemaWriter::new(dir.path(), &logger);
        let function = FunctionRecord {
            schema: "public".to_string(),
            name: "touch".to_string(),
            src: "select 1".to_string(),
        };

        let first = writer.write_function(&function).unwrap();
        let second = writer
            .write_function(&FunctionRecord {
                src: "select 2".to_string(),
                ..function.clone()
            })
            .unwrap();
        let third = writer.write_function(&function).unwrap();

        assert!(first.ends_with("function.public.touch.sql"));
        assert!(second.ends_with("function.public.touch.sql_v2"));
        assert!(third.ends_with("function.public.touch.sql_v3"));
        assert_eq!(read(&first), "select 1");
        assert_eq!(read(&second), "select 2");
        assert_eq!(logger.messages(LogLevel::Warn).len(), 2);
    }

    #[test]
    fn collisions_never_overwrite_existing_versions() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MemoryLogger::new();
        let writer = SchemaWriter::new(dir.path(), &logger);
        fs::write(dir.path().join("schema.app.sql"), "first").unwrap();
        fs::write(dir.path().join("schema.app.sql_v2"), "second").unwrap();

        let written = writer.write_schema("app").unwrap();

        assert!(written.ends_with("schema.app.sql_v3"));
        assert_eq!(read(&dir.path().join("schema.app.sql")), "first");
        assert_eq!(read(&dir.path().join("schema.app.sql_v2")), "second");
        assert_eq!(read(&written), "CREATE SCHEMA IF NOT EXISTS \"app\"");
        assert_eq!(logger.messages(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn writes_table_and_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let logger = NoopLogger;
        let writer = SchemaWriter::new(dir.path(), &logger);
        let table = TableRecord {
            schema: "public".to_string(),
            table: "orders".to_string(),
            attributes: vec![
                Attribute {
                    references: Some(Reference {
                        table: "users".to_string(),
                        attribute: ReferencedAttribute {
                            name: "id".to_string(),
                            is_primary_key: true,
                        },
                    }),
                    is_not_null: true,
                    ..Attribute::new("user", "bigint")
                },
                Attribute::new("total", "numeric(10,2)"),
                Attribute {
                    default_value: Some("nextval('orders_id_seq'::regclass)".to_string()),
                    is_not_null: true,
                    is_primary_key: true,
                    ..Attribute::new("id", "integer")
                },
                Attribute {
                    references: Some(Reference {
                        table: "app.coupons".to_string(),
                        attribute: ReferencedAttribute {
                            name: "code".to_string(),
                            is_primary_key: false,
                        },
                    }),
                    ..Attribute::new("coupon_code", "text")
                },
            ],
        };

        let written = writer.write_table(&table).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(
            read(&written[0]),
            "create table public.orders (\n  id serial not null primary key,\n  coupon_code text /* references app.coupons(code) */,\n  \"user\" bigint not null /* references users */,\n  total numeric(10,2)\n);\n"
        );
        assert_eq!(
            listing(dir.path()),
            vec![
                "fk.public.orders.coupon_code_fk.sql",
                "fk.public.orders.user_fk.sql",
                "table.public.orders.sql",
            ]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
        );
        assert_eq!(
            read(&dir.path().join("fk.public.orders.coupon_code_fk.sql")),
            "ALTER TABLE public.orders\nADD CONSTRAINT coupon_code_fk\nFOREIGN KEY (coupon_code)\nREFERENCES app.coupons (code)"
        );
        assert_eq!(
            read(&written[1]),
            "ALTER TABLE public.orders\nADD CONSTRAINT user_fk\nFOREIGN KEY (\"user\")\nREFERENCES users"
        );
    }

    #[test]
    fn wraps_views_and_triggers() {
        let dir = tempfile::tempdir().unwrap();
        let logger = NoopLogger;
        let writer = SchemaWriter::new(dir.path(), &logger);

        let view = writer
            .write_view(&ViewRecord {
                schema: "app".to_string(),
                name: "active_users".to_string(),
                src: " SELECT users.id\n   FROM app.users;".to_string(),
            })
            .unwrap();
        assert!(view.ends_with("view.app.active_users.sql"));
        assert_eq!(
            read(&view),
            "CREATE OR REPLACE VIEW app.active_users AS\n SELECT users.id\n   FROM app.users;\n"
        );

        let trigger_src = "CREATE TRIGGER touch BEFORE UPDATE ON app.\"order\" FOR EACH ROW EXECUTE FUNCTION app.touch()";
        let trigger = writer
            .write_trigger(&TriggerRecord {
                schema: "app".to_string(),
                table: "\"order\"".to_string(),
                name: "touch".to_string(),
                src: trigger_src.to_string(),
            })
            .unwrap();
        assert!(trigger.ends_with("trigger.app.order.touch.sql"));
        assert_eq!(read(&trigger), format!("{trigger_src}\n"));

        let qualified = writer
            .write_trigger(&TriggerRecord {
                schema: "app".to_string(),
                table: "app.\"order\"".to_string(),
                name: "audit".to_string(),
                src: "CREATE TRIGGER audit AFTER INSERT ON app.\"order\" FOR EACH ROW EXECUTE FUNCTION app.audit()".to_string(),
            })
            .unwrap();
        assert!(qualified.ends_with("trigger.app.app.order.audit.sql"));
    }

    #[test]
    fn normalizes_function_and_type_sources() {
        let dir = tempfile::tempdir().unwrap();
        let logger = NoopLogger;
        let writer = SchemaWriter::new(dir.path(), &logger);

        let function = writer
            .write_function(&FunctionRecord {
                schema: "public".to_string(),
                name: "one".to_string(),
                src: "CREATE FUNCTION one()\r\n\tRETURNS int".to_string(),
            })
            .unwrap();
        assert_eq!(read(&function), "CREATE FUNCTION one()\n  RETURNS int");

        let schema = writer.write_schema("public").unwrap();
        assert!(schema.ends_with("schema.public.sql"));
        assert_eq!(read(&schema), "CREATE SCHEMA IF NOT EXISTS \"public\"");

        let extension = writer
            .write_extension(&ExtensionRecord {
                name: "uuid-ossp".to_string(),
                src: "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"".to_string(),
            })
            .unwrap();
        assert!(extension.ends_with("extension.uuid-ossp.sql"));
    }

    #[test]
    fn serial_gap_aborts_table_write() {
        let dir = tempfile::tempdir().unwrap();
        let logger = NoopLogger;
        let writer = SchemaWriter::new(dir.path(), &logger);
        let table = TableRecord {
            schema: "public".to_string(),
            table: "t".to_string(),
            attributes: vec![Attribute {
                default_value: Some("nextval('t_id_seq'::regclass)".to_string()),
                ..Attribute::new("id", "numeric")
            }],
        };

        assert!(writer.write_table(&table).is_err());
        assert!(listing(dir.path()).is_empty());
    }
}
