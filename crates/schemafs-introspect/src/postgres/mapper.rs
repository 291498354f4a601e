use schemafs_core::{
    Attribute, CatalogRow, Error, ExtensionRecord, FunctionRecord, IndexRecord, Result,
    SequenceRecord, TableRecord, TriggerRecord, TypeRecord, ViewRecord,
};

use super::queries::quote_literal;

pub fn map_extension(row: &CatalogRow) -> Result<ExtensionRecord> {
    let name = row.text("name")?.to_string();
    let src = format!("CREATE EXTENSION IF NOT EXISTS \"{name}\"");
    Ok(ExtensionRecord { name, src })
}

pub fn map_type(row: &CatalogRow) -> Result<TypeRecord> {
    let schema = row.text("schema")?.to_string();
    let name = row.text("name")?.to_string();
    let labels: Vec<String> = serde_json::from_str(row.text("labels")?)
        .map_err(|err| Error::InvalidRecord(format!("enum labels of {schema}.{name}: {err}")))?;
    let labels = labels
        .iter()
        .map(|label| quote_literal(label))
        .collect::<Vec<_>>()
        .join(", ");
    let src = format!("CREATE TYPE \"{schema}\".\"{name}\" AS ENUM ({labels})");
    Ok(TypeRecord { schema, name, src })
}

pub fn map_sequence(row: &CatalogRow) -> Result<SequenceRecord> {
    let schema = row.text("schema")?.to_string();
    let name = row.text("name")?.to_string();
    let src = [
        format!("CREATE SEQUENCE {schema}.{name}"),
        format!("INCREMENT {}", row.text("increment")?),
        format!("MINVALUE {}", row.text("minimum_value")?),
        format!("MAXVALUE {}", row.text("maximum_value")?),
    ]
    .join("\n");
    Ok(SequenceRecord { schema, name, src })
}

pub fn map_table(row: &CatalogRow) -> Result<TableRecord> {
    let schema = row.text("schema")?.to_string();
    let table = row.text("table")?.to_string();
    // jsonb_agg yields null for a table without columns.
    let attributes: Vec<Attribute> = match row.opt_text("attributes")? {
        Some(json) => serde_json::from_str(json).map_err(|err| {
            Error::InvalidRecord(format!("attributes of {schema}.{table}: {err}"))
        })?,
        None => Vec::new(),
    };
    Ok(TableRecord {
        schema,
        table,
        attributes,
    })
}

pub fn map_function(row: &CatalogRow) -> Result<FunctionRecord> {
    Ok(FunctionRecord {
        schema: row.text("schema")?.to_string(),
        name: row.text("name")?.to_string(),
        src: row.text("src")?.to_string(),
    })
}

/// Indexes backing primary keys and unique constraints are also created by
/// their table, so every index statement becomes `IF NOT EXISTS`.
pub fn map_index(row: &CatalogRow) -> Result<IndexRecord> {
    Ok(IndexRecord {
        schema: row.text("schema")?.to_string(),
        table: row.text("table")?.to_string(),
        name: row.text("name")?.to_string(),
        src: index_if_not_exists(row.text("src")?),
    })
}

pub fn map_view(row: &CatalogRow) -> Result<ViewRecord> {
    Ok(ViewRecord {
        schema: row.text("schema")?.to_string(),
        name: row.text("name")?.to_string(),
        src: row.text("src")?.to_string(),
    })
}

pub fn map_trigger(row: &CatalogRow) -> Result<TriggerRecord> {
    Ok(TriggerRecord {
        schema: row.text("schema")?.to_string(),
        table: row.text("table")?.to_string(),
        name: row.text("name")?.to_string(),
        src: row.text("src")?.to_string(),
    })
}

pub fn map_rows<T>(rows: &[CatalogRow], map: fn(&CatalogRow) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(map).collect()
}

fn index_if_not_exists(src: &str) -> String {
    const PREFIXES: [&str; 2] = ["CREATE UNIQUE INDEX", "CREATE INDEX"];
    for prefix in PREFIXES {
        let matches = src
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            let rest = &src[prefix.len()..];
            if rest.trim_start().to_ascii_uppercase().starts_with("IF NOT EXISTS") {
                return src.to_string();
            }
            return format!("{} IF NOT EXISTS{rest}", &src[..prefix.len()]);
        }
    }
    src.to_string()
}
