use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use schemafs_core::{
    Executor, ExtensionRecord, FunctionRecord, IndexRecord, Logger, Result, SchemaWriter,
    SequenceRecord, TableRecord, TriggerRecord, TypeRecord, ViewRecord, serial_sequence_name,
};

use crate::options::CaptureOptions;
use crate::postgres::mapper::{
    map_extension, map_function, map_index, map_rows, map_sequence, map_table, map_trigger,
    map_type, map_view,
};
use crate::postgres::queries;

/// Everything collected from the catalog for one capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub extensions: Vec<ExtensionRecord>,
    pub types: Vec<TypeRecord>,
    pub sequences: Vec<SequenceRecord>,
    pub tables: Vec<TableRecord>,
    pub functions: Vec<FunctionRecord>,
    pub indexes: Vec<IndexRecord>,
    pub views: Vec<ViewRecord>,
    pub triggers: Vec<TriggerRecord>,
}

/// Files written by a capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub files: Vec<PathBuf>,
    pub schemas: Vec<String>,
}

pub async fn collect_extensions(
    executor: &dyn Executor,
    opts: &CaptureOptions,
) -> Result<Vec<ExtensionRecord>> {
    let rows = executor.query_rows(&queries::extensions(opts)).await?;
    map_rows(&rows, map_extension)
}

pub async fn collect_types(executor: &dyn Executor, opts: &CaptureOptions) -> Result<Vec<TypeRecord>> {
    let rows = executor.query_rows(&queries::types(opts)).await?;
    map_rows(&rows, map_type)
}

pub async fn collect_sequences(
    executor: &dyn Executor,
    opts: &CaptureOptions,
) -> Result<Vec<SequenceRecord>> {
    let rows = executor.query_rows(&queries::sequences(opts)).await?;
    map_rows(&rows, map_sequence)
}

pub async fn collect_tables(executor: &dyn Executor, opts: &CaptureOptions) -> Result<Vec<TableRecord>> {
    let rows = executor.query_rows(&queries::tables(opts)).await?;
    map_rows(&rows, map_table)
}

pub async fn collect_functions(
    executor: &dyn Executor,
    opts: &CaptureOptions,
) -> Result<Vec<FunctionRecord>> {
    let rows = executor.query_rows(&queries::functions(opts)).await?;
    map_rows(&rows, map_function)
}

pub async fn collect_indexes(executor: &dyn Executor, opts: &CaptureOptions) -> Result<Vec<IndexRecord>> {
    let rows = executor.query_rows(&queries::indexes(opts)).await?;
    map_rows(&rows, map_index)
}

pub async fn collect_views(executor: &dyn Executor, opts: &CaptureOptions) -> Result<Vec<ViewRecord>> {
    let rows = executor.query_rows(&queries::views(opts)).await?;
    map_rows(&rows, map_view)
}

pub async fn collect_triggers(
    executor: &dyn Executor,
    opts: &CaptureOptions,
) -> Result<Vec<TriggerRecord>> {
    let rows = executor.query_rows(&queries::triggers(opts)).await?;
    map_rows(&rows, map_trigger)
}

/// Run every catalog collection concurrently.
pub async fn collect_catalog(executor: &dyn Executor, opts: &CaptureOptions) -> Result<Catalog> {
    let (extensions, types, sequences, tables, functions, indexes, views, triggers) = tokio::try_join!(
        collect_extensions(executor, opts),
        collect_types(executor, opts),
        collect_sequences(executor, opts),
        collect_tables(executor, opts),
        collect_functions(executor, opts),
        collect_indexes(executor, opts),
        collect_views(executor, opts),
        collect_triggers(executor, opts),
    )?;

    Ok(Catalog {
        extensions,
        types,
        sequences,
        tables,
        functions,
        indexes,
        views,
        triggers,
    })
}

/// Capture the database behind `executor` into the writer's root.
///
/// The root is emptied first. One `schema.` file is written per schema seen
/// on any other object, after everything else.
pub async fn capture_schema(
    executor: &dyn Executor,
    writer: &SchemaWriter<'_>,
    opts: &CaptureOptions,
    logger: &dyn Logger,
) -> Result<CaptureReport> {
    logger.info(&format!("dumping contents into: {}", writer.root().display()));
    writer.clean()?;

    let catalog = collect_catalog(executor, opts).await?;
    let report = write_catalog(writer, &catalog)?;

    logger.info(&format!(
        "captured {} files across {} schemas",
        report.files.len(),
        report.schemas.len()
    ));
    Ok(report)
}

/// Write a collected catalog. Sequences implied by a serial column are
/// skipped since the `serial` shorthand recreates them.
pub fn write_catalog(writer: &SchemaWriter<'_>, catalog: &Catalog) -> Result<CaptureReport> {
    let mut files = Vec::new();
    let mut schemas = BTreeSet::new();

    for extension in &catalog.extensions {
        files.push(writer.write_extension(extension)?);
    }
    for ty in &catalog.types {
        schemas.insert(ty.schema.clone());
        files.push(writer.write_type(ty)?);
    }
    for function in &catalog.functions {
        schemas.insert(function.schema.clone());
        files.push(writer.write_function(function)?);
    }
    for index in &catalog.indexes {
        schemas.insert(index.schema.clone());
        files.push(writer.write_index(index)?);
    }
    for view in &catalog.views {
        schemas.insert(view.schema.clone());
        files.push(writer.write_view(view)?);
    }
    for trigger in &catalog.triggers {
        schemas.insert(trigger.schema.clone());
        files.push(writer.write_trigger(trigger)?);
    }
    for table in &catalog.tables {
        schemas.insert(table.schema.clone());
        files.extend(writer.write_table(table)?);
    }

    let implied = implied_sequences(&catalog.tables);
    for sequence in &catalog.sequences {
        if implied.contains(&(sequence.schema.clone(), sequence.name.clone())) {
            continue;
        }
        schemas.insert(sequence.schema.clone());
        files.push(writer.write_sequence(sequence)?);
    }

    for schema in &schemas {
        files.push(writer.write_schema(schema)?);
    }

    Ok(CaptureReport {
        files,
        schemas: schemas.into_iter().collect(),
    })
}

fn implied_sequences(tables: &[TableRecord]) -> HashSet<(String, String)> {
    tables
        .iter()
        .flat_map(|table| {
            table.attributes.iter().filter_map(move |attribute| {
                serial_sequence_name(attribute, &table.table)
                    .map(|sequence| (table.schema.clone(), sequence))
            })
        })
        .collect()
}
