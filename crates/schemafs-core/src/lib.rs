//! Core engine for schemafs.
//!
//! Turns catalog records into a flat directory of `.sql` files and replays
//! such a directory against an empty database. Catalog queries and the
//! database connection live in adapter crates; this crate only sees them
//! through the [`Executor`] capability.

pub mod attribute;
pub mod error;
pub mod executor;
pub mod kind;
pub mod logger;
pub mod normalize;
pub mod records;
pub mod references;
pub mod restorer;
pub mod writer;

pub use attribute::{
    Attribute, Reference, ReferencedAttribute, attribute_to_sql, serial_sequence_name,
    serial_type_for, sorted_attributes,
};
pub use error::{Error, Result};
pub use executor::{CatalogRow, Executor};
pub use kind::SchemaObjectKind;
pub use logger::{LogLevel, LogRecord, Logger, MemoryLogger, NoopLogger, TracingLogger};
pub use normalize::{
    normalize_optional_source, normalize_source, quote_if_unsafe, unquote, unquote_qualified,
};
pub use records::{
    ExtensionRecord, FunctionRecord, IndexRecord, SequenceRecord, TableRecord, TriggerRecord,
    TypeRecord, ViewRecord,
};
pub use references::{
    extract_function_references, extract_table_references, file_matches_identifier,
};
pub use restorer::{RestoreReport, SchemaRestorer, initial_order};
pub use writer::SchemaWriter;
