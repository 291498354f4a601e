use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::kind::SchemaObjectKind;

/// Installed extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub name: String,
    pub src: String,
}

/// Sequence with its rendered `CREATE SEQUENCE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub schema: String,
    pub name: String,
    pub src: String,
}

/// User-defined type (enums).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub schema: String,
    pub name: String,
    pub src: String,
}

/// Function with its full `CREATE OR REPLACE FUNCTION` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub schema: String,
    pub name: String,
    pub src: String,
}

/// View with its bare `SELECT` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub schema: String,
    pub name: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub src: String,
}

/// Trigger. `table` is the regclass text and may be quoted or schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub src: String,
}

/// Ordinary table with its columns in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub schema: String,
    pub table: String,
    pub attributes: Vec<Attribute>,
}

macro_rules! impl_kind {
    ($($record:ty => $kind:expr),* $(,)?) => {
        $(
            impl $record {
                pub const KIND: SchemaObjectKind = $kind;
            }
        )*
    };
}

impl_kind! {
    ExtensionRecord => SchemaObjectKind::Extension,
    SequenceRecord => SchemaObjectKind::Sequence,
    TypeRecord => SchemaObjectKind::Type,
    FunctionRecord => SchemaObjectKind::Function,
    ViewRecord => SchemaObjectKind::View,
    IndexRecord => SchemaObjectKind::Index,
    TriggerRecord => SchemaObjectKind::Trigger,
    TableRecord => SchemaObjectKind::Table,
}
