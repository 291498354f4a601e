use serde::{Deserialize, Serialize};

/// Category of a captured DDL object.
///
/// The variant decides the file name prefix and, through [`Self::replay_bucket`],
/// where the file lands in the initial restore order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaObjectKind {
    Extension,
    Schema,
    Sequence,
    Type,
    Table,
    ForeignKey,
    Function,
    Index,
    Trigger,
    View,
}

impl SchemaObjectKind {
    pub const ALL: [SchemaObjectKind; 10] = [
        SchemaObjectKind::Extension,
        SchemaObjectKind::Schema,
        SchemaObjectKind::Sequence,
        SchemaObjectKind::Type,
        SchemaObjectKind::Table,
        SchemaObjectKind::ForeignKey,
        SchemaObjectKind::Function,
        SchemaObjectKind::Index,
        SchemaObjectKind::Trigger,
        SchemaObjectKind::View,
    ];

    /// File name prefix, including the trailing dot.
    pub fn prefix(self) -> &'static str {
        match self {
            SchemaObjectKind::Extension => "extension.",
            SchemaObjectKind::Schema => "schema.",
            SchemaObjectKind::Sequence => "sequence.",
            SchemaObjectKind::Type => "type.",
            SchemaObjectKind::Table => "table.",
            SchemaObjectKind::ForeignKey => "fk.",
            SchemaObjectKind::Function => "function.",
            SchemaObjectKind::Index => "index.",
            SchemaObjectKind::Trigger => "trigger.",
            SchemaObjectKind::View => "view.",
        }
    }

    /// Position of the kind in the initial replay order. Kinds without a
    /// dedicated bucket share the last one and sort by file name.
    pub fn replay_bucket(self) -> u8 {
        match self {
            SchemaObjectKind::Extension => 0,
            SchemaObjectKind::Schema => 1,
            SchemaObjectKind::Sequence => 2,
            SchemaObjectKind::Type => 3,
            SchemaObjectKind::Table => 4,
            _ => 5,
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<SchemaObjectKind> {
        Self::ALL
            .into_iter()
            .find(|kind| file_name.starts_with(kind.prefix()))
    }
}

/// Bucket of an arbitrary file name; unknown files go to the last bucket.
pub fn replay_bucket_for(file_name: &str) -> u8 {
    SchemaObjectKind::from_file_name(file_name)
        .map(SchemaObjectKind::replay_bucket)
        .unwrap_or(5)
}
