use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::normalize::quote_if_unsafe;

/// Columns that always lead a table body, in this order.
const LEADING_COLUMNS: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

/// Column of a captured table, as produced by the catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    /// Type as printed by `format_type`.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub is_not_null: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub references: Option<Reference>,
}

/// Single-column foreign key target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub table: String,
    pub attribute: ReferencedAttribute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencedAttribute {
    pub name: String,
    #[serde(default)]
    pub is_primary_key: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_not_null: false,
            default_value: None,
            description: None,
            is_primary_key: false,
            references: None,
        }
    }
}

/// Order attributes for serialization.
///
/// Leading columns come first in their fixed order, then columns with a
/// reference, then the rest; names break ties. The sort is stable, so equal
/// keys keep their input order.
pub fn sorted_attributes(attributes: &[Attribute]) -> Vec<&Attribute> {
    let mut sorted: Vec<&Attribute> = attributes.iter().collect();
    sorted.sort_by(|left, right| ordering_key(left).cmp(&ordering_key(right)));
    sorted
}

fn ordering_key(attribute: &Attribute) -> (usize, u8, &str) {
    match LEADING_COLUMNS
        .iter()
        .position(|name| *name == attribute.name)
    {
        Some(position) => (position, 0, ""),
        None => {
            let reference_rank = if attribute.references.is_some() { 0 } else { 1 };
            (LEADING_COLUMNS.len(), reference_rank, attribute.name.as_str())
        }
    }
}

/// Serial shorthand for an integer type, if there is one.
pub fn serial_type_for(data_type: &str) -> Option<&'static str> {
    match data_type {
        "smallint" => Some("smallserial"),
        "integer" => Some("serial"),
        "bigint" => Some("bigserial"),
        _ => None,
    }
}

/// Name of the sequence behind a serial column, when the column's default is
/// exactly `nextval('<table>_<column>_seq'::regclass)`.
pub fn serial_sequence_name(attribute: &Attribute, table: &str) -> Option<String> {
    let sequence = format!("{table}_{}_seq", attribute.name);
    let serial_default = format!("nextval('{sequence}'::regclass)");
    (attribute.default_value.as_deref() == Some(serial_default.as_str())).then_some(sequence)
}

/// Render one column definition of a `create table` body.
pub fn attribute_to_sql(attribute: &Attribute, table: &str) -> Result<String> {
    if serial_sequence_name(attribute, table).is_some() {
        let serial_type =
            serial_type_for(&attribute.data_type).ok_or_else(|| Error::SerialMapping {
                table: table.to_string(),
                column: attribute.name.clone(),
                data_type: attribute.data_type.clone(),
            })?;
        let collapsed = Attribute {
            data_type: serial_type.to_string(),
            default_value: None,
            ..attribute.clone()
        };
        return attribute_to_sql(&collapsed, table);
    }

    let reference = attribute.references.as_ref().map(|reference| {
        if reference.attribute.is_primary_key {
            format!("/* references {} */", reference.table)
        } else {
            format!(
                "/* references {}({}) */",
                reference.table, reference.attribute.name
            )
        }
    });

    let parts = [
        Some(quote_if_unsafe(&attribute.name)),
        Some(attribute.data_type.clone()),
        attribute.is_not_null.then(|| "not null".to_string()),
        attribute
            .default_value
            .as_ref()
            .filter(|value| !value.is_empty())
            .map(|value| format!("default {value}")),
        attribute.is_primary_key.then(|| "primary key".to_string()),
        reference,
    ];

    Ok(parts.into_iter().flatten().collect::<Vec<_>>().join(" "))
}
