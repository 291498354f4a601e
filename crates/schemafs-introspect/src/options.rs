/// Options that control which catalog objects a capture collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Schemas whose objects are never captured.
    pub skip_schemas: Vec<String>,
    /// Function names left out, typically extension helpers installed as SQL functions.
    pub skip_functions: Vec<String>,
    /// Extensions left out; `plpgsql` ships with every database.
    pub skip_extensions: Vec<String>,
}

pub const DEFAULT_SKIP_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "scratch"];

pub const DEFAULT_SKIP_FUNCTIONS: &[&str] = &[
    "earth",
    "earth_box",
    "earth_distance",
    "gc_to_sec",
    "latitude",
    "ll_to_earth",
    "longitude",
    "sec_to_gc",
];

pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &["plpgsql"];

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            skip_schemas: to_strings(DEFAULT_SKIP_SCHEMAS),
            skip_functions: to_strings(DEFAULT_SKIP_FUNCTIONS),
            skip_extensions: to_strings(DEFAULT_SKIP_EXTENSIONS),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
