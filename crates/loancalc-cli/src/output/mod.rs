pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Keys whose values are per-period arrays rather than summary fields.
pub(crate) const ROW_KEYS: [&str; 3] = ["rows", "partial_rows", "yearly"];

/// Scalar fields of `map`, with nested objects flattened to `parent.child`.
pub(crate) fn flatten_fields(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut fields = Vec::new();
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (child, nested) in flatten_fields(inner) {
                    fields.push((format!("{key}.{child}"), nested));
                }
            }
            Value::Array(items) if ROW_KEYS.contains(&key.as_str()) || items.iter().any(Value::is_object) => {}
            _ => fields.push((key.clone(), val.clone())),
        }
    }
    fields
}
