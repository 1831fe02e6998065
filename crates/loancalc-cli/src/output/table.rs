use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_fields, ROW_KEYS};

/// Summary fields as a Field/Value table, then any schedule rows as their
/// own table, then warnings.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_fields(result);

    for key in ROW_KEYS {
        if let Some(Value::Array(rows)) = result.get(key) {
            println!("\n{}:", key.replace('_', " "));
            print_rows(rows);
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_fields(map) {
        builder.push_record([key, format_value(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    println!("{}", Table::from(builder));
}

/// Money and rates arrive as decimal strings; show money to the cent.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => round_display(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn round_display(s: &str) -> String {
    match s.parse::<rust_decimal::Decimal>() {
        // Small magnitudes are rates; keep their precision.
        Ok(d) if d.abs() >= rust_decimal::Decimal::ONE => d.round_dp(2).to_string(),
        Ok(d) => d.round_dp(6).normalize().to_string(),
        Err(_) => s.to_string(),
    }
}
