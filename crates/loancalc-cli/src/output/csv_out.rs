use serde_json::Value;
use std::io;

use super::{flatten_fields, ROW_KEYS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write the schedule rows as CSV, or a field/value listing when the
/// result has no rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                let rows = ROW_KEYS.iter().find_map(|key| match result.get(*key) {
                    Some(Value::Array(rows)) if !rows.is_empty() => Some(rows),
                    _ => None,
                });
                match rows {
                    Some(rows) => write_rows(&mut wtr, rows),
                    None => write_fields(&mut wtr, result),
                }
            }
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => wtr.write_record([format_csv_value(value)]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &serde_json::Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in flatten_fields(map) {
        wtr.write_record([key, format_csv_value(&val)])?;
    }
    Ok(())
}

fn write_rows(wtr: &mut StdoutWriter<'_>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
