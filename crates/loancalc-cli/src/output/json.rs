use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the full envelope (result, warnings, metadata) to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::from).and_then(|_| writeln!(out)) {
        eprintln!("JSON serialization error: {}", e);
    }
}
