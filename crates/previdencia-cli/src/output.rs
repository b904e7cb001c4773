use serde_json::Value;
use std::io;
use tabled::{builder::Builder, Table};

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => print_table(value),
        OutputFormat::Csv => print_csv(value),
        OutputFormat::Minimal => print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Envelope outputs render their result section, then notes
            let result = map.get("result").unwrap_or(value);
            match result {
                Value::Array(arr) => print_array_table(arr),
                Value::Object(fields) => {
                    let mut builder = Builder::default();
                    builder.push_record(["Field", "Value"]);
                    for (key, val) in fields {
                        builder.push_record([key.as_str(), &format_value(val)]);
                    }
                    println!("{}", Table::from(builder));
                }
                other => println!("{}", format_value(other)),
            }

            if let Some(Value::Array(warnings)) = map.get("warnings") {
                if !warnings.is_empty() {
                    println!("\nWarnings:");
                    for warning in warnings {
                        println!("  - {}", format_value(warning));
                    }
                }
            }
            if let Some(Value::String(methodology)) = map.get("methodology") {
                println!("\nMethodology: {}", methodology);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", format_value(other)),
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);
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
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|map| map.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => {
            if let Some(Value::Object(first)) = arr.first() {
                let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
                let _ = wtr.write_record(&headers);
                for item in arr {
                    if let Value::Object(map) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                            .collect();
                        let _ = wtr.write_record(&row);
                    }
                }
            } else {
                for item in arr {
                    let _ = wtr.write_record([format_value(item)]);
                }
            }
        }
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_value(val)]);
            }
        }
        other => {
            let _ = wtr.write_record([format_value(other)]);
        }
    }

    let _ = wtr.flush();
}

/// Print just the key answer value from the output.
fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|map| map.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "cagr_text",
        "cagr_pct",
        "rate_pct",
        "last_position",
        "final_position",
        "position_text",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_value(val));
                    return;
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result));
}
