use serde_json::Value;
use std::io;

use intrinsic_core::export::flat_records;

use super::{cell_text, labels, sensitivity_result, valuation_parts};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some((_, outputs)) = valuation_parts(value) {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in flat_records(&outputs) {
            let _ = wtr.write_record([key, val]);
        }
    } else if let Some(grid) = sensitivity_result(value) {
        write_grid_csv(&mut wtr, grid);
    } else {
        match value {
            Value::Object(map) => {
                let body = match map.get("result") {
                    Some(Value::Object(result)) => result,
                    _ => map,
                };
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in body {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
            _ => {
                let _ = wtr.write_record([&format_csv_value(value)]);
            }
        }
    }

    let _ = wtr.flush();
}

/// One header row of column labels, then one row per row label.
fn write_grid_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, grid: &serde_json::Map<String, Value>) {
    let row_name = grid.get("row_name").and_then(Value::as_str).unwrap_or("row");
    let col_name = grid.get("col_name").and_then(Value::as_str).unwrap_or("col");

    let mut header = vec![format!("{row_name} \\ {col_name}")];
    header.extend(labels(grid.get("col_labels")));
    let _ = wtr.write_record(&header);

    let row_labels = labels(grid.get("row_labels"));
    if let Some(Value::Array(rows)) = grid.get("matrix") {
        for (label, row) in row_labels.iter().zip(rows) {
            let mut record = vec![label.clone()];
            if let Value::Array(cells) = row {
                record.extend(cells.iter().map(cell_text));
            }
            let _ = wtr.write_record(&record);
        }
    }
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
