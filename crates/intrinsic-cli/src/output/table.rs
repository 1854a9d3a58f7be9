use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{cell_text, labels, sensitivity_result, valuation_parts};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some((_, outputs)) = valuation_parts(value) {
                print_forecast_table(&outputs);
                print_summary(map);
            } else if let Some(grid) = sensitivity_result(value) {
                print_grid(grid);
                print_summary(map);
            } else if let Some(result) = map.get("result") {
                print_flat_object(result);
                print_summary(map);
            } else {
                print_flat_object(value);
            }
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_forecast_table(outputs: &intrinsic_core::valuation::ValuationOutputs) {
    let mut builder = Builder::default();
    let mut header = vec!["Year".to_string()];
    header.extend((1..=outputs.revenue.len()).map(|i| i.to_string()));
    builder.push_record(header);

    let series = [
        ("Revenue", &outputs.revenue),
        ("EBIT", &outputs.ebit),
        ("NOPAT", &outputs.nopat),
        ("FCFF", &outputs.fcff),
        ("PV of FCFF", &outputs.pv_fcff),
    ];
    for (label, values) in series {
        let mut row = vec![label.to_string()];
        row.extend(values.iter().map(|v| v.round_dp(0).to_string()));
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));

    let mut summary = Builder::default();
    summary.push_record(["Field", "Value"]);
    let rows = [
        ("PV of FCFF", outputs.pv_of_fcff.round_dp(0)),
        ("Terminal value", outputs.terminal_value.round_dp(0)),
        ("PV of terminal value", outputs.pv_of_terminal.round_dp(0)),
        ("Enterprise value", outputs.enterprise_value.round_dp(0)),
        ("Net debt", outputs.net_debt.round_dp(0)),
        ("Equity value", outputs.equity_value.round_dp(0)),
        ("Intrinsic value per share", outputs.intrinsic_value_per_share.round_dp(2)),
        ("Upside / downside", outputs.upside_downside.round_dp(4)),
        ("WACC", outputs.wacc),
    ];
    for (label, val) in rows {
        summary.push_record([label.to_string(), val.to_string()]);
    }
    println!("{}", Table::from(summary));
}

fn print_grid(grid: &serde_json::Map<String, Value>) {
    let row_name = grid.get("row_name").and_then(Value::as_str).unwrap_or("");
    let col_name = grid.get("col_name").and_then(Value::as_str).unwrap_or("");

    let mut builder = Builder::default();
    let mut header = vec![format!("{row_name} \\ {col_name}")];
    header.extend(labels(grid.get("col_labels")));
    builder.push_record(header);

    let row_labels = labels(grid.get("row_labels"));
    if let Some(Value::Array(rows)) = grid.get("matrix") {
        for (label, row) in row_labels.iter().zip(rows) {
            let mut record = vec![label.clone()];
            if let Value::Array(cells) = row {
                record.extend(cells.iter().map(cell_text));
            }
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_summary(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", format_value(value));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
