pub mod csv_out;
pub mod html;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

use intrinsic_core::valuation::ValuationOutputs;
use intrinsic_core::ValuationInputs;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
        OutputFormat::Html => html::print_html(value),
    }
}

/// Recover typed valuation inputs and outputs from a `value` envelope.
pub(crate) fn valuation_parts(envelope: &Value) -> Option<(ValuationInputs, ValuationOutputs)> {
    let outputs = serde_json::from_value(envelope.get("result")?.clone()).ok()?;
    let inputs = serde_json::from_value(envelope.get("assumptions")?.clone()).ok()?;
    Some((inputs, outputs))
}

/// The `result` object of a sensitivity envelope, if this is one.
pub(crate) fn sensitivity_result(envelope: &Value) -> Option<&serde_json::Map<String, Value>> {
    envelope
        .get("result")
        .and_then(Value::as_object)
        .filter(|r| r.contains_key("matrix"))
}

/// Display text for one serialized sensitivity cell.
pub(crate) fn cell_text(cell: &Value) -> String {
    match cell.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "n/a".to_string(),
    }
}

/// String labels from a JSON array.
pub(crate) fn labels(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}
