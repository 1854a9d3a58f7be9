use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use super::{cell_text, sensitivity_result, valuation_parts};

/// Print a single line answering the command.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

/// One line per envelope kind: value per share and upside for a valuation,
/// the centre cell for a grid, WACC for a discount-rate run, and the seeded
/// ticker and revenue for inputs.
fn minimal_line(value: &Value) -> String {
    if let Some((inputs, outputs)) = valuation_parts(value) {
        let upside = outputs.upside_downside.saturating_mul(dec!(100)).round_dp(1);
        let sign = if upside >= Decimal::ZERO { "+" } else { "" };
        return format!(
            "{} {} {} ({sign}{upside}%)",
            inputs.company.ticker,
            outputs.intrinsic_value_per_share.round_dp(2),
            inputs.company.currency.code(),
        );
    }

    if let Some(grid) = sensitivity_result(value) {
        return grid.get("base_case_value").map(cell_text).unwrap_or_else(|| "n/a".into());
    }

    let result = value.get("result").unwrap_or(value);
    if let Some(wacc) = result.get("wacc") {
        return scalar(wacc);
    }

    // Bare or seeded inputs
    match (
        result.pointer("/company/ticker"),
        result.pointer("/operating/starting_revenue"),
    ) {
        (Some(ticker), Some(revenue)) => format!("{} {}", scalar(ticker), scalar(revenue)),
        _ => scalar(result),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
