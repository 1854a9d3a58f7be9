//! Flat and printable renderings of a valuation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::inputs::{TerminalMethod, ValuationInputs};
use crate::valuation::ValuationOutputs;

/// Ordered `(field, value)` pairs: per-year series first, then the summary.
///
/// Per-year fields are suffixed with a 1-based year number
/// (`revenue_year_1`, `pv_fcff_year_3`, ...).
pub fn flat_records(outputs: &ValuationOutputs) -> Vec<(String, String)> {
    let mut records = Vec::new();

    let series: [(&str, &[Decimal]); 6] = [
        ("revenue", &outputs.revenue),
        ("ebit", &outputs.ebit),
        ("nopat", &outputs.nopat),
        ("fcff", &outputs.fcff),
        ("discount_period", &outputs.discount_periods),
        ("pv_fcff", &outputs.pv_fcff),
    ];
    for (name, values) in series {
        for (i, v) in values.iter().enumerate() {
            records.push((format!("{name}_year_{}", i + 1), v.to_string()));
        }
    }

    let summary = [
        ("pv_of_fcff", outputs.pv_of_fcff),
        ("terminal_value", outputs.terminal_value),
        ("pv_of_terminal", outputs.pv_of_terminal),
        ("terminal_value_pct", outputs.terminal_value_pct),
        ("enterprise_value", outputs.enterprise_value),
        ("net_debt", outputs.net_debt),
        ("equity_value", outputs.equity_value),
        ("shares_used", outputs.shares_used),
        ("intrinsic_value_per_share", outputs.intrinsic_value_per_share),
        ("upside_downside", outputs.upside_downside),
        ("cost_of_equity", outputs.cost_of_equity),
        ("after_tax_cost_of_debt", outputs.after_tax_cost_of_debt),
        ("wacc", outputs.wacc),
    ];
    records.extend(summary.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));

    records
}

/// A self-contained HTML page summarising one valuation, suitable for printing.
pub fn html_snapshot(inputs: &ValuationInputs, outputs: &ValuationOutputs) -> String {
    let currency = inputs.company.currency.code();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} ({}) DCF valuation</title>\n",
        escape(&inputs.company.name),
        escape(&inputs.company.ticker)
    ));
    html.push_str(
        "<style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse;margin-bottom:1.5em}\
         td,th{border:1px solid #ccc;padding:4px 8px;text-align:right}th:first-child,td:first-child{text-align:left}</style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!(
        "<h1>{} ({})</h1>\n",
        escape(&inputs.company.name),
        escape(&inputs.company.ticker)
    ));

    html.push_str("<h2>Summary</h2>\n<table>\n");
    let summary_rows = [
        ("Intrinsic value per share", format!("{} {}", money(outputs.intrinsic_value_per_share, 2), currency)),
        ("Current price", format!("{} {}", money(inputs.company.current_price, 2), currency)),
        ("Upside / downside", pct(outputs.upside_downside)),
        ("Enterprise value", money(outputs.enterprise_value, 0)),
        ("Net debt", money(outputs.net_debt, 0)),
        ("Equity value", money(outputs.equity_value, 0)),
        ("WACC", pct(outputs.wacc)),
        ("Cost of equity", pct(outputs.cost_of_equity)),
        ("After-tax cost of debt", pct(outputs.after_tax_cost_of_debt)),
        ("Terminal method", terminal_label(inputs.terminal.method).to_string()),
        ("Terminal value share of EV", pct(outputs.terminal_value_pct)),
    ];
    for (label, value) in summary_rows {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>\n"));
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Forecast</h2>\n<table>\n<tr><th>Year</th>");
    for i in 1..=outputs.revenue.len() {
        html.push_str(&format!("<th>{i}</th>"));
    }
    html.push_str("</tr>\n");
    let series: [(&str, &[Decimal]); 5] = [
        ("Revenue", &outputs.revenue),
        ("EBIT", &outputs.ebit),
        ("NOPAT", &outputs.nopat),
        ("FCFF", &outputs.fcff),
        ("PV of FCFF", &outputs.pv_fcff),
    ];
    for (label, values) in series {
        html.push_str(&format!("<tr><td>{label}</td>"));
        for v in values {
            html.push_str(&format!("<td>{}</td>", money(*v, 0)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");

    if inputs.mid_year_convention {
        html.push_str("<p>Cash flows discounted with the mid-year convention.</p>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn terminal_label(method: TerminalMethod) -> &'static str {
    match method {
        TerminalMethod::Perpetuity => "Perpetuity growth",
        TerminalMethod::ExitMultiple => "Exit multiple",
        TerminalMethod::Blended => "Blended",
    }
}

fn money(value: Decimal, dp: u32) -> String {
    value.round_dp(dp).to_string()
}

fn pct(rate: Decimal) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(2))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::run_pipeline;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_records_order() {
        let out = run_pipeline(&ValuationInputs::example()).unwrap();
        let records = flat_records(&out);

        // 6 series x 5 years + 13 summary fields
        assert_eq!(records.len(), 43);
        assert_eq!(records[0].0, "revenue_year_1");
        assert_eq!(records[4].0, "revenue_year_5");
        assert_eq!(records[5].0, "ebit_year_1");
        assert_eq!(records[30].0, "pv_of_fcff");
        assert_eq!(records.last().unwrap().0, "wacc");
        assert_eq!(records[0].1, out.revenue[0].to_string());
    }

    #[test]
    fn test_html_snapshot_contents() {
        let mut inputs = ValuationInputs::example();
        inputs.company.name = "Smith & <Sons>".into();
        let out = run_pipeline(&inputs).unwrap();
        let html = html_snapshot(&inputs, &out);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Smith &amp; &lt;Sons&gt;"));
        assert!(html.contains("<th>WACC</th><td>9.25%</td>"));
        assert!(html.contains("<th>5</th>"));
        assert!(!html.contains("mid-year"));
    }
}
