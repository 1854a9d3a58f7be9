pub mod assemble;
pub mod discount_rate;
pub mod forecast;
pub mod terminal;

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Instant;

use crate::inputs::ValuationInputs;
use crate::types::{with_metadata, ComputationOutput};
use crate::IntrinsicResult;

pub use assemble::{assemble, ValuationOutputs};
pub use discount_rate::{discount_rate, DiscountRates};
pub use forecast::{project, ForecastSeries};
pub use terminal::{terminal_value, TerminalBreakdown};

/// Run the full FCFF valuation and wrap it in the standard output envelope.
pub fn value_company(inputs: &ValuationInputs) -> IntrinsicResult<ComputationOutput<ValuationOutputs>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = run_with_warnings(inputs, &mut warnings)?;

    if output.terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
            output.terminal_value_pct.saturating_mul(dec!(100))
        ));
    }
    if inputs.capital.diluted_shares <= Decimal::ZERO {
        warnings.push("Diluted shares not set; per-share value uses basic shares outstanding".into());
    }
    if output.shares_used <= Decimal::ZERO {
        warnings.push("No positive share count; intrinsic value per share reported as zero".into());
    }
    if inputs.company.current_price.is_zero() {
        warnings.push("Current price is zero; upside/downside reported as zero".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "FCFF DCF (CAPM WACC)",
        inputs,
        warnings,
        elapsed,
        output,
    ))
}

/// The bare pipeline: forecast, discount rates, terminal value, assembly.
/// Deterministic; identical inputs give identical outputs.
pub fn run_pipeline(inputs: &ValuationInputs) -> IntrinsicResult<ValuationOutputs> {
    run_with_warnings(inputs, &mut Vec::new())
}

fn run_with_warnings(
    inputs: &ValuationInputs,
    warnings: &mut Vec<String>,
) -> IntrinsicResult<ValuationOutputs> {
    let year_rates = inputs.resolve_year_rates(warnings)?;
    let forecast = forecast::project_rates(inputs.operating.starting_revenue, &year_rates)?;
    debug!("projected {} forecast years for {}", forecast.len(), inputs.company.ticker);

    let rates = discount_rate::discount_rate(inputs);
    warnings.extend(discount_rate::rate_warnings(&inputs.discount, &rates));
    debug!(
        "cost of equity {}, after-tax cost of debt {}, wacc {}",
        rates.cost_of_equity, rates.after_tax_cost_of_debt, rates.wacc
    );

    let breakdown = terminal::terminal_breakdown(&forecast, rates.wacc, &inputs.terminal)?;
    if let (Some(perp), Some(exit)) = (breakdown.perpetuity, breakdown.exit_multiple) {
        if perp > Decimal::ZERO && exit > Decimal::ZERO {
            let diff_pct = perp.checked_sub(exit).and_then(|d| d.checked_div(perp)).map(|d| d.abs());
            if let Some(diff_pct) = diff_pct.filter(|d| *d > dec!(0.25)) {
                warnings.push(format!(
                    "Perpetuity TV ({perp:.0}) and exit multiple TV ({exit:.0}) differ by {:.1}%; review assumptions",
                    diff_pct.saturating_mul(dec!(100))
                ));
            }
        }
    }

    assemble::assemble(inputs, &forecast, &rates, breakdown.used)
}
