use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::inputs::{DiscountAssumptions, ValuationInputs};
use crate::types::Rate;

/// Cost of capital components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountRates {
    /// Cost of equity via CAPM
    pub cost_of_equity: Rate,
    /// Pre-tax cost of debt net of the tax shield
    pub after_tax_cost_of_debt: Rate,
    /// Weighted average cost of capital used for discounting
    pub wacc: Rate,
}

/// Compute cost of equity, after-tax cost of debt and WACC.
///
/// Ke = Rf + Beta * ERP
/// Kd_at = Kd * (1 - t)
/// WACC = Ke * (1 - D/V) + Kd_at * D/V
///
/// A `wacc_override` replaces the weighted figure; the components are still
/// reported from CAPM.
pub fn discount_rate(inputs: &ValuationInputs) -> DiscountRates {
    discount_rate_from(&inputs.discount)
}

pub fn discount_rate_from(d: &DiscountAssumptions) -> DiscountRates {
    // Saturating ops; an out-of-range rate is rejected later by compound_factor
    let cost_of_equity = d
        .risk_free_rate
        .saturating_add(d.beta.saturating_mul(d.equity_risk_premium));
    let after_tax_cost_of_debt = d
        .cost_of_debt
        .saturating_mul(Decimal::ONE.saturating_sub(d.tax_rate));
    let weighted = cost_of_equity
        .saturating_mul(Decimal::ONE.saturating_sub(d.target_debt_ratio))
        .saturating_add(after_tax_cost_of_debt.saturating_mul(d.target_debt_ratio));

    DiscountRates {
        cost_of_equity,
        after_tax_cost_of_debt,
        wacc: d.wacc_override.unwrap_or(weighted),
    }
}

/// Advisory checks on the discount-rate inputs. Nothing here is rejected.
pub fn rate_warnings(d: &DiscountAssumptions, rates: &DiscountRates) -> Vec<String> {
    let mut warnings = Vec::new();
    if d.beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify market data; betas above 3.0 are unusual",
            d.beta
        ));
    }
    if d.equity_risk_premium > dec!(0.10) {
        warnings.push(format!(
            "Equity risk premium ({}) exceeds 10%; verify estimate",
            d.equity_risk_premium
        ));
    }
    if rates.wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {} exceeds 20%; appropriate for high-risk situations only",
            rates.wacc
        ));
    }
    if rates.wacc <= Decimal::ZERO {
        warnings.push(format!("WACC of {} is not positive; values will not converge", rates.wacc));
    }
    warnings
}
