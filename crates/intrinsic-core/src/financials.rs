//! Seeding valuation inputs from historical financial statements.
//!
//! A data service fetches annual reports for a ticker; this module turns
//! them into starting assumptions by averaging historical ratios and clamping
//! them to sensible ranges. It runs once before the deterministic engine and
//! never inside the recomputation loop.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::IntrinsicError;
use crate::inputs::{validate_horizon, ForecastMode, ScalarRates, ValuationInputs};
use crate::types::{with_metadata, ComputationOutput, Currency, Money, Rate};
use crate::IntrinsicResult;

const GROWTH_RANGE: (Rate, Rate) = (dec!(-0.10), dec!(0.30));
const EBIT_MARGIN_RANGE: (Rate, Rate) = (dec!(-0.20), dec!(0.60));
const CAPEX_RANGE: (Rate, Rate) = (dec!(0), dec!(0.30));
const DEPRECIATION_RANGE: (Rate, Rate) = (dec!(0), dec!(0.25));
const TAX_RANGE: (Rate, Rate) = (dec!(0), dec!(0.40));
const NWC_RANGE: (Rate, Rate) = (dec!(-0.10), dec!(0.30));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One fiscal year of reported figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualReport {
    pub fiscal_date_ending: NaiveDate,
    pub total_revenue: Money,
    /// Operating income
    pub ebit: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_and_amortization: Option<Money>,
    /// Reported capex; sign is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_expenditures: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_before_tax: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax_expense: Option<Money>,
    /// Increase in net working capital during the year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_in_working_capital: Option<Money>,
}

/// Market data and annual reports returned by the financial-data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFinancials {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_debt: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// 10-year Treasury yield as a decimal (0.045 = 4.5%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_free_rate: Option<Rate>,
    pub annual_reports: Vec<AnnualReport>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Map historical financials onto `base`, returning new inputs in simple mode.
///
/// Every derived ratio is a plain average over the available years, clamped
/// to a fixed range. A ratio that cannot be derived keeps the base value and
/// records a warning.
pub fn auto_populate(
    base: &ValuationInputs,
    financials: &ExtractedFinancials,
) -> IntrinsicResult<ComputationOutput<ValuationInputs>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_horizon(base.forecast_years)?;
    let n = base.forecast_years as usize;

    let mut reports: Vec<&AnnualReport> = financials
        .annual_reports
        .iter()
        .filter(|r| r.total_revenue > Decimal::ZERO)
        .collect();
    if reports.is_empty() {
        return Err(IntrinsicError::InsufficientData(format!(
            "No annual report with positive revenue for {}",
            financials.ticker
        )));
    }
    reports.sort_by_key(|r| r.fiscal_date_ending);
    let latest = reports[reports.len() - 1];
    debug!(
        "seeding {} from {} annual reports ending {}",
        financials.ticker,
        reports.len(),
        latest.fiscal_date_ending
    );

    let mut seeded = base.clone();
    let base_rates = base.operating.mode.scalar_rates();

    seeded.operating.starting_revenue = latest.total_revenue;

    let growth = mean(reports.windows(2).map(|w| {
        (w[1].total_revenue - w[0].total_revenue) / w[0].total_revenue
    }));
    match growth {
        Some(g) => seeded.operating.revenue_growth = vec![clamp(g, GROWTH_RANGE); n],
        None => note_fallback(&mut warnings, "revenue growth", "fewer than two annual reports"),
    }

    let margin = mean(reports.iter().map(|r| r.ebit / r.total_revenue));
    if let Some(m) = margin {
        seeded.operating.ebit_margin = vec![clamp(m, EBIT_MARGIN_RANGE); n];
    }

    let capex_pct = ratio_or_base(
        mean(reports.iter().filter_map(|r| {
            r.capital_expenditures.map(|c| c.abs() / r.total_revenue)
        })),
        CAPEX_RANGE,
        base_rates.capex_pct,
        "capex %",
        &mut warnings,
    );
    let depreciation_pct = ratio_or_base(
        mean(reports.iter().filter_map(|r| {
            r.depreciation_and_amortization.map(|d| d.abs() / r.total_revenue)
        })),
        DEPRECIATION_RANGE,
        base_rates.depreciation_pct,
        "depreciation %",
        &mut warnings,
    );
    let cash_tax_rate = ratio_or_base(
        mean(reports.iter().filter_map(|r| match (r.income_tax_expense, r.income_before_tax) {
            (Some(tax), Some(pretax)) if pretax > Decimal::ZERO => Some(tax / pretax),
            _ => None,
        })),
        TAX_RANGE,
        base_rates.cash_tax_rate,
        "cash tax rate",
        &mut warnings,
    );
    let nwc_pct = ratio_or_base(
        mean(reports.windows(2).filter_map(|w| {
            let delta_revenue = w[1].total_revenue - w[0].total_revenue;
            match w[1].change_in_working_capital {
                Some(delta_nwc) if !delta_revenue.is_zero() => Some(delta_nwc / delta_revenue),
                _ => None,
            }
        })),
        NWC_RANGE,
        base_rates.nwc_pct,
        "NWC %",
        &mut warnings,
    );

    seeded.operating.mode = ForecastMode::Simple {
        rates: ScalarRates {
            capex_pct,
            depreciation_pct,
            nwc_pct,
            cash_tax_rate,
        },
    };

    seeded.company.ticker = financials.ticker.to_uppercase();
    if let Some(name) = &financials.name {
        seeded.company.name = name.clone();
    }
    if let Some(code) = financials.currency.as_deref() {
        seeded.company.currency = Currency::from_code(code);
    }
    if let Some(price) = financials.price {
        seeded.company.current_price = price;
    }
    if let Some(shares) = financials.shares_outstanding {
        seeded.capital.shares_outstanding = shares;
        seeded.capital.diluted_shares = shares;
    }
    if let Some(debt) = financials.total_debt {
        seeded.capital.total_debt = debt;
    }
    if let Some(cash) = financials.cash {
        seeded.capital.cash = cash;
    }
    if let Some(beta) = financials.beta {
        seeded.discount.beta = beta;
    }
    match financials.risk_free_rate {
        Some(rf) => seeded.discount.risk_free_rate = rf,
        None => note_fallback(&mut warnings, "risk-free rate", "not supplied"),
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical average ratios (clamped)",
        &serde_json::json!({
            "ticker": financials.ticker,
            "annual_reports": reports.len(),
            "latest_fiscal_year_end": latest.fiscal_date_ending,
        }),
        warnings,
        elapsed,
        seeded,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn mean(values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let (sum, count) = values.fold((Decimal::ZERO, 0u32), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / Decimal::from(count))
    }
}

fn clamp(value: Rate, (lo, hi): (Rate, Rate)) -> Rate {
    value.clamp(lo, hi)
}

fn ratio_or_base(
    derived: Option<Rate>,
    range: (Rate, Rate),
    base: Rate,
    label: &str,
    warnings: &mut Vec<String>,
) -> Rate {
    match derived {
        Some(v) => clamp(v, range),
        None => {
            note_fallback(warnings, label, "not reported");
            base
        }
    }
}

fn note_fallback(warnings: &mut Vec<String>, label: &str, why: &str) {
    warn!("{label} {why}; keeping base assumption");
    warnings.push(format!("{label} {why}; keeping base assumption"));
}
