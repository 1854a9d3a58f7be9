use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{checked, IntrinsicError};
use crate::types::{Currency, Money, Multiple, Rate};
use crate::IntrinsicResult;

/// Longest explicit forecast horizon the engine accepts.
pub const MAX_FORECAST_YEARS: u32 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identity and market data for the company being valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub currency: Currency,
    /// Current market price per share
    pub current_price: Money,
}

/// Balance-sheet items used by the equity bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub shares_outstanding: Decimal,
    /// Diluted share count; zero or negative falls back to `shares_outstanding`
    #[serde(default)]
    pub diluted_shares: Decimal,
    #[serde(default)]
    pub total_debt: Money,
    #[serde(default)]
    pub cash: Money,
    #[serde(default)]
    pub preferred_equity: Money,
    #[serde(default)]
    pub minority_interest: Money,
    #[serde(default)]
    pub non_operating_assets: Money,
}

/// Scalar cash-flow drivers, applied to every forecast year unless overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRates {
    /// Capital expenditure as a fraction of revenue
    pub capex_pct: Rate,
    /// Depreciation as a fraction of revenue
    pub depreciation_pct: Rate,
    /// Change in net working capital as a fraction of the change in revenue
    pub nwc_pct: Rate,
    /// Cash tax rate on EBIT
    pub cash_tax_rate: Rate,
}

/// Optional per-year arrays that replace a scalar driver in advanced mode.
/// An empty array is treated the same as an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebit_margin: Option<Vec<Rate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_pct: Option<Vec<Rate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_pct: Option<Vec<Rate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nwc_pct: Option<Vec<Rate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_tax_rate: Option<Vec<Rate>>,
}

/// How the non-growth cash-flow drivers are specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ForecastMode {
    Simple {
        #[serde(flatten)]
        rates: ScalarRates,
    },
    Advanced {
        #[serde(flatten)]
        rates: ScalarRates,
        #[serde(default)]
        overrides: RateOverrides,
    },
}

impl ForecastMode {
    pub fn scalar_rates(&self) -> &ScalarRates {
        match self {
            ForecastMode::Simple { rates } | ForecastMode::Advanced { rates, .. } => rates,
        }
    }

    fn overrides(&self) -> Option<&RateOverrides> {
        match self {
            ForecastMode::Simple { .. } => None,
            ForecastMode::Advanced { overrides, .. } => Some(overrides),
        }
    }
}

/// Revenue and margin assumptions for the explicit forecast period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingAssumptions {
    /// Year-0 revenue the forecast grows from
    pub starting_revenue: Money,
    /// Revenue growth, one entry per forecast year
    pub revenue_growth: Vec<Rate>,
    /// EBIT margin, one entry per forecast year
    pub ebit_margin: Vec<Rate>,
    #[serde(flatten)]
    pub mode: ForecastMode,
}

/// CAPM and capital-structure inputs for the discount rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountAssumptions {
    pub risk_free_rate: Rate,
    pub equity_risk_premium: Rate,
    pub beta: Decimal,
    /// Pre-tax cost of debt
    pub cost_of_debt: Rate,
    /// Statutory tax rate used for the debt shield
    pub tax_rate: Rate,
    /// Target D / (D + E)
    pub target_debt_ratio: Rate,
    /// Pins WACC directly instead of deriving it from CAPM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacc_override: Option<Rate>,
}

/// Terminal value method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMethod {
    /// Gordon growth: TV = FCFF_last * (1 + g) / (WACC - g)
    Perpetuity,
    /// TV = exit metric * exit multiple
    ExitMultiple,
    /// TV = TV_perpetuity * w + TV_multiple * (1 - w)
    Blended,
}

/// Metric the exit multiple is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitBasis {
    /// Approximated as EBIT + revenue * depreciation rate
    Ebitda,
    Ebit,
    Fcf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalAssumptions {
    pub method: TerminalMethod,
    pub perpetual_growth: Rate,
    pub exit_multiple: Multiple,
    pub exit_basis: ExitBasis,
    /// Weight on the perpetuity value when `method` is `Blended`
    #[serde(default = "default_blend_weight")]
    pub blend_weight: Rate,
}

fn default_blend_weight() -> Rate {
    dec!(0.5)
}

/// Everything a single valuation run needs. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    pub company: CompanyProfile,
    pub capital: CapitalStructure,
    pub forecast_years: u32,
    #[serde(default)]
    pub mid_year_convention: bool,
    pub operating: OperatingAssumptions,
    pub discount: DiscountAssumptions,
    pub terminal: TerminalAssumptions,
}

/// Fully resolved drivers for one forecast year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRates {
    pub revenue_growth: Rate,
    pub ebit_margin: Rate,
    pub capex_pct: Rate,
    pub depreciation_pct: Rate,
    pub nwc_pct: Rate,
    pub cash_tax_rate: Rate,
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl ValuationInputs {
    /// Example company used for demos and as a seeding template.
    pub fn example() -> Self {
        ValuationInputs {
            company: CompanyProfile {
                name: "Example Corp".into(),
                ticker: "EXAM".into(),
                currency: Currency::USD,
                current_price: dec!(50.00),
            },
            capital: CapitalStructure {
                shares_outstanding: dec!(100_000_000),
                diluted_shares: dec!(105_000_000),
                total_debt: dec!(500_000_000),
                cash: dec!(200_000_000),
                preferred_equity: Decimal::ZERO,
                minority_interest: Decimal::ZERO,
                non_operating_assets: Decimal::ZERO,
            },
            forecast_years: 5,
            mid_year_convention: false,
            operating: OperatingAssumptions {
                starting_revenue: dec!(2_000_000_000),
                revenue_growth: vec![dec!(0.15), dec!(0.12), dec!(0.10), dec!(0.08), dec!(0.06)],
                ebit_margin: vec![dec!(0.25), dec!(0.26), dec!(0.27), dec!(0.28), dec!(0.29)],
                mode: ForecastMode::Simple {
                    rates: ScalarRates {
                        capex_pct: dec!(0.08),
                        depreciation_pct: dec!(0.05),
                        nwc_pct: dec!(0.02),
                        cash_tax_rate: dec!(0.25),
                    },
                },
            },
            discount: DiscountAssumptions {
                risk_free_rate: dec!(0.0425),
                equity_risk_premium: dec!(0.06),
                beta: dec!(1.2),
                cost_of_debt: dec!(0.055),
                tax_rate: dec!(0.25),
                target_debt_ratio: dec!(0.3),
                wacc_override: None,
            },
            terminal: TerminalAssumptions {
                method: TerminalMethod::Blended,
                perpetual_growth: dec!(0.025),
                exit_multiple: dec!(12),
                exit_basis: ExitBasis::Ebitda,
                blend_weight: dec!(0.5),
            },
        }
    }

    /// Copy with WACC pinned to `wacc`.
    pub fn with_wacc(&self, wacc: Rate) -> Self {
        let mut next = self.clone();
        next.discount.wacc_override = Some(wacc);
        next
    }

    /// Copy with every forecast year's revenue growth shifted by `delta`.
    pub fn with_growth_shift(&self, delta: Rate) -> IntrinsicResult<Self> {
        let mut next = self.clone();
        shift_all(&mut next.operating.revenue_growth, delta, "revenue_growth")?;
        Ok(next)
    }

    /// Copy with every forecast year's EBIT margin shifted by `delta`,
    /// including an advanced-mode margin override.
    pub fn with_margin_shift(&self, delta: Rate) -> IntrinsicResult<Self> {
        let mut next = self.clone();
        shift_all(&mut next.operating.ebit_margin, delta, "ebit_margin")?;
        if let ForecastMode::Advanced { overrides, .. } = &mut next.operating.mode {
            if let Some(margins) = overrides.ebit_margin.as_mut() {
                shift_all(margins, delta, "overrides.ebit_margin")?;
            }
        }
        Ok(next)
    }

    /// Copy with the terminal growth rate replaced.
    pub fn with_terminal_growth(&self, growth: Rate) -> Self {
        let mut next = self.clone();
        next.terminal.perpetual_growth = growth;
        next
    }

    /// Copy with the exit multiple replaced.
    pub fn with_exit_multiple(&self, multiple: Multiple) -> Self {
        let mut next = self.clone();
        next.terminal.exit_multiple = multiple;
        next
    }

    /// Validate the horizon and resolve every per-year driver into a single
    /// row per forecast year.
    ///
    /// Arrays shorter than the horizon carry their last value forward; a
    /// warning is pushed for each padded array. Entries past the horizon are
    /// ignored.
    pub fn resolve_year_rates(&self, warnings: &mut Vec<String>) -> IntrinsicResult<Vec<YearRates>> {
        validate_horizon(self.forecast_years)?;
        let n = self.forecast_years as usize;
        let scalars = self.operating.mode.scalar_rates();
        let overrides = self.operating.mode.overrides();

        let growth = normalize_required(&self.operating.revenue_growth, n, "revenue_growth", warnings)?;

        let margin_source = overrides
            .and_then(|o| non_empty(o.ebit_margin.as_deref()))
            .map(|m| (m, "overrides.ebit_margin"))
            .unwrap_or((self.operating.ebit_margin.as_slice(), "ebit_margin"));
        let margin = normalize_required(margin_source.0, n, margin_source.1, warnings)?;

        let capex = normalize_optional(
            overrides.and_then(|o| non_empty(o.capex_pct.as_deref())),
            scalars.capex_pct,
            n,
            "overrides.capex_pct",
            warnings,
        );
        let depreciation = normalize_optional(
            overrides.and_then(|o| non_empty(o.depreciation_pct.as_deref())),
            scalars.depreciation_pct,
            n,
            "overrides.depreciation_pct",
            warnings,
        );
        let nwc = normalize_optional(
            overrides.and_then(|o| non_empty(o.nwc_pct.as_deref())),
            scalars.nwc_pct,
            n,
            "overrides.nwc_pct",
            warnings,
        );
        let tax = normalize_optional(
            overrides.and_then(|o| non_empty(o.cash_tax_rate.as_deref())),
            scalars.cash_tax_rate,
            n,
            "overrides.cash_tax_rate",
            warnings,
        );

        Ok((0..n)
            .map(|i| YearRates {
                revenue_growth: growth[i],
                ebit_margin: margin[i],
                capex_pct: capex[i],
                depreciation_pct: depreciation[i],
                nwc_pct: nwc[i],
                cash_tax_rate: tax[i],
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn shift_all(values: &mut [Rate], delta: Rate, field: &str) -> IntrinsicResult<()> {
    for v in values.iter_mut() {
        *v = checked(v.checked_add(delta), field)?;
    }
    Ok(())
}

fn non_empty(values: Option<&[Rate]>) -> Option<&[Rate]> {
    values.filter(|v| !v.is_empty())
}

pub(crate) fn validate_horizon(years: u32) -> IntrinsicResult<()> {
    if years == 0 || years > MAX_FORECAST_YEARS {
        return Err(IntrinsicError::InvalidInput {
            field: "forecast_years".into(),
            reason: format!("Forecast horizon must be between 1 and {MAX_FORECAST_YEARS} years, got {years}"),
        });
    }
    Ok(())
}

/// Fit `values` to exactly `n` entries, padding with the last value.
fn pad_to(values: &[Rate], n: usize) -> Vec<Rate> {
    let mut out: Vec<Rate> = values.iter().take(n).copied().collect();
    if let Some(&last) = values.last() {
        out.resize(n, last);
    }
    out
}

fn normalize_required(
    values: &[Rate],
    n: usize,
    field: &str,
    warnings: &mut Vec<String>,
) -> IntrinsicResult<Vec<Rate>> {
    if values.is_empty() {
        return Err(IntrinsicError::InvalidInput {
            field: field.into(),
            reason: "At least one value is required".into(),
        });
    }
    if values.len() < n {
        warnings.push(padding_warning(field, values.len(), n));
    }
    Ok(pad_to(values, n))
}

fn normalize_optional(
    values: Option<&[Rate]>,
    fallback: Rate,
    n: usize,
    field: &str,
    warnings: &mut Vec<String>,
) -> Vec<Rate> {
    match values {
        Some(v) => {
            if v.len() < n {
                warnings.push(padding_warning(field, v.len(), n));
            }
            pad_to(v, n)
        }
        None => vec![fallback; n],
    }
}

fn padding_warning(field: &str, len: usize, n: usize) -> String {
    format!("{field} has {len} of {n} forecast years; last value carried forward")
}
