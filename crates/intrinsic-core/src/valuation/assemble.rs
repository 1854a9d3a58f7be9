use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::checked;
use crate::inputs::{CapitalStructure, ValuationInputs};
use crate::time_value::{discount_period, present_value};
use crate::types::{Money, Rate, Years};
use crate::IntrinsicResult;

use super::discount_rate::DiscountRates;
use super::forecast::ForecastSeries;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Result of a full valuation run. A pure function of `ValuationInputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutputs {
    pub revenue: Vec<Money>,
    pub ebit: Vec<Money>,
    pub nopat: Vec<Money>,
    pub fcff: Vec<Money>,
    /// Discount period applied to each year's FCFF
    pub discount_periods: Vec<Years>,
    pub pv_fcff: Vec<Money>,
    /// Sum of present values of explicit-period FCFFs
    pub pv_of_fcff: Money,
    /// Terminal value at the end of the horizon, undiscounted
    pub terminal_value: Money,
    pub pv_of_terminal: Money,
    /// PV(TV) / EV
    pub terminal_value_pct: Rate,
    pub enterprise_value: Money,
    pub net_debt: Money,
    pub equity_value: Money,
    /// Share count the per-share value was divided by
    pub shares_used: Decimal,
    pub intrinsic_value_per_share: Money,
    /// (intrinsic - price) / price; zero when no price is set
    pub upside_downside: Rate,
    pub cost_of_equity: Rate,
    pub after_tax_cost_of_debt: Rate,
    pub wacc: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discount the forecast and terminal value and bridge to equity per share.
///
/// Explicit-period cash flows use period `i + 1` (or `i + 0.5` under the
/// mid-year convention). The terminal value is always discounted over the
/// full horizon.
pub fn assemble(
    inputs: &ValuationInputs,
    forecast: &ForecastSeries,
    rates: &DiscountRates,
    terminal_value: Money,
) -> IntrinsicResult<ValuationOutputs> {
    let wacc = rates.wacc;

    let mut discount_periods = Vec::with_capacity(forecast.len());
    let mut pv_fcff = Vec::with_capacity(forecast.len());
    for (i, cf) in forecast.fcff.iter().enumerate() {
        let period = discount_period(i, inputs.mid_year_convention);
        pv_fcff.push(present_value(*cf, wacc, period)?);
        discount_periods.push(period);
    }
    let pv_of_fcff = checked(
        pv_fcff
            .iter()
            .try_fold(Decimal::ZERO, |acc, pv| acc.checked_add(*pv)),
        "sum of discounted FCFF",
    )?;

    let horizon = Decimal::from(forecast.len() as u64);
    let pv_of_terminal = present_value(terminal_value, wacc, horizon)?;

    let enterprise_value = checked(pv_of_fcff.checked_add(pv_of_terminal), "enterprise value")?;
    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        checked(
            pv_of_terminal.checked_div(enterprise_value),
            "terminal value share of EV",
        )?
    };

    let (net_debt, equity_value) = equity_bridge(enterprise_value, &inputs.capital)?;
    let shares_used = per_share_divisor(&inputs.capital);
    let intrinsic_value_per_share = if shares_used > Decimal::ZERO {
        checked(equity_value.checked_div(shares_used), "intrinsic value per share")?
    } else {
        Decimal::ZERO
    };
    let upside_downside = upside(intrinsic_value_per_share, inputs.company.current_price)?;

    Ok(ValuationOutputs {
        revenue: forecast.revenue.clone(),
        ebit: forecast.ebit.clone(),
        nopat: forecast.nopat.clone(),
        fcff: forecast.fcff.clone(),
        discount_periods,
        pv_fcff,
        pv_of_fcff,
        terminal_value,
        pv_of_terminal,
        terminal_value_pct,
        enterprise_value,
        net_debt,
        equity_value,
        shares_used,
        intrinsic_value_per_share,
        upside_downside,
        cost_of_equity: rates.cost_of_equity,
        after_tax_cost_of_debt: rates.after_tax_cost_of_debt,
        wacc,
    })
}

/// Returns `(net_debt, equity_value)`.
///
/// Equity = EV - (debt - cash) - preferred - minority + non-operating assets
pub fn equity_bridge(
    enterprise_value: Money,
    capital: &CapitalStructure,
) -> IntrinsicResult<(Money, Money)> {
    let net_debt = checked(capital.total_debt.checked_sub(capital.cash), "net debt")?;
    let equity = checked(
        enterprise_value
            .checked_sub(net_debt)
            .and_then(|v| v.checked_sub(capital.preferred_equity))
            .and_then(|v| v.checked_sub(capital.minority_interest))
            .and_then(|v| v.checked_add(capital.non_operating_assets)),
        "equity value",
    )?;
    Ok((net_debt, equity))
}

/// Diluted shares when set, otherwise basic shares outstanding.
pub fn per_share_divisor(capital: &CapitalStructure) -> Decimal {
    if capital.diluted_shares > Decimal::ZERO {
        capital.diluted_shares
    } else {
        capital.shares_outstanding
    }
}

fn upside(value_per_share: Money, price: Money) -> IntrinsicResult<Rate> {
    if price.is_zero() {
        return Ok(Decimal::ZERO);
    }
    checked(
        value_per_share
            .checked_sub(price)
            .and_then(|gap| gap.checked_div(price)),
        "upside/downside",
    )
}
