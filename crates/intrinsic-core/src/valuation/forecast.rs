use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::checked;
use crate::inputs::{ValuationInputs, YearRates};
use crate::types::{Money, Rate};
use crate::IntrinsicResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Year-by-year operating projection. Every vector has one entry per
/// forecast year, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub revenue: Vec<Money>,
    pub ebit: Vec<Money>,
    pub nopat: Vec<Money>,
    pub depreciation: Vec<Money>,
    pub capex: Vec<Money>,
    pub nwc_change: Vec<Money>,
    pub fcff: Vec<Money>,
    /// Resolved drivers used for each year
    pub rates: Vec<YearRates>,
}

/// Final-year figures the terminal value is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalYear {
    pub revenue: Money,
    pub ebit: Money,
    pub fcff: Money,
    pub depreciation_pct: Rate,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.fcff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fcff.is_empty()
    }

    pub fn final_year(&self) -> Option<FinalYear> {
        let i = self.len().checked_sub(1)?;
        Some(FinalYear {
            revenue: self.revenue[i],
            ebit: self.ebit[i],
            fcff: self.fcff[i],
            depreciation_pct: self.rates[i].depreciation_pct,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project revenue, EBIT, NOPAT and FCFF over the explicit forecast horizon.
///
/// Normalization warnings are discarded; use
/// [`ValuationInputs::resolve_year_rates`] with [`project_rates`] to keep them.
pub fn project(inputs: &ValuationInputs) -> IntrinsicResult<ForecastSeries> {
    let rates = inputs.resolve_year_rates(&mut Vec::new())?;
    project_rates(inputs.operating.starting_revenue, &rates)
}

/// Run the projection loop over already-resolved per-year drivers.
///
/// FCFF = NOPAT + depreciation - capex - change in NWC, where the NWC change
/// is charged on the year's revenue increase. Every step is checked; a figure
/// outside the decimal range is an `Overflow` error naming the year.
pub fn project_rates(starting_revenue: Money, rates: &[YearRates]) -> IntrinsicResult<ForecastSeries> {
    let n = rates.len();
    let mut series = ForecastSeries {
        revenue: Vec::with_capacity(n),
        ebit: Vec::with_capacity(n),
        nopat: Vec::with_capacity(n),
        depreciation: Vec::with_capacity(n),
        capex: Vec::with_capacity(n),
        nwc_change: Vec::with_capacity(n),
        fcff: Vec::with_capacity(n),
        rates: rates.to_vec(),
    };

    let mut prev_revenue = starting_revenue;

    for (i, r) in rates.iter().enumerate() {
        let year = i + 1;
        let revenue = checked(
            Decimal::ONE
                .checked_add(r.revenue_growth)
                .and_then(|g| prev_revenue.checked_mul(g)),
            &format!("revenue, year {year}"),
        )?;
        let ebit = checked(revenue.checked_mul(r.ebit_margin), &format!("EBIT, year {year}"))?;
        let nopat = checked(
            Decimal::ONE
                .checked_sub(r.cash_tax_rate)
                .and_then(|keep| ebit.checked_mul(keep)),
            &format!("NOPAT, year {year}"),
        )?;
        let nwc_change = checked(
            revenue
                .checked_sub(prev_revenue)
                .and_then(|delta| delta.checked_mul(r.nwc_pct)),
            &format!("NWC change, year {year}"),
        )?;
        let depreciation = checked(
            revenue.checked_mul(r.depreciation_pct),
            &format!("depreciation, year {year}"),
        )?;
        let capex = checked(revenue.checked_mul(r.capex_pct), &format!("capex, year {year}"))?;
        let fcff = checked(
            nopat
                .checked_add(depreciation)
                .and_then(|v| v.checked_sub(capex))
                .and_then(|v| v.checked_sub(nwc_change)),
            &format!("FCFF, year {year}"),
        )?;

        series.revenue.push(revenue);
        series.ebit.push(ebit);
        series.nopat.push(nopat);
        series.depreciation.push(depreciation);
        series.capex.push(capex);
        series.nwc_change.push(nwc_change);
        series.fcff.push(fcff);

        prev_revenue = revenue;
    }

    Ok(series)
}
