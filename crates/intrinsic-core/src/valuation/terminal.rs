use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{checked, IntrinsicError};
use crate::inputs::{ExitBasis, TerminalAssumptions, TerminalMethod, ValuationInputs};
use crate::types::{Money, Multiple, Rate};
use crate::IntrinsicResult;

use super::forecast::{FinalYear, ForecastSeries};

/// Both terminal value components and the one used for the valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalBreakdown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perpetuity: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_multiple: Option<Money>,
    /// Value at the end of the forecast horizon, undiscounted
    pub used: Money,
}

/// Undiscounted terminal value at the end of the forecast horizon.
pub fn terminal_value(
    forecast: &ForecastSeries,
    wacc: Rate,
    inputs: &ValuationInputs,
) -> IntrinsicResult<Money> {
    terminal_breakdown(forecast, wacc, &inputs.terminal).map(|b| b.used)
}

/// Compute the terminal value for the configured method, keeping each component.
pub fn terminal_breakdown(
    forecast: &ForecastSeries,
    wacc: Rate,
    terminal: &TerminalAssumptions,
) -> IntrinsicResult<TerminalBreakdown> {
    let last = forecast.final_year().ok_or_else(|| {
        IntrinsicError::InsufficientData("No projection years to build a terminal value from".into())
    })?;

    match terminal.method {
        TerminalMethod::Perpetuity => {
            let tv = perpetuity_value(last.fcff, wacc, terminal.perpetual_growth)?;
            Ok(TerminalBreakdown {
                perpetuity: Some(tv),
                exit_multiple: None,
                used: tv,
            })
        }
        TerminalMethod::ExitMultiple => {
            let tv = exit_multiple_value(&last, terminal.exit_basis, terminal.exit_multiple)?;
            Ok(TerminalBreakdown {
                perpetuity: None,
                exit_multiple: Some(tv),
                used: tv,
            })
        }
        TerminalMethod::Blended => {
            let perp = perpetuity_value(last.fcff, wacc, terminal.perpetual_growth)?;
            let multiple = exit_multiple_value(&last, terminal.exit_basis, terminal.exit_multiple)?;
            let w = terminal.blend_weight;
            let used = checked(
                perp.checked_mul(w).and_then(|p| {
                    Decimal::ONE
                        .checked_sub(w)
                        .and_then(|rest| multiple.checked_mul(rest))
                        .and_then(|m| p.checked_add(m))
                }),
                "blended terminal value",
            )?;
            Ok(TerminalBreakdown {
                perpetuity: Some(perp),
                exit_multiple: Some(multiple),
                used,
            })
        }
    }
}

/// Gordon growth value: FCFF_last * (1 + g) / (WACC - g).
///
/// Undefined unless WACC strictly exceeds g. A spread so thin that the value
/// leaves the decimal range is an `Overflow` error.
pub fn perpetuity_value(last_fcff: Money, wacc: Rate, growth: Rate) -> IntrinsicResult<Money> {
    let spread = checked(wacc.checked_sub(growth), "WACC - g spread")?;
    if spread <= Decimal::ZERO {
        return Err(IntrinsicError::TerminalValueUndefined { wacc, growth });
    }
    checked(
        Decimal::ONE
            .checked_add(growth)
            .and_then(|g| last_fcff.checked_mul(g))
            .and_then(|next| next.checked_div(spread)),
        "perpetuity terminal value",
    )
}

/// Exit metric times the multiple. There is no EBITDA line in the model, so
/// EBITDA is proxied as EBIT plus depreciation at the final year's rate.
pub fn exit_multiple_value(
    last: &FinalYear,
    basis: ExitBasis,
    multiple: Multiple,
) -> IntrinsicResult<Money> {
    let metric = match basis {
        ExitBasis::Ebitda => checked(
            last.revenue
                .checked_mul(last.depreciation_pct)
                .and_then(|d| last.ebit.checked_add(d)),
            "EBITDA proxy",
        )?,
        ExitBasis::Ebit => last.ebit,
        ExitBasis::Fcf => last.fcff,
    };
    checked(metric.checked_mul(multiple), "exit multiple terminal value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::forecast::project;
    use crate::valuation::discount_rate::discount_rate;
    use rust_decimal_macros::dec;

    fn last_year() -> FinalYear {
        FinalYear {
            revenue: dec!(1000),
            ebit: dec!(200),
            fcff: dec!(150),
            depreciation_pct: dec!(0.05),
        }
    }

    #[test]
    fn test_perpetuity_value() {
        // 150 * 1.02 / (0.10 - 0.02) = 153 / 0.08 = 1912.5
        let tv = perpetuity_value(dec!(150), dec!(0.10), dec!(0.02)).unwrap();
        assert_eq!(tv, dec!(1912.5));
    }

    #[test]
    fn test_perpetuity_growth_equal_to_wacc_is_undefined() {
        let err = perpetuity_value(dec!(150), dec!(0.08), dec!(0.08)).unwrap_err();
        assert!(err.is_terminal_undefined());
    }

    #[test]
    fn test_perpetuity_growth_above_wacc_is_undefined() {
        let err = perpetuity_value(dec!(150), dec!(0.08), dec!(0.09)).unwrap_err();
        match err {
            IntrinsicError::TerminalValueUndefined { wacc, growth } => {
                assert_eq!(wacc, dec!(0.08));
                assert_eq!(growth, dec!(0.09));
            }
            e => panic!("Expected TerminalValueUndefined, got {e:?}"),
        }
    }

    #[test]
    fn test_exit_multiple_bases() {
        let last = last_year();
        // EBITDA proxy: 200 + 1000 * 0.05 = 250
        assert_eq!(exit_multiple_value(&last, ExitBasis::Ebitda, dec!(10)).unwrap(), dec!(2500));
        assert_eq!(exit_multiple_value(&last, ExitBasis::Ebit, dec!(10)).unwrap(), dec!(2000));
        assert_eq!(exit_multiple_value(&last, ExitBasis::Fcf, dec!(10)).unwrap(), dec!(1500));
    }

    #[test]
    fn test_vanishing_spread_is_overflow_not_panic() {
        // Positive spread of 1e-25 pushes the value past the decimal range
        let err = perpetuity_value(
            dec!(400_000_000),
            dec!(0.0925),
            dec!(0.0924999999999999999999999),
        )
        .unwrap_err();
        assert!(matches!(err, IntrinsicError::Overflow { .. }));
        assert!(!err.is_terminal_undefined());
    }

    #[test]
    fn test_huge_exit_multiple_is_overflow() {
        let err = exit_multiple_value(&last_year(), ExitBasis::Ebit, Decimal::MAX).unwrap_err();
        assert!(matches!(err, IntrinsicError::Overflow { .. }));
    }

    #[test]
    fn test_blended_is_weighted_average_of_methods() {
        let mut inputs = ValuationInputs::example();
        let forecast = project(&inputs).unwrap();
        let wacc = discount_rate(&inputs).wacc;

        inputs.terminal.method = TerminalMethod::Perpetuity;
        let perp = terminal_value(&forecast, wacc, &inputs).unwrap();
        inputs.terminal.method = TerminalMethod::ExitMultiple;
        let multiple = terminal_value(&forecast, wacc, &inputs).unwrap();
        inputs.terminal.method = TerminalMethod::Blended;
        inputs.terminal.blend_weight = dec!(0.5);
        let blended = terminal_value(&forecast, wacc, &inputs).unwrap();

        assert_eq!(blended, perp * dec!(0.5) + multiple * dec!(0.5));
        assert!((blended - (perp + multiple) / dec!(2)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_blended_weight_extremes() {
        let mut inputs = ValuationInputs::example();
        let forecast = project(&inputs).unwrap();
        let wacc = discount_rate(&inputs).wacc;

        inputs.terminal.blend_weight = Decimal::ONE;
        let b = terminal_breakdown(&forecast, wacc, &inputs.terminal).unwrap();
        assert_eq!(b.used, b.perpetuity.unwrap());

        inputs.terminal.blend_weight = Decimal::ZERO;
        let b = terminal_breakdown(&forecast, wacc, &inputs.terminal).unwrap();
        assert_eq!(b.used, b.exit_multiple.unwrap());
    }

    #[test]
    fn test_blended_propagates_undefined_perpetuity() {
        let mut inputs = ValuationInputs::example();
        inputs.terminal.perpetual_growth = dec!(0.12);
        let forecast = project(&inputs).unwrap();
        let wacc = discount_rate(&inputs).wacc;
        let err = terminal_value(&forecast, wacc, &inputs).unwrap_err();
        assert!(err.is_terminal_undefined());
    }

    #[test]
    fn test_exit_multiple_ignores_growth_precondition() {
        let mut inputs = ValuationInputs::example();
        inputs.terminal.method = TerminalMethod::ExitMultiple;
        inputs.terminal.perpetual_growth = dec!(0.50);
        let forecast = project(&inputs).unwrap();
        let tv = terminal_value(&forecast, dec!(0.09), &inputs).unwrap();
        assert!(tv > Decimal::ZERO);
    }

    #[test]
    fn test_empty_forecast_is_insufficient_data() {
        let forecast = crate::valuation::forecast::project_rates(dec!(100), &[]).unwrap();
        let inputs = ValuationInputs::example();
        let err = terminal_value(&forecast, dec!(0.09), &inputs).unwrap_err();
        assert!(matches!(err, IntrinsicError::InsufficientData(_)));
    }
}
