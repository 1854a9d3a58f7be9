use intrinsic_core::error::IntrinsicError;
use intrinsic_core::inputs::{
    CapitalStructure, ExitBasis, ForecastMode, RateOverrides, ScalarRates, TerminalMethod,
};
use intrinsic_core::valuation::{
    self, assemble::equity_bridge, discount_rate, project, run_pipeline, terminal_value,
};
use intrinsic_core::ValuationInputs;
use pretty_assertions::assert_eq;
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

fn with_method(method: TerminalMethod) -> ValuationInputs {
    let mut inputs = ValuationInputs::example();
    inputs.terminal.method = method;
    inputs
}

// ===========================================================================
// Discount rate
// ===========================================================================

#[test]
fn test_example_discount_rates() {
    // Ke = 0.0425 + 1.2 * 0.06 = 0.1145
    // Kd_at = 0.055 * (1 - 0.25) = 0.04125
    // WACC = 0.1145 * 0.7 + 0.04125 * 0.3 = 0.08015 + 0.012375 = 0.092525
    let rates = discount_rate(&ValuationInputs::example());
    assert_eq!(rates.cost_of_equity, dec!(0.1145));
    assert_eq!(rates.after_tax_cost_of_debt, dec!(0.04125));
    assert_eq!(rates.wacc, dec!(0.092525));
}

#[test]
fn test_wacc_override_flows_through_pipeline() {
    let inputs = ValuationInputs::example().with_wacc(dec!(0.10));
    let out = run_pipeline(&inputs).unwrap();
    assert_eq!(out.wacc, dec!(0.10));
    // CAPM components are still reported
    assert_eq!(out.cost_of_equity, dec!(0.1145));
}

// ===========================================================================
// Forecast
// ===========================================================================

#[test]
fn test_year_one_fcff() {
    // Revenue 2.0bn * 1.15 = 2.3bn; EBIT 575m; NOPAT 431.25m
    // + D&A 115m - capex 184m - dNWC 6m = 356.25m
    let forecast = project(&ValuationInputs::example()).unwrap();
    assert_eq!(forecast.revenue[0], dec!(2_300_000_000));
    assert_eq!(forecast.ebit[0], dec!(575_000_000));
    assert_eq!(forecast.nopat[0], dec!(431_250_000));
    assert_eq!(forecast.fcff[0], dec!(356_250_000));
}

#[test]
fn test_advanced_mode_per_year_capex() {
    let mut inputs = ValuationInputs::example();
    inputs.operating.mode = ForecastMode::Advanced {
        rates: ScalarRates {
            capex_pct: dec!(0.08),
            depreciation_pct: dec!(0.05),
            nwc_pct: dec!(0.02),
            cash_tax_rate: dec!(0.25),
        },
        overrides: RateOverrides {
            capex_pct: Some(vec![dec!(0.10)]),
            ..RateOverrides::default()
        },
    };
    let simple = project(&ValuationInputs::example()).unwrap();
    let advanced = project(&inputs).unwrap();

    // Extra 2% of 2.3bn capex in year 1, carried forward to every year
    assert_eq!(simple.fcff[0] - advanced.fcff[0], dec!(46_000_000));
    assert_eq!(advanced.capex[4], advanced.revenue[4] * dec!(0.10));
}

#[test]
fn test_short_arrays_are_padded_with_warning() {
    let mut inputs = ValuationInputs::example();
    inputs.forecast_years = 10;
    let out = valuation::value_company(&inputs).unwrap();

    assert_eq!(out.result.revenue.len(), 10);
    // Year 6 onwards grows at the last supplied rate (6%)
    assert_eq!(out.result.revenue[5], out.result.revenue[4] * dec!(1.06));
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("revenue_growth") && w.contains("carried forward")));
}

#[test]
fn test_empty_growth_is_invalid_input() {
    let mut inputs = ValuationInputs::example();
    inputs.operating.revenue_growth.clear();
    let err = run_pipeline(&inputs).unwrap_err();
    assert!(matches!(err, IntrinsicError::InvalidInput { .. }));
}

// ===========================================================================
// Terminal value
// ===========================================================================

#[test]
fn test_perpetuity_growth_at_or_above_wacc_is_undefined() {
    for growth in [dec!(0.092525), dec!(0.12)] {
        let mut inputs = with_method(TerminalMethod::Perpetuity);
        inputs.terminal.perpetual_growth = growth;
        let err = run_pipeline(&inputs).unwrap_err();
        assert!(
            matches!(err, IntrinsicError::TerminalValueUndefined { .. }),
            "g = {growth} should be undefined"
        );
    }
}

#[test]
fn test_razor_thin_spread_is_error_not_panic() {
    let mut inputs = with_method(TerminalMethod::Perpetuity).with_wacc(dec!(0.0925));
    inputs.terminal.perpetual_growth = dec!(0.0924999999999999999999999);
    let err = run_pipeline(&inputs).unwrap_err();
    assert!(matches!(err, IntrinsicError::Overflow { .. }));
}

#[test]
fn test_exit_multiple_ignores_growth_precondition() {
    let mut inputs = with_method(TerminalMethod::ExitMultiple);
    inputs.terminal.perpetual_growth = dec!(0.12);
    assert!(run_pipeline(&inputs).is_ok());
}

#[test]
fn test_blended_is_weighted_average() {
    let perp = run_pipeline(&with_method(TerminalMethod::Perpetuity)).unwrap();
    let exit = run_pipeline(&with_method(TerminalMethod::ExitMultiple)).unwrap();
    let blended = run_pipeline(&with_method(TerminalMethod::Blended)).unwrap();

    assert_eq!(
        blended.terminal_value,
        perp.terminal_value * dec!(0.5) + exit.terminal_value * dec!(0.5)
    );
    let half_sum = (perp.terminal_value + exit.terminal_value) / dec!(2);
    assert!((blended.terminal_value - half_sum).abs() < dec!(0.000001));
}

#[test]
fn test_exit_basis_changes_terminal_value() {
    let inputs = with_method(TerminalMethod::ExitMultiple);
    let forecast = project(&inputs).unwrap();
    let wacc = discount_rate(&inputs).wacc;

    let ebitda = terminal_value(&forecast, wacc, &inputs).unwrap();
    let mut ebit_inputs = inputs.clone();
    ebit_inputs.terminal.exit_basis = ExitBasis::Ebit;
    let ebit = terminal_value(&forecast, wacc, &ebit_inputs).unwrap();

    // EBITDA proxy = EBIT + revenue * depreciation rate
    let last = forecast.revenue.len() - 1;
    assert_eq!(ebitda - ebit, forecast.revenue[last] * dec!(0.05) * dec!(12));
}

// ===========================================================================
// Assembly
// ===========================================================================

#[test]
fn test_equity_bridge_reference() {
    let capital = CapitalStructure {
        shares_outstanding: dec!(1_000_000),
        diluted_shares: Decimal::ZERO,
        total_debt: dec!(3_000_000),
        cash: dec!(1_000_000),
        preferred_equity: Decimal::ZERO,
        minority_interest: Decimal::ZERO,
        non_operating_assets: Decimal::ZERO,
    };
    let (net_debt, equity) = equity_bridge(dec!(10_000_000), &capital).unwrap();
    assert_eq!(net_debt, dec!(2_000_000));
    assert_eq!(equity, dec!(8_000_000));
}

#[test]
fn test_mid_year_shifts_each_term_by_half_period() {
    let end = run_pipeline(&ValuationInputs::example()).unwrap();
    let mut inputs = ValuationInputs::example();
    inputs.mid_year_convention = true;
    let mid = run_pipeline(&inputs).unwrap();

    let half_period = (Decimal::ONE + end.wacc).sqrt().unwrap();
    for (i, (m, e)) in mid.pv_fcff.iter().zip(&end.pv_fcff).enumerate() {
        let ratio = *m / *e;
        assert!(
            (ratio - half_period).abs() < dec!(0.000001),
            "year {}: ratio {ratio} vs {half_period}",
            i + 1
        );
    }
    assert_eq!(mid.pv_of_terminal, end.pv_of_terminal);
    assert_eq!(mid.terminal_value, end.terminal_value);
}

#[test]
fn test_full_run_is_deterministic() {
    let inputs = ValuationInputs::example();
    let first = valuation::value_company(&inputs).unwrap();
    let second = valuation::value_company(&inputs).unwrap();
    assert_eq!(first.result, second.result);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn test_inputs_survive_json_round_trip() {
    let inputs = ValuationInputs::example();
    let json = serde_json::to_string(&inputs).unwrap();
    let back: ValuationInputs = serde_json::from_str(&json).unwrap();
    assert_eq!(run_pipeline(&back).unwrap(), run_pipeline(&inputs).unwrap());
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(32))]

    #[test]
    fn prop_pipeline_is_deterministic(
        growth_bp in -500i64..2500,
        margin_bp in -1000i64..4000,
        years in 1u32..=10,
        mid_year in proptest::bool::ANY,
    ) {
        let mut inputs = ValuationInputs::example();
        inputs.forecast_years = years;
        inputs.mid_year_convention = mid_year;
        inputs.operating.revenue_growth = vec![Decimal::new(growth_bp, 4)];
        inputs.operating.ebit_margin = vec![Decimal::new(margin_bp, 4)];

        let first = run_pipeline(&inputs).unwrap();
        let second = run_pipeline(&inputs).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.fcff.len(), years as usize);
        prop_assert_eq!(first.enterprise_value, first.pv_of_fcff + first.pv_of_terminal);
    }

    #[test]
    fn prop_perpetuity_defined_iff_growth_below_wacc(growth_bp in 0i64..1500) {
        let mut inputs = with_method(TerminalMethod::Perpetuity);
        inputs.terminal.perpetual_growth = Decimal::new(growth_bp, 4);
        let wacc = discount_rate(&inputs).wacc;

        match run_pipeline(&inputs) {
            Ok(out) => prop_assert!(inputs.terminal.perpetual_growth < wacc && out.terminal_value > Decimal::ZERO),
            Err(e) => prop_assert!(e.is_terminal_undefined() && inputs.terminal.perpetual_growth >= wacc),
        }
    }
}
