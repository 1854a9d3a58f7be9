use intrinsic_core::inputs::TerminalMethod;
use intrinsic_core::scenarios::{
    run_sensitivity, sensitivity, SensitivityAxes, SensitivityCell, StepConfig,
};
use intrinsic_core::valuation::run_pipeline;
use intrinsic_core::ValuationInputs;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

#[test]
fn test_centre_cell_equals_base_valuation() {
    let inputs = ValuationInputs::example();
    let base = run_pipeline(&inputs).unwrap();
    let config = StepConfig {
        steps: 5,
        row_step: dec!(0.01),
        col_step: dec!(0.0025),
    };
    let table = sensitivity(&inputs, SensitivityAxes::WaccTerminalGrowth, &config).unwrap();

    assert_eq!(table.base_case_position, (2, 2));
    assert_eq!(table.cell(2, 2), Some(SensitivityCell::Value(base.intrinsic_value_per_share)));
    assert_eq!(table.row_labels, vec!["7.25%", "8.25%", "9.25%", "10.25%", "11.25%"]);
}

#[test]
fn test_single_step_grid_is_base_case() {
    let inputs = ValuationInputs::example();
    let config = StepConfig {
        steps: 1,
        row_step: dec!(0.005),
        col_step: dec!(0.5),
    };
    let table = sensitivity(&inputs, SensitivityAxes::WaccExitMultiple, &config).unwrap();
    assert_eq!(table.matrix.len(), 1);
    assert_eq!(
        table.base_case_value,
        SensitivityCell::Value(run_pipeline(&inputs).unwrap().intrinsic_value_per_share)
    );
}

#[test]
fn test_undefined_base_case_keeps_valid_cells() {
    let mut inputs = ValuationInputs::example();
    inputs.terminal.method = TerminalMethod::Perpetuity;
    inputs.terminal.perpetual_growth = dec!(0.095);
    let axes = SensitivityAxes::WaccTerminalGrowth;
    let out = run_sensitivity(&inputs, axes, &StepConfig::default_for(axes)).unwrap();
    let table = &out.result;

    // Base WACC 9.2525% is below g = 9.5%
    assert_eq!(table.base_case_value, SensitivityCell::Invalid);
    assert_eq!(table.cell(4, 4), Some(SensitivityCell::Invalid));

    // Highest WACC (11.2525%) against lowest growth (7.5%) is an ordinary valuation
    let standalone = run_pipeline(&inputs.with_wacc(dec!(0.112525)).with_terminal_growth(dec!(0.075)))
        .unwrap()
        .intrinsic_value_per_share;
    assert_eq!(table.cell(8, 0), Some(SensitivityCell::Value(standalone)));
    assert!(out.warnings.iter().any(|w| w.starts_with("Base case")));
}

#[test]
fn test_overflowing_cell_is_invalid_not_fatal() {
    // Growth columns step by 1e-25 around 9.25%, so on the base WACC row the
    // spread is either non-positive or too thin to value.
    let mut inputs = ValuationInputs::example().with_wacc(dec!(0.0925));
    inputs.terminal.method = TerminalMethod::Perpetuity;
    inputs.terminal.perpetual_growth = dec!(0.0924999999999999999999999);
    let config = StepConfig {
        steps: 3,
        row_step: dec!(0.01),
        col_step: dec!(0.0000000000000000000000001),
    };
    let table = sensitivity(&inputs, SensitivityAxes::WaccTerminalGrowth, &config).unwrap();

    // Centre: spread of 1e-25
    assert_eq!(table.base_case_value, SensitivityCell::Invalid);
    // Higher WACC row is an ordinary valuation
    assert!(table.cell(2, 1).unwrap().value().is_some());
}

#[test]
fn test_envelope_reports_invalid_cells() {
    let mut inputs = ValuationInputs::example();
    inputs.terminal.method = TerminalMethod::Blended;
    inputs.terminal.perpetual_growth = dec!(0.08);
    let axes = SensitivityAxes::WaccTerminalGrowth;
    let out = run_sensitivity(&inputs, axes, &StepConfig::default_for(axes)).unwrap();

    assert!(out.result.invalid_count() > 0);
    assert!(out.warnings.iter().any(|w| w.contains("marked invalid")));
    assert_eq!(out.assumptions["axes"], "wacc_terminal_growth");
}

#[test]
fn test_cells_serialize_as_value_or_invalid() {
    let mut inputs = ValuationInputs::example();
    inputs.terminal.perpetual_growth = dec!(0.08);
    let axes = SensitivityAxes::WaccTerminalGrowth;
    let table = sensitivity(&inputs, axes, &StepConfig::default_for(axes)).unwrap();
    let json = serde_json::to_value(&table).unwrap();

    // Lowest WACC (7.2525%) against highest growth (10%)
    assert_eq!(json["matrix"][0][8], "invalid");
    assert!(json["matrix"][4][4]["value"].is_string());
}

#[test]
fn test_exit_multiple_only_model_has_no_invalid_cells() {
    let mut inputs = ValuationInputs::example();
    inputs.terminal.method = TerminalMethod::ExitMultiple;
    inputs.terminal.perpetual_growth = dec!(0.20);
    let axes = SensitivityAxes::WaccExitMultiple;
    let table = sensitivity(&inputs, axes, &StepConfig::default_for(axes)).unwrap();

    assert_eq!(table.invalid_count(), 0);
    // Value rises with the multiple along the base row
    let row = &table.matrix[4];
    assert!(row[0].value().unwrap() < row[8].value().unwrap());
}

#[test]
fn test_non_positive_step_rejected() {
    let config = StepConfig {
        steps: 9,
        row_step: dec!(0),
        col_step: dec!(0.005),
    };
    let err = sensitivity(
        &ValuationInputs::example(),
        SensitivityAxes::RevenueGrowthEbitMargin,
        &config,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        intrinsic_core::IntrinsicError::InvalidInput { .. }
    ));
}

#[test]
fn test_growth_axis_labels_year_one_but_shifts_every_year() {
    let inputs = ValuationInputs::example();
    let config = StepConfig {
        steps: 3,
        row_step: dec!(0.02),
        col_step: dec!(0.01),
    };
    let table = sensitivity(&inputs, SensitivityAxes::RevenueGrowthEbitMargin, &config).unwrap();

    // Row 2 is labelled with the shifted year-1 growth only
    assert_eq!(table.row_values[2], inputs.operating.revenue_growth[0] + dec!(0.02));

    // ...but values the inputs with every year shifted
    let shifted = inputs
        .with_growth_shift(dec!(0.02))
        .unwrap()
        .with_margin_shift(dec!(0.00))
        .unwrap();
    let expected = run_pipeline(&shifted).unwrap().intrinsic_value_per_share;
    assert_eq!(table.matrix[2][1], SensitivityCell::Value(expected));
}
