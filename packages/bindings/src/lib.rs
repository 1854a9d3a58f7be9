use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use intrinsic_core::financials::ExtractedFinancials;
use intrinsic_core::scenarios::{SensitivityAxes, StepConfig};
use intrinsic_core::ValuationInputs;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn value_company(input_json: String) -> NapiResult<String> {
    let input: ValuationInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = intrinsic_core::valuation::value_company(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn discount_rate(input_json: String) -> NapiResult<String> {
    let input: ValuationInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = intrinsic_core::valuation::discount_rate(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn example_inputs() -> NapiResult<String> {
    serde_json::to_string(&ValuationInputs::example()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SensitivityRequest {
    inputs: ValuationInputs,
    axes: SensitivityAxes,
    #[serde(default)]
    steps: Option<usize>,
    #[serde(default)]
    row_step: Option<Decimal>,
    #[serde(default)]
    col_step: Option<Decimal>,
}

/// `{"inputs": {...}, "axes": "wacc_terminal_growth", "steps": 9}`; step
/// sizes default per axis.
#[napi]
pub fn sensitivity(input_json: String) -> NapiResult<String> {
    let request: SensitivityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let mut config = StepConfig::default_for(request.axes);
    if let Some(steps) = request.steps {
        config.steps = steps;
    }
    if let Some(step) = request.row_step {
        config.row_step = step;
    }
    if let Some(step) = request.col_step {
        config.col_step = step;
    }
    let output = intrinsic_core::scenarios::run_sensitivity(&request.inputs, request.axes, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financials
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PopulateRequest {
    base: Option<ValuationInputs>,
    financials: ExtractedFinancials,
}

/// `{"base": {...} | null, "financials": {...}}`; a missing base uses the
/// bundled example inputs.
#[napi]
pub fn auto_populate(input_json: String) -> NapiResult<String> {
    let request: PopulateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let base = request.base.unwrap_or_else(ValuationInputs::example);
    let output = intrinsic_core::financials::auto_populate(&base, &request.financials)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
