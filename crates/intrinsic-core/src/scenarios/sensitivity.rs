use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{checked, IntrinsicError};
use crate::inputs::ValuationInputs;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::valuation::{discount_rate, run_pipeline};
use crate::IntrinsicResult;

/// Default number of points per axis (centre plus four either side).
pub const DEFAULT_STEPS: usize = 9;
/// Default rate step: 50 basis points.
pub const DEFAULT_RATE_STEP: Decimal = dec!(0.005);
/// Default exit multiple step: half a turn.
pub const DEFAULT_MULTIPLE_STEP: Decimal = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Pair of assumptions swept against each other. The first named is the row axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityAxes {
    WaccTerminalGrowth,
    WaccExitMultiple,
    RevenueGrowthEbitMargin,
}

impl SensitivityAxes {
    pub fn row_name(&self) -> &'static str {
        match self {
            SensitivityAxes::WaccTerminalGrowth | SensitivityAxes::WaccExitMultiple => "WACC",
            SensitivityAxes::RevenueGrowthEbitMargin => "Revenue Growth",
        }
    }

    pub fn col_name(&self) -> &'static str {
        match self {
            SensitivityAxes::WaccTerminalGrowth => "Terminal Growth",
            SensitivityAxes::WaccExitMultiple => "Exit Multiple",
            SensitivityAxes::RevenueGrowthEbitMargin => "EBIT Margin",
        }
    }

    fn col_is_multiple(&self) -> bool {
        matches!(self, SensitivityAxes::WaccExitMultiple)
    }
}

/// Grid shape: an odd number of points per axis, centred on the base case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub steps: usize,
    pub row_step: Decimal,
    pub col_step: Decimal,
}

impl StepConfig {
    /// 9 x 9 grid, 50bp per rate step, 0.5x per multiple step.
    pub fn default_for(axes: SensitivityAxes) -> Self {
        StepConfig {
            steps: DEFAULT_STEPS,
            row_step: DEFAULT_RATE_STEP,
            col_step: if axes.col_is_multiple() {
                DEFAULT_MULTIPLE_STEP
            } else {
                DEFAULT_RATE_STEP
            },
        }
    }
}

/// A single grid cell: intrinsic value per share, or invalid when the
/// perturbed terminal growth meets or exceeds the perturbed WACC (or the
/// perturbed valuation leaves the decimal range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityCell {
    Value(Money),
    Invalid,
}

impl SensitivityCell {
    pub fn value(&self) -> Option<Money> {
        match self {
            SensitivityCell::Value(v) => Some(*v),
            SensitivityCell::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, SensitivityCell::Invalid)
    }
}

/// Output of a 2-way sensitivity run.
///
/// On the revenue growth / EBIT margin axes every forecast year is shifted by
/// the same offset, but the row and column values and labels show the
/// first-year rate only. A row labelled "17.00%" means "year-1 growth of 17%,
/// every later year shifted by the same +2%", not 17% in every year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    pub axes: SensitivityAxes,
    pub row_name: String,
    pub col_name: String,
    /// Absolute row-axis values (e.g. WACC), ascending
    pub row_values: Vec<Decimal>,
    pub col_values: Vec<Decimal>,
    /// Display keys for each row / column ("9.25%", "12.0x")
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// matrix[i][j] = output at row_values[i], col_values[j]
    pub matrix: Vec<Vec<SensitivityCell>>,
    /// Centre cell; invalid when the base case itself has g >= WACC
    pub base_case_value: SensitivityCell,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

impl SensitivityTable {
    pub fn cell(&self, row: usize, col: usize) -> Option<SensitivityCell> {
        self.matrix.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn invalid_count(&self) -> usize {
        self.matrix
            .iter()
            .flat_map(|r| r.iter())
            .filter(|c| c.is_invalid())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Re-run the full valuation for every (row, col) perturbation.
///
/// The centre cell is computed on the unperturbed inputs, so it matches the
/// base case exactly. An undefined base case does not abort the grid: the
/// centre is marked invalid like any other cell.
pub fn sensitivity(
    inputs: &ValuationInputs,
    axes: SensitivityAxes,
    config: &StepConfig,
) -> IntrinsicResult<SensitivityTable> {
    validate_config(config)?;

    let base_wacc = discount_rate(inputs).wacc;
    let (row_base, col_base) = match axes {
        SensitivityAxes::WaccTerminalGrowth => (base_wacc, inputs.terminal.perpetual_growth),
        SensitivityAxes::WaccExitMultiple => (base_wacc, inputs.terminal.exit_multiple),
        // Growth and margin are per-year, so the axis is the shift applied to every year
        SensitivityAxes::RevenueGrowthEbitMargin => (
            first_or_zero(&inputs.operating.revenue_growth),
            first_or_zero(&inputs.operating.ebit_margin),
        ),
    };

    let row_offsets = centred_offsets(config.steps, config.row_step)?;
    let col_offsets = centred_offsets(config.steps, config.col_step)?;
    let row_values = axis_values(row_base, &row_offsets)?;
    let col_values = axis_values(col_base, &col_offsets)?;
    let mid = config.steps / 2;

    let mut matrix = Vec::with_capacity(row_offsets.len());
    for i in 0..row_offsets.len() {
        let mut row = Vec::with_capacity(col_offsets.len());
        for j in 0..col_offsets.len() {
            let perturbed = if i == mid && j == mid {
                Ok(inputs.clone())
            } else {
                let point = AxisPoint {
                    row_value: row_values[i],
                    col_value: col_values[j],
                    row_delta: row_offsets[i],
                    col_delta: col_offsets[j],
                };
                perturb(inputs, axes, point)
            };
            row.push(evaluate(perturbed)?);
        }
        matrix.push(row);
    }

    let base_case_value = matrix[mid][mid];

    let row_labels = row_values.iter().map(|v| percent_label(*v)).collect();
    let col_labels = col_values
        .iter()
        .map(|v| {
            if axes.col_is_multiple() {
                multiple_label(*v)
            } else {
                percent_label(*v)
            }
        })
        .collect();

    Ok(SensitivityTable {
        axes,
        row_name: axes.row_name().to_string(),
        col_name: axes.col_name().to_string(),
        row_values,
        col_values,
        row_labels,
        col_labels,
        matrix,
        base_case_value,
        base_case_position: (mid, mid),
    })
}

/// [`sensitivity`] wrapped in the standard output envelope.
pub fn run_sensitivity(
    inputs: &ValuationInputs,
    axes: SensitivityAxes,
    config: &StepConfig,
) -> IntrinsicResult<ComputationOutput<SensitivityTable>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let table = sensitivity(inputs, axes, config)?;
    let invalid = table.invalid_count();
    if invalid > 0 {
        warnings.push(format!(
            "{invalid} cell(s) have terminal growth at or above WACC and are marked invalid"
        ));
    }
    if table.base_case_value.is_invalid() {
        warnings.push("Base case has no finite terminal value; only off-centre cells are valued".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity Analysis (full DCF per cell)",
        &serde_json::json!({
            "axes": axes,
            "steps": config.steps,
            "row_step": config.row_step,
            "col_step": config.col_step,
        }),
        warnings,
        elapsed,
        table,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_config(config: &StepConfig) -> IntrinsicResult<()> {
    if config.steps == 0 || config.steps % 2 == 0 {
        return Err(IntrinsicError::InvalidInput {
            field: "steps".into(),
            reason: format!("Steps must be odd so the grid has a centre, got {}", config.steps),
        });
    }
    if config.row_step <= Decimal::ZERO || config.col_step <= Decimal::ZERO {
        return Err(IntrinsicError::InvalidInput {
            field: "row_step / col_step".into(),
            reason: "Step sizes must be positive".into(),
        });
    }
    Ok(())
}

/// Offsets `-k*step ..= +k*step` for `steps = 2k + 1`.
fn centred_offsets(steps: usize, step: Decimal) -> IntrinsicResult<Vec<Decimal>> {
    let half = (steps / 2) as i64;
    (-half..=half)
        .map(|k| checked(step.checked_mul(Decimal::from(k)), "sensitivity step offset"))
        .collect()
}

fn axis_values(base: Decimal, offsets: &[Decimal]) -> IntrinsicResult<Vec<Decimal>> {
    offsets
        .iter()
        .map(|d| checked(base.checked_add(*d), "sensitivity axis value"))
        .collect()
}

/// One grid coordinate, both as an absolute axis value and as an offset from
/// the base case.
#[derive(Debug, Clone, Copy)]
struct AxisPoint {
    row_value: Decimal,
    col_value: Decimal,
    row_delta: Decimal,
    col_delta: Decimal,
}

fn perturb(
    inputs: &ValuationInputs,
    axes: SensitivityAxes,
    point: AxisPoint,
) -> IntrinsicResult<ValuationInputs> {
    Ok(match axes {
        SensitivityAxes::WaccTerminalGrowth => inputs
            .with_wacc(point.row_value)
            .with_terminal_growth(point.col_value),
        SensitivityAxes::WaccExitMultiple => inputs
            .with_wacc(point.row_value)
            .with_exit_multiple(point.col_value),
        SensitivityAxes::RevenueGrowthEbitMargin => inputs
            .with_growth_shift(point.row_delta)?
            .with_margin_shift(point.col_delta)?,
    })
}

/// Value one cell. Errors that belong to the cell's own assumptions mark it
/// invalid; anything else is a problem with the base inputs and aborts.
fn evaluate(perturbed: IntrinsicResult<ValuationInputs>) -> IntrinsicResult<SensitivityCell> {
    match perturbed.and_then(|p| run_pipeline(&p)) {
        Ok(out) => Ok(SensitivityCell::Value(out.intrinsic_value_per_share)),
        Err(e) if marks_cell_invalid(&e) => Ok(SensitivityCell::Invalid),
        Err(e) => Err(e),
    }
}

fn marks_cell_invalid(e: &IntrinsicError) -> bool {
    matches!(
        e,
        IntrinsicError::TerminalValueUndefined { .. } | IntrinsicError::Overflow { .. }
    )
}

fn first_or_zero(values: &[Decimal]) -> Decimal {
    values.first().copied().unwrap_or(Decimal::ZERO)
}

fn percent_label(v: Decimal) -> String {
    format!("{:.2}%", v * dec!(100))
}

fn multiple_label(v: Decimal) -> String {
    format!("{:.1}x", v)
}
