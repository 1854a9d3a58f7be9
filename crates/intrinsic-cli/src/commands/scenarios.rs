use clap::{Args, ValueEnum};
use log::debug;
use rust_decimal::Decimal;
use serde_json::Value;

use intrinsic_core::scenarios::{run_sensitivity as sensitivity_grid, SensitivityAxes, StepConfig};
use intrinsic_core::ValuationInputs;

use crate::input;

/// Which pair of assumptions to sweep
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AxesArg {
    /// WACC (rows) against terminal growth (columns)
    WaccGrowth,
    /// WACC (rows) against exit multiple (columns)
    WaccMultiple,
    /// Revenue growth shift (rows) against EBIT margin shift (columns)
    GrowthMargin,
}

impl From<AxesArg> for SensitivityAxes {
    fn from(arg: AxesArg) -> Self {
        match arg {
            AxesArg::WaccGrowth => SensitivityAxes::WaccTerminalGrowth,
            AxesArg::WaccMultiple => SensitivityAxes::WaccExitMultiple,
            AxesArg::GrowthMargin => SensitivityAxes::RevenueGrowthEbitMargin,
        }
    }
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML file with base case valuation inputs
    #[arg(long)]
    pub input: Option<String>,

    /// Axes to sweep
    #[arg(long, value_enum, default_value = "wacc-growth")]
    pub axes: AxesArg,

    /// Points per axis (odd, centred on the base case)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Row step size (e.g. 0.005 for 50bp)
    #[arg(long)]
    pub row_step: Option<Decimal>,

    /// Column step size (rate or multiple turns)
    #[arg(long)]
    pub col_step: Option<Decimal>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: ValuationInputs = input::load(args.input.as_deref(), "sensitivity")?;

    let axes: SensitivityAxes = args.axes.into();
    let mut config = StepConfig::default_for(axes);
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(step) = args.row_step {
        config.row_step = step;
    }
    if let Some(step) = args.col_step {
        config.col_step = step;
    }

    debug!(
        "{:?} grid for {}: {} steps, row step {}, col step {}",
        axes, inputs.company.ticker, config.steps, config.row_step, config.col_step
    );
    let result = sensitivity_grid(&inputs, axes, &config)?;
    Ok(serde_json::to_value(result)?)
}
