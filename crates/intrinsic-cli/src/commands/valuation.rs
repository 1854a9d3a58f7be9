use clap::Args;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::time::Instant;

use intrinsic_core::financials::{auto_populate, ExtractedFinancials};
use intrinsic_core::inputs::DiscountAssumptions;
use intrinsic_core::types::with_metadata;
use intrinsic_core::valuation::{self, discount_rate};
use intrinsic_core::ValuationInputs;

use crate::input;

/// Arguments for a full DCF valuation
#[derive(Args)]
pub struct ValueArgs {
    /// Path to JSON/YAML valuation inputs
    #[arg(long)]
    pub input: Option<String>,

    /// Discount explicit-period cash flows at mid-year
    #[arg(long)]
    pub mid_year: bool,

    /// Override the number of forecast years (1-10)
    #[arg(long)]
    pub years: Option<u32>,
}

/// Arguments for WACC calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Risk-free rate (e.g. 0.0425 for 4.25%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Equity risk premium (e.g. 0.06 for 6%)
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Statutory tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Target debt ratio D/(D+E)
    #[arg(long, alias = "debt-weight")]
    pub target_debt_ratio: Option<Decimal>,

    /// Path to JSON/YAML input: full valuation inputs or just the discount block
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for seeding inputs from historical financials
#[derive(Args)]
pub struct PopulateArgs {
    /// Base valuation inputs to seed (defaults to the bundled example)
    #[arg(long)]
    pub base: Option<String>,

    /// Extracted financials document (camelCase JSON/YAML)
    #[arg(long)]
    pub financials: String,
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut inputs: ValuationInputs = input::load(args.input.as_deref(), "valuation")?;
    if args.mid_year {
        inputs.mid_year_convention = true;
    }
    if let Some(years) = args.years {
        inputs.forecast_years = years;
    }
    debug!(
        "valuing {} over {} years (mid-year: {})",
        inputs.company.ticker, inputs.forecast_years, inputs.mid_year_convention
    );

    let result = valuation::value_company(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let assumptions: DiscountAssumptions = if let Some(ref path) = args.input {
        discount_block(input::file::read_input_value(path)?)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        discount_block(data)?
    } else {
        DiscountAssumptions {
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
            equity_risk_premium: args
                .equity_risk_premium
                .ok_or("--equity-risk-premium is required (or provide --input)")?,
            beta: args.beta.unwrap_or(dec!(1.0)),
            cost_of_debt: args
                .cost_of_debt
                .ok_or("--cost-of-debt is required (or provide --input)")?,
            tax_rate: args
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?,
            target_debt_ratio: args
                .target_debt_ratio
                .ok_or("--target-debt-ratio is required (or provide --input)")?,
            wacc_override: None,
        }
    };

    let rates = discount_rate::discount_rate_from(&assumptions);
    let warnings = discount_rate::rate_warnings(&assumptions, &rates);
    let elapsed = start.elapsed().as_micros() as u64;

    let result = with_metadata("CAPM cost of equity, after-tax WACC", &assumptions, warnings, elapsed, rates);
    Ok(serde_json::to_value(result)?)
}

pub fn run_populate(args: PopulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base = match args.base {
        Some(ref path) => input::file::read_input(path)?,
        None => ValuationInputs::example(),
    };
    let financials: ExtractedFinancials = input::file::read_input(&args.financials)?;
    debug!(
        "populating from {} with {} annual reports",
        args.financials,
        financials.annual_reports.len()
    );

    let result = auto_populate(&base, &financials)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_example() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(ValuationInputs::example())?)
}

/// Accept either full valuation inputs or a bare discount block.
fn discount_block(data: Value) -> Result<DiscountAssumptions, Box<dyn std::error::Error>> {
    let block = match data.get("discount") {
        Some(inner) => inner.clone(),
        None => data,
    };
    Ok(serde_json::from_value(block)?)
}
