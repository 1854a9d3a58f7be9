mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use env_logger::Env;
use std::process;

use commands::scenarios::SensitivityArgs;
use commands::valuation::{PopulateArgs, ValueArgs, WaccArgs};

/// Discounted cash flow valuation
#[derive(Parser)]
#[command(
    name = "intrinsic",
    version,
    about = "Discounted cash flow valuation",
    long_about = "A CLI for FCFF discounted cash flow valuation with decimal precision. \
                  Supports full valuations, CAPM WACC, 2-way sensitivity grids, and \
                  seeding assumptions from historical financial statements."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full FCFF DCF valuation
    Value(ValueArgs),
    /// Calculate cost of equity, after-tax cost of debt and WACC
    Wacc(WaccArgs),
    /// Run a 2-way sensitivity grid on intrinsic value per share
    Sensitivity(SensitivityArgs),
    /// Seed valuation inputs from historical financials
    Populate(PopulateArgs),
    /// Print the bundled example inputs
    Example,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    Html,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::Wacc(args) => commands::valuation::run_wacc(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Populate(args) => commands::valuation::run_populate(args),
        Commands::Example => commands::valuation::run_example(),
        Commands::Version => {
            println!("intrinsic {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
