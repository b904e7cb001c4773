mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::benchmark::SimulateArgs;
use commands::solver::XirrArgs;
use commands::statement::{SummaryArgs, WindowArgs};
use commands::tables::{ContributionsTableArgs, PositionTableArgs};

/// Pension statement return analytics
#[derive(Parser)]
#[command(
    name = "prev",
    version,
    about = "Pension statement return analytics",
    long_about = "Computes annualized returns (XIRR over ANBIMA business days), \
                  partial-history reconciliation, and counterfactual benchmark \
                  simulations from already-parsed statement rows. Inputs are JSON \
                  files produced by the PDF-extraction and data-fetch layers."
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
    /// Whole-statement headline figures (position, invested, CAGR)
    Summary(SummaryArgs),
    /// Statistics for a date window, reconciled for invisible history
    Window(WindowArgs),
    /// Monthly position table, optionally joined with a benchmark
    PositionTable(PositionTableArgs),
    /// Monthly contributions table
    ContributionsTable(ContributionsTableArgs),
    /// Replay contributions into a benchmark and compare
    Simulate(SimulateArgs),
    /// Annualized rate of dated cash flows (252 business days/year)
    Xirr(XirrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Summary(args) => commands::statement::run_summary(args),
        Commands::Window(args) => commands::statement::run_window(args),
        Commands::PositionTable(args) => commands::tables::run_position_table(args),
        Commands::ContributionsTable(args) => commands::tables::run_contributions_table(args),
        Commands::Simulate(args) => commands::benchmark::run_simulate(args),
        Commands::Xirr(args) => commands::solver::run_xirr(args),
        Commands::Version => {
            println!("prev {}", env!("CARGO_PKG_VERSION"));
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
