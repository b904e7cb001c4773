use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use previdencia_core::solver::solve_rate;

/// A dated cash flow: negative = outflow, positive = inflow.
#[derive(Debug, Deserialize)]
struct FlowEntry {
    date: NaiveDate,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct XirrOutput {
    rate: Option<Decimal>,
    rate_pct: Option<Decimal>,
}

/// Arguments for the XIRR solver
#[derive(Args)]
pub struct XirrArgs {
    /// Path to the cash flows (JSON array of {date, amount}); stdin
    /// when omitted
    #[arg(long)]
    pub flows: Option<String>,
}

pub fn run_xirr(args: XirrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flows: Vec<FlowEntry> = match args.flows.as_deref() {
        Some(path) => crate::input::read_json(path)?,
        None => match crate::input::read_stdin()? {
            Some(value) => serde_json::from_value(value)?,
            None => return Err("--flows <file.json> or stdin required".into()),
        },
    };

    let dates: Vec<NaiveDate> = flows.iter().map(|flow| flow.date).collect();
    let amounts: Vec<Decimal> = flows.iter().map(|flow| flow.amount).collect();

    let rate = solve_rate(&dates, &amounts);
    let output = XirrOutput {
        rate,
        rate_pct: rate.map(|r| r * Decimal::from(100)),
    };
    Ok(serde_json::to_value(output)?)
}
