use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgersync::{config::Config, report::MonthlyReport, state::LedgerState};
use ledgersync_core::storage::MonthKey;

/// ledgersync - Monthly overview of a personal finance ledger
#[derive(Parser, Debug)]
#[command(name = "ledgersync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Month to show (1-12), defaults to the current month
    #[arg(long, short, env = "LEDGER_MONTH", value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Year to show, defaults to the current year
    #[arg(long, short, env = "LEDGER_YEAR")]
    year: Option<i32>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgersync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let state = LedgerState::with_demo_data(&config).await;

    let today = state.clock.today();
    let month = cli.month.unwrap_or_else(|| today.month());
    let year = cli.year.unwrap_or_else(|| today.year());
    let month = MonthKey::new(month - 1, year)
        .with_context(|| format!("Invalid period {month}/{year}"))?;

    tracing::info!(%month, "Loading ledger");

    let report = MonthlyReport::load(&state, month).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{}", report.render(&state.currency));
    }

    Ok(())
}
