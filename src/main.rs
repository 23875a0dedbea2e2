mod config;
mod extractor;
mod loader;
mod models;
mod pipeline;
mod transformer;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "finanzas-etl",
    about = "Daily stock price ETL: Alpha Vantage → MySQL",
    version
)]
struct Cli {
    /// Ticker symbol to fetch
    #[arg(env = "ETL_SYMBOL", default_value = "AAPL")]
    symbol: String,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "finanzas_etl=info,warn",
        1 => "finanzas_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    // Missing configuration halts here, before any pipeline stage runs.
    let config = AppConfig::load()?;

    let symbol = cli.symbol.trim().to_uppercase();
    match Pipeline::new(config).run(&symbol).await {
        Ok(report) => info!(
            "Done: {} records transformed, {} rows appended",
            report.records, report.rows_written
        ),
        // Stage failures end the run with a diagnostic, not a crash.
        Err(e) => error!("{}: run aborted: {:#}", symbol, e),
    }

    Ok(())
}
