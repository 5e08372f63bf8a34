//! Portfolio report CLI - analyze holdings against historical prices.
//!
//! Prints JSON responses on stdout; logs go to stderr.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use portfolio_analytics::{
    analyze, load_holdings, run_report, AnalysisOptions, ApiResponse, CsvPriceSource,
    PriceSource, ReportConfig,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portfolio-report")]
#[command(about = "Portfolio performance analytics and reporting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze holdings against a price file and print the metrics
    Analyze {
        /// CSV file with Ticker,Shares columns
        #[arg(long)]
        holdings: PathBuf,
        /// Wide CSV file of daily prices
        #[arg(long)]
        prices: PathBuf,
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// First date to exclude (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Confidence level for VaR (0.95 = 95%)
        #[arg(long, default_value = "0.95")]
        confidence: f64,
        /// Benchmark column in the price file
        #[arg(long)]
        benchmark: Option<String>,
    },
    /// Generate a report file from a config
    Report {
        /// Config file (defaults to the user config path)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Config file (defaults to the user config path)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            holdings,
            prices,
            start,
            end,
            confidence,
            benchmark,
        } => handle_analyze(holdings, prices, start, end, confidence, benchmark),
        Commands::Report { config } => handle_report(config),
        Commands::Config { config } => handle_config(config),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", to_json(&ApiResponse::<()>::err(e.to_string())));
            ExitCode::FAILURE
        }
    }
}

fn to_json<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{e}\"}}"))
}

fn handle_analyze(
    holdings: PathBuf,
    prices: PathBuf,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    confidence: f64,
    benchmark: Option<String>,
) -> portfolio_analytics::Result<String> {
    let holdings = load_holdings(&holdings)?;

    let mut options = AnalysisOptions::default().with_confidence(confidence);
    let mut symbols = holdings.symbols();
    if let Some(symbol) = &benchmark {
        options = options.with_benchmark_column(symbol);
        symbols.push(symbol.clone());
    }

    let table = CsvPriceSource::new(prices).fetch(&symbols, start, end)?;
    let metrics = analyze(&table, &holdings, &options)?;

    Ok(to_json(&ApiResponse::ok(metrics)))
}

fn handle_report(config: Option<PathBuf>) -> portfolio_analytics::Result<String> {
    let path = config.unwrap_or_else(ReportConfig::default_path);
    let config = ReportConfig::load(&path)?;
    let metrics = run_report(&config)?;

    Ok(to_json(&ApiResponse::ok(json!({
        "output_file": config.output_file,
        "total_current_value": metrics.total_current_value,
        "total_return_percent": metrics.total_return_percent,
        (metrics.value_at_risk.label()): metrics.value_at_risk.amount,
    }))))
}

fn handle_config(config: Option<PathBuf>) -> portfolio_analytics::Result<String> {
    let path = config.unwrap_or_else(ReportConfig::default_path);
    let config = ReportConfig::load(&path)?;

    Ok(to_json(&ApiResponse::ok(json!({
        "path": path,
        "exists": path.exists(),
        "config": config,
    }))))
}
