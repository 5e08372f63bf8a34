//! Portfolio Analytics - performance metrics and reporting from historical prices.
//!
//! This crate turns a table of daily prices and a set of share holdings into
//! a portfolio value history and a set of risk/return statistics:
//!
//! - **Analysis**: total return, annualized volatility, Sharpe ratio,
//!   historical Value-at-Risk, benchmark alpha/beta
//! - **Data**: CSV price source with forward-filling, holdings loader
//! - **Reporting**: Markdown and JSON renderers
//! - **Pipeline**: config-driven end-to-end report generation
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portfolio_analytics::{analyze, AnalysisOptions, Holding, Holdings, PriceTable};
//!
//! let dates: Vec<NaiveDate> = (1..=4)
//!     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
//!     .collect();
//! let prices = PriceTable::new(
//!     dates,
//!     vec![("STOCKA".to_string(), vec![100.0, 102.0, 101.0, 105.0])],
//! )
//! .unwrap();
//! let holdings = Holdings::new(vec![Holding::new("STOCKA", 10.0)]).unwrap();
//!
//! let metrics = analyze(&prices, &holdings, &AnalysisOptions::default()).unwrap();
//! assert!((metrics.total_return_percent - 5.0).abs() < 1e-9);
//! assert_eq!(metrics.total_current_value, 1050.0);
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, BenchmarkComparison, Holding, Holdings, MetricsResult, PortfolioHistory,
    PriceTable, TimeSeries, ValueAtRisk,
};

// Re-export main functionality
pub use analysis::{analyze, AnalysisOptions, BenchmarkSource, TRADING_DAYS_PER_YEAR};
pub use config::{ReportConfig, ReportFormat};
pub use data::{load_holdings, CsvPriceSource, PriceSource};
pub use pipeline::run_report;
pub use report::{write_report, IndexedChart, JsonReport, MarkdownReport, ReportRenderer};

/// Error types for portfolio-analytics operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type for portfolio-analytics operations.
pub type Result<T> = std::result::Result<T, Error>;
