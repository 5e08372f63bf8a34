//! Core data types for portfolio analytics.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub(crate) fn check_increasing(dates: &[NaiveDate]) -> Result<()> {
    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::Validation(format!(
            "Dates must be strictly increasing: {} is followed by {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// A dated series of values, ordered by date ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TimeSeries {
    /// Observation dates (strictly increasing)
    pub dates: Vec<NaiveDate>,
    /// One value per date
    pub values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series, checking that dates and values line up and dates increase.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(Error::Validation(format!(
                "Series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        check_increasing(&dates)?;
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First value in the series.
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Last value in the series.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Look up the value observed on a date.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Iterate over (date, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Dense table of daily prices: one row per date, one column per symbol.
///
/// Gaps must already be filled; use [`PriceTable::forward_filled`] when the
/// raw data has missing observations.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Create a price table from dates and named price columns.
    ///
    /// Every column must have one finite, non-negative price per date, column
    /// names must be unique and dates strictly increasing.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::Validation(
                "Price table needs at least one column".to_string(),
            ));
        }
        check_increasing(&dates)?;

        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (symbol, prices) in columns {
            if !seen.insert(symbol.clone()) {
                return Err(Error::Validation(format!("Duplicate price column: {symbol}")));
            }
            if prices.len() != dates.len() {
                return Err(Error::Validation(format!(
                    "Column {symbol} has {} prices for {} dates",
                    prices.len(),
                    dates.len()
                )));
            }
            if let Some(bad) = prices.iter().find(|p| !p.is_finite() || **p < 0.0) {
                return Err(Error::Validation(format!(
                    "Column {symbol} contains an invalid price: {bad}"
                )));
            }
            symbols.push(symbol);
            values.push(prices);
        }

        Ok(Self {
            dates,
            symbols,
            columns: values,
        })
    }

    /// Create a dense price table from columns with missing observations.
    ///
    /// Each gap takes the last observed price of the same column. Leading rows
    /// where any column has not been observed yet are dropped.
    pub fn forward_filled(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let mut start = 0;
        for (symbol, prices) in &columns {
            if prices.len() != dates.len() {
                return Err(Error::Validation(format!(
                    "Column {symbol} has {} prices for {} dates",
                    prices.len(),
                    dates.len()
                )));
            }
            match prices.iter().position(Option::is_some) {
                Some(first) => start = start.max(first),
                None => {
                    return Err(Error::Schema(format!("No prices available for {symbol}")));
                }
            }
        }

        let filled = columns
            .into_iter()
            .map(|(symbol, prices)| {
                let mut last = None;
                let values: Vec<f64> = prices
                    .into_iter()
                    .map(|p| {
                        if p.is_some() {
                            last = p;
                        }
                        last.unwrap_or(f64::NAN)
                    })
                    .skip(start)
                    .collect();
                (symbol, values)
            })
            .collect();

        Self::new(dates.into_iter().skip(start).collect(), filled)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names in table order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Check whether a symbol is a column of this table.
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Get the prices of one column.
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Get one column as a dated series.
    pub fn series(&self, symbol: &str) -> Option<TimeSeries> {
        self.column(symbol).map(|prices| TimeSeries {
            dates: self.dates.clone(),
            values: prices.to_vec(),
        })
    }
}

/// A holding of some number of shares of one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// Ticker symbol, matched exactly against price table columns
    pub symbol: String,
    /// Number of shares held (may be fractional, zero or negative)
    pub shares: f64,
}

impl Holding {
    /// Create a new holding.
    pub fn new(symbol: &str, shares: f64) -> Self {
        Self {
            symbol: symbol.trim().to_string(),
            shares,
        }
    }
}

/// A set of holdings with unique symbols.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Holdings {
    holdings: Vec<Holding>,
}

impl Holdings {
    /// Create a holdings set.
    ///
    /// Rejects an empty set, duplicate symbols and non-finite share counts.
    pub fn new(holdings: Vec<Holding>) -> Result<Self> {
        if holdings.is_empty() {
            return Err(Error::Validation("Holdings are empty".to_string()));
        }

        let mut seen = HashSet::new();
        for holding in &holdings {
            if !seen.insert(holding.symbol.as_str()) {
                return Err(Error::Validation(format!(
                    "Duplicate holding: {}",
                    holding.symbol
                )));
            }
            if !holding.shares.is_finite() {
                return Err(Error::Validation(format!(
                    "Shares for {} must be finite, got {}",
                    holding.symbol, holding.shares
                )));
            }
        }

        Ok(Self { holdings })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.iter()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Symbols in holding order.
    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }

    /// Shares held of a symbol.
    pub fn shares(&self, symbol: &str) -> Option<f64> {
        self.holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .map(|h| h.shares)
    }
}

/// Monetary value of each holding and of the whole portfolio, per date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioHistory {
    /// Same dates as the input price table
    pub dates: Vec<NaiveDate>,
    /// Held symbols, in holding order
    pub symbols: Vec<String>,
    /// price * shares, one column per symbol
    pub contributions: Vec<Vec<f64>>,
    /// Row-wise sum of contributions
    pub total: Vec<f64>,
}

impl PortfolioHistory {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Contribution column of one symbol.
    pub fn contribution(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|idx| self.contributions[idx].as_slice())
    }

    /// The "Total" column as a dated series.
    pub fn total_series(&self) -> TimeSeries {
        TimeSeries {
            dates: self.dates.clone(),
            values: self.total.clone(),
        }
    }
}

/// Historical Value-at-Risk at one confidence level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueAtRisk {
    /// Confidence level (e.g., 0.95 for 95%)
    pub confidence_level: f64,
    /// Potential one-day loss in currency units (never negative)
    pub amount: f64,
}

impl ValueAtRisk {
    /// Short key such as `var_95`.
    pub fn label(&self) -> String {
        format!("var_{}", (self.confidence_level * 100.0).round() as u32)
    }
}

/// Portfolio performance relative to a benchmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkComparison {
    /// Benchmark symbol
    pub symbol: String,
    /// Benchmark price series
    pub benchmark_history: TimeSeries,
    /// Benchmark total return percentage
    pub total_return_percent: f64,
    /// Benchmark annualized volatility percentage
    pub annualized_volatility: f64,
    /// Portfolio return minus benchmark return, in percentage points
    pub alpha: f64,
    /// Regression slope of portfolio returns on benchmark returns (NaN when undefined)
    pub beta: f64,
    /// Number of dates both return series share
    pub aligned_observations: usize,
    /// Portfolio total value rescaled so the first date is 100
    pub portfolio_indexed_norm: TimeSeries,
    /// Benchmark prices rescaled so the first date is 100
    pub benchmark_indexed_norm: TimeSeries,
}

/// Result of a performance analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsResult {
    /// First date of the analysis
    pub start_date: NaiveDate,
    /// Last date of the analysis
    pub end_date: NaiveDate,
    /// Portfolio value on the last date
    pub total_current_value: f64,
    /// Total return percentage from first to last date
    pub total_return_percent: f64,
    /// Annualized volatility percentage
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio (0.0 when returns do not vary)
    pub sharpe_ratio: f64,
    /// Historical Value-at-Risk
    pub value_at_risk: ValueAtRisk,
    /// Per-symbol and total portfolio value per date
    pub portfolio_history: PortfolioHistory,
    /// Daily returns of the portfolio total (first date and undefined 0/0 changes excluded)
    pub daily_returns: TimeSeries,
    /// Benchmark comparison, when a benchmark was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkComparison>,
}

/// API response wrapper for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
