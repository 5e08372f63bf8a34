//! Portfolio performance analysis.
//!
//! [`analyze`] turns a price table and a set of holdings into a
//! [`MetricsResult`]: the portfolio value history, total return, annualized
//! volatility, Sharpe ratio, historical Value-at-Risk and, when a benchmark is
//! requested, alpha, beta and indexed comparison series.
//!
//! The analysis is a pure computation: it performs no I/O and does not log.
//!
//! Undefined daily returns (0/0) are dropped. Value-at-Risk uses the
//! empirical quantile of the finite daily returns (historical simulation).
//! With only a handful of returns the quantile is a coarse descriptive
//! figure, not a reliable tail estimate; it is still reported.

pub mod stats;

use crate::types::{
    check_increasing, BenchmarkComparison, Holdings, MetricsResult, PortfolioHistory, PriceTable,
    TimeSeries, ValueAtRisk,
};
use crate::{Error, Result};
use chrono::NaiveDate;

/// Assumed number of trading days per year.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Where the benchmark prices come from.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkSource {
    /// A column of the analyzed price table.
    Column(String),
    /// A separate price series, possibly on a different date index.
    Series { symbol: String, series: TimeSeries },
}

impl BenchmarkSource {
    /// Benchmark symbol.
    pub fn symbol(&self) -> &str {
        match self {
            BenchmarkSource::Column(symbol) => symbol,
            BenchmarkSource::Series { symbol, .. } => symbol,
        }
    }
}

/// Parameters of a performance analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Confidence level for VaR, exclusive range (0, 1)
    pub confidence_level: f64,
    /// Optional benchmark to compare against
    pub benchmark: Option<BenchmarkSource>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            benchmark: None,
        }
    }
}

impl AnalysisOptions {
    /// Set the VaR confidence level.
    pub fn with_confidence(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Compare against a column of the price table.
    pub fn with_benchmark_column(mut self, symbol: &str) -> Self {
        self.benchmark = Some(BenchmarkSource::Column(symbol.to_string()));
        self
    }

    /// Compare against a separately supplied price series.
    pub fn with_benchmark_series(mut self, symbol: &str, series: TimeSeries) -> Self {
        self.benchmark = Some(BenchmarkSource::Series {
            symbol: symbol.to_string(),
            series,
        });
        self
    }
}

/// Return statistics shared by the portfolio and the benchmark.
struct SeriesStats {
    returns: TimeSeries,
    total_return_percent: f64,
    annualized_volatility: f64,
}

impl SeriesStats {
    /// `dates` and `values` have equal length.
    fn from_series(dates: &[NaiveDate], values: &[f64]) -> Self {
        // Undefined 0/0 changes are dropped; each return keeps its own date
        let (return_dates, returns): (Vec<NaiveDate>, Vec<f64>) = dates
            .iter()
            .skip(1)
            .copied()
            .zip(stats::pct_change(values))
            .filter(|(_, r)| !r.is_nan())
            .unzip();

        let std_dev = stats::sample_std_dev(&returns);
        Self {
            total_return_percent: stats::total_return_percent(values),
            annualized_volatility: stats::annualized_volatility(std_dev),
            returns: TimeSeries {
                dates: return_dates,
                values: returns,
            },
        }
    }
}

/// Analyze portfolio performance.
///
/// # Arguments
///
/// * `prices` - Dense daily price table, at least two rows
/// * `holdings` - Shares held per symbol; every symbol must be a price column
/// * `options` - VaR confidence level and optional benchmark
///
/// # Errors
///
/// * [`Error::Validation`] if the confidence level is outside (0, 1) or a
///   benchmark series holds invalid prices
/// * [`Error::Schema`] if a holding or the benchmark column is missing from `prices`
/// * [`Error::DegenerateInput`] if fewer than two price rows are available
pub fn analyze(
    prices: &PriceTable,
    holdings: &Holdings,
    options: &AnalysisOptions,
) -> Result<MetricsResult> {
    let confidence = options.confidence_level;
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::Validation(format!(
            "Confidence level must be between 0 and 1 (exclusive), got {confidence}"
        )));
    }

    let missing: Vec<&str> = holdings
        .iter()
        .map(|h| h.symbol.as_str())
        .filter(|s| !prices.has_symbol(s))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Schema(format!(
            "Holdings reference symbols missing from prices: {}",
            missing.join(", ")
        )));
    }

    let benchmark_series = match &options.benchmark {
        None => None,
        Some(BenchmarkSource::Column(symbol)) => Some(prices.series(symbol).ok_or_else(|| {
            Error::Schema(format!("Benchmark {symbol} missing from prices"))
        })?),
        Some(BenchmarkSource::Series { symbol, series }) => {
            check_benchmark_series(symbol, series)?;
            Some(series.clone())
        }
    };

    if prices.len() < 2 {
        return Err(Error::DegenerateInput(format!(
            "Need at least 2 price rows to compute returns, got {}",
            prices.len()
        )));
    }

    let history = portfolio_history(prices, holdings, options.benchmark.as_ref());
    let portfolio = SeriesStats::from_series(&history.dates, &history.total);
    let dates = prices.dates();

    let total_current_value = history.total[history.total.len() - 1];

    // Non-finite returns are left out of the quantile; without any finite
    // return there is no observed loss
    let var_quantile = stats::quantile(&portfolio.returns.values, 1.0 - confidence);
    let value_at_risk = ValueAtRisk {
        confidence_level: confidence,
        amount: if var_quantile.is_nan() {
            0.0
        } else {
            (total_current_value * var_quantile).abs()
        },
    };

    let sharpe_ratio = stats::sharpe_ratio(&portfolio.returns.values);

    let benchmark = match (&options.benchmark, benchmark_series) {
        (Some(source), Some(series)) => Some(compare_to_benchmark(
            source.symbol(),
            series,
            &history,
            &portfolio,
        )),
        _ => None,
    };

    Ok(MetricsResult {
        start_date: dates[0],
        end_date: dates[dates.len() - 1],
        total_current_value,
        total_return_percent: portfolio.total_return_percent,
        annualized_volatility: portfolio.annualized_volatility,
        sharpe_ratio,
        value_at_risk,
        portfolio_history: history,
        daily_returns: portfolio.returns,
        benchmark,
    })
}

fn check_benchmark_series(symbol: &str, series: &TimeSeries) -> Result<()> {
    if series.len() < 2 {
        return Err(Error::DegenerateInput(format!(
            "Benchmark {symbol} needs at least 2 prices, got {}",
            series.len()
        )));
    }
    if series.dates.len() != series.values.len() {
        return Err(Error::Validation(format!(
            "Benchmark {symbol} has {} dates but {} values",
            series.dates.len(),
            series.values.len()
        )));
    }
    check_increasing(&series.dates)?;
    if let Some(bad) = series.values.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(Error::Validation(format!(
            "Benchmark {symbol} contains an invalid price: {bad}"
        )));
    }
    Ok(())
}

/// Value each holding on every date and sum the totals.
///
/// A holding of the benchmark column contributes nothing.
fn portfolio_history(
    prices: &PriceTable,
    holdings: &Holdings,
    benchmark: Option<&BenchmarkSource>,
) -> PortfolioHistory {
    let benchmark_column = match benchmark {
        Some(BenchmarkSource::Column(symbol)) => Some(symbol.as_str()),
        _ => None,
    };

    let mut symbols = Vec::with_capacity(holdings.len());
    let mut contributions = Vec::with_capacity(holdings.len());
    let mut total = vec![0.0; prices.len()];

    for holding in holdings.iter() {
        if benchmark_column == Some(holding.symbol.as_str()) {
            continue;
        }
        let Some(column) = prices.column(&holding.symbol) else {
            continue;
        };

        let values: Vec<f64> = column.iter().map(|p| p * holding.shares).collect();
        for (sum, value) in total.iter_mut().zip(&values) {
            *sum += value;
        }
        symbols.push(holding.symbol.clone());
        contributions.push(values);
    }

    PortfolioHistory {
        dates: prices.dates().to_vec(),
        symbols,
        contributions,
        total,
    }
}

fn compare_to_benchmark(
    symbol: &str,
    series: TimeSeries,
    history: &PortfolioHistory,
    portfolio: &SeriesStats,
) -> BenchmarkComparison {
    let bench = SeriesStats::from_series(&series.dates, &series.values);

    // Inner join on date
    let (x, y): (Vec<f64>, Vec<f64>) = portfolio
        .returns
        .iter()
        .filter_map(|(date, p)| bench.returns.get(date).map(|b| (b, p)))
        .unzip();

    let beta = if x.len() < 2 {
        f64::NAN
    } else {
        stats::ols_slope(&x, &y)
    };

    BenchmarkComparison {
        symbol: symbol.to_string(),
        total_return_percent: bench.total_return_percent,
        annualized_volatility: bench.annualized_volatility,
        alpha: portfolio.total_return_percent - bench.total_return_percent,
        beta,
        aligned_observations: x.len(),
        portfolio_indexed_norm: TimeSeries {
            dates: history.dates.clone(),
            values: stats::indexed_to_100(&history.total),
        },
        benchmark_indexed_norm: TimeSeries {
            dates: series.dates.clone(),
            values: stats::indexed_to_100(&series.values),
        },
        benchmark_history: series,
    }
}
