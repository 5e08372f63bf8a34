//! Return and risk statistics over plain value series.
//!
//! Conventions follow the usual finance-library defaults: sample standard
//! deviation (n - 1), linear interpolation between order statistics for
//! quantiles, ordinary least squares for regression slopes.

use ndarray::{Array1, ArrayView1};
use ndarray_stats::{interpolate::Linear, Quantile1dExt};
use noisy_float::types::n64;

use super::TRADING_DAYS_PER_YEAR;

/// Period-over-period percent change, `v[i] / v[i-1] - 1`.
///
/// The result is one element shorter than the input.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Percentage change from the first to the last value.
pub fn total_return_percent(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) => (last / first - 1.0) * 100.0,
        _ => f64::NAN,
    }
}

/// Arithmetic mean (NaN for an empty series).
pub fn mean(values: &[f64]) -> f64 {
    ArrayView1::from(values).mean().unwrap_or(f64::NAN)
}

/// Sample standard deviation with an n - 1 denominator.
///
/// Undefined (NaN) for fewer than two observations.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    ArrayView1::from(values).std(1.0)
}

/// Scale a daily standard deviation to an annual percentage.
pub fn annualized_volatility(std_dev: f64) -> f64 {
    std_dev * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Annualized Sharpe ratio of daily returns with a zero risk-free rate.
///
/// Returns 0.0 when the standard deviation is exactly zero.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let std_dev = sample_std_dev(returns);
    if std_dev == 0.0 {
        return 0.0;
    }
    mean(returns) / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Empirical quantile at probability `q` using linear interpolation.
///
/// Non-finite values are ignored. NaN when no finite value remains or `q` is
/// outside [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }

    let mut data: Array1<_> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| n64(v))
        .collect();
    data.quantile_mut(n64(q), &Linear)
        .map(|v| v.raw())
        .unwrap_or(f64::NAN)
}

/// Least-squares slope of `y` regressed on `x`.
///
/// NaN with fewer than two points, mismatched lengths, or constant `x`.
pub fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.len() != y.len() {
        return f64::NAN;
    }
    linreg::linear_regression::<f64, f64, f64>(x, y)
        .map(|(slope, _intercept)| slope)
        .unwrap_or(f64::NAN)
}

/// Rescale values so the first equals 100.
pub fn indexed_to_100(values: &[f64]) -> Vec<f64> {
    match values.first() {
        Some(&first) => values.iter().map(|v| v / first * 100.0).collect(),
        None => Vec::new(),
    }
}
