//! Report rendering.
//!
//! Renderers turn a [`MetricsResult`] into a document; [`write_report`] puts
//! it on disk.

mod chart;

pub use chart::IndexedChart;

use crate::analysis::stats::indexed_to_100;
use crate::types::MetricsResult;
use crate::Result;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;
use tracing::info;

/// Turns analysis results into a document.
pub trait ReportRenderer {
    fn render(&self, metrics: &MetricsResult) -> Result<String>;
}

/// Human-readable Markdown report.
///
/// Mirrors the layout of the printed performance report: portfolio metrics,
/// benchmark metrics, then the indexed performance comparison, as an
/// embedded chart image (when set) followed by a table.
#[derive(Debug, Clone)]
pub struct MarkdownReport {
    /// Maximum rows in the indexed performance table (at least 2)
    pub max_chart_rows: usize,
    /// Chart image linked from the report, relative to the report file
    pub chart_file: Option<String>,
}

impl Default for MarkdownReport {
    fn default() -> Self {
        Self {
            max_chart_rows: 24,
            chart_file: None,
        }
    }
}

impl MarkdownReport {
    pub fn new(max_chart_rows: usize) -> Self {
        Self {
            max_chart_rows,
            chart_file: None,
        }
    }

    /// Embed a chart image above the indexed table.
    pub fn with_chart(mut self, chart_file: &str) -> Self {
        self.chart_file = Some(chart_file.to_string());
        self
    }

    fn write_markdown(&self, out: &mut String, metrics: &MetricsResult) -> fmt::Result {
        let var = &metrics.value_at_risk;

        writeln!(out, "# Portfolio Performance Report\n")?;
        writeln!(
            out,
            "Analysis Period: {} to {}\n",
            metrics.start_date, metrics.end_date
        )?;

        writeln!(out, "## Portfolio Metrics\n")?;
        writeln!(out, "- Portfolio Value: {}", fmt_num(metrics.total_current_value))?;
        writeln!(out, "- Portfolio Return: {}%", fmt_num(metrics.total_return_percent))?;
        writeln!(
            out,
            "- Portfolio Volatility: {}%",
            fmt_num(metrics.annualized_volatility)
        )?;
        writeln!(out, "- Sharpe Ratio: {}", fmt_num(metrics.sharpe_ratio))?;
        writeln!(
            out,
            "- Value at Risk ({}%): {}",
            (var.confidence_level * 100.0).round(),
            fmt_num(var.amount)
        )?;

        match &metrics.benchmark {
            Some(bench) => {
                writeln!(out, "\n## Benchmark ({})\n", bench.symbol)?;
                writeln!(
                    out,
                    "- Benchmark Return: {}%",
                    fmt_num(bench.total_return_percent)
                )?;
                writeln!(
                    out,
                    "- Benchmark Volatility: {}%",
                    fmt_num(bench.annualized_volatility)
                )?;
                writeln!(out, "- Alpha (Excess Return): {}%", fmt_num(bench.alpha))?;
                writeln!(out, "- Beta (Market Sensitivity): {}", fmt_num(bench.beta))?;

                let title = format!("Portfolio vs {} (Indexed to 100)", bench.symbol);
                writeln!(out, "\n## {title}\n")?;
                self.write_chart_link(out, &title)?;
                writeln!(out, "| Date | Portfolio | {} |", bench.symbol)?;
                writeln!(out, "|------|----------:|------:|")?;

                let portfolio = &bench.portfolio_indexed_norm;
                for idx in sample_indices(portfolio.len(), self.max_chart_rows) {
                    let date = portfolio.dates[idx];
                    let benchmark = bench
                        .benchmark_indexed_norm
                        .get(date)
                        .map(fmt_num)
                        .unwrap_or_else(|| "-".to_string());
                    writeln!(
                        out,
                        "| {} | {} | {} |",
                        date,
                        fmt_num(portfolio.values[idx]),
                        benchmark
                    )?;
                }
            }
            None => {
                let history = &metrics.portfolio_history;
                let indexed = indexed_to_100(&history.total);

                let title = "Portfolio Value (Indexed to 100)";
                writeln!(out, "\n## {title}\n")?;
                self.write_chart_link(out, title)?;
                writeln!(out, "| Date | Portfolio |")?;
                writeln!(out, "|------|----------:|")?;
                for idx in sample_indices(indexed.len(), self.max_chart_rows) {
                    writeln!(
                        out,
                        "| {} | {} |",
                        history.dates[idx],
                        fmt_num(indexed[idx])
                    )?;
                }
            }
        }

        Ok(())
    }

    fn write_chart_link(&self, out: &mut String, title: &str) -> fmt::Result {
        match &self.chart_file {
            Some(file) => writeln!(out, "![{title}]({file})\n"),
            None => Ok(()),
        }
    }
}

impl ReportRenderer for MarkdownReport {
    fn render(&self, metrics: &MetricsResult) -> Result<String> {
        let mut out = String::new();
        self.write_markdown(&mut out, metrics)?;
        Ok(out)
    }
}

/// Full analysis result as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport;

impl ReportRenderer for JsonReport {
    fn render(&self, metrics: &MetricsResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(metrics)?)
    }
}

/// Render a report and write it to `path`, creating parent directories.
pub fn write_report(
    renderer: &dyn ReportRenderer,
    metrics: &MetricsResult,
    path: &Path,
) -> Result<()> {
    let content = renderer.render(metrics)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    info!("Report successfully generated: {}", path.display());
    Ok(())
}

/// Two-decimal formatting, `n/a` for undefined values.
fn fmt_num(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "n/a".to_string()
    }
}

/// Evenly spaced row indices, always keeping the first and last row.
fn sample_indices(len: usize, max_rows: usize) -> Vec<usize> {
    let max_rows = max_rows.max(2);
    if len <= max_rows {
        return (0..len).collect();
    }
    (0..max_rows)
        .map(|i| i * (len - 1) / (max_rows - 1))
        .collect()
}
