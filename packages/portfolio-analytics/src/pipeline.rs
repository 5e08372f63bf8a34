//! End-to-end report generation: holdings and prices in, report file out.

use crate::analysis::analyze;
use crate::config::{ReportConfig, ReportFormat};
use crate::data::{load_holdings, CsvPriceSource, PriceSource};
use crate::report::{write_report, IndexedChart, JsonReport, MarkdownReport, ReportRenderer};
use crate::types::{Holdings, MetricsResult};
use crate::Result;
use tracing::info;

/// Fetch prices for `holdings` (plus the configured benchmark) and analyze them.
pub fn analyze_with_source(
    config: &ReportConfig,
    holdings: &Holdings,
    source: &dyn PriceSource,
) -> Result<MetricsResult> {
    let options = config.analysis_options();

    let mut symbols = holdings.symbols();
    if let Some(benchmark) = &options.benchmark {
        symbols.push(benchmark.symbol().to_string());
    }

    let prices = source.fetch(&symbols, config.start_date, config.end_date)?;
    let metrics = analyze(&prices, holdings, &options)?;
    info!(
        value = metrics.total_current_value,
        return_percent = metrics.total_return_percent,
        "Analysis complete"
    );
    Ok(metrics)
}

/// Run the full report pipeline described by `config`.
///
/// Loads holdings and prices from the configured CSV files, analyzes them and
/// writes the report to `config.output_file`, with the indexed chart next to
/// it unless `config.chart_file` is empty.
pub fn run_report(config: &ReportConfig) -> Result<MetricsResult> {
    let holdings = load_holdings(&config.holdings_file)?;
    let source = CsvPriceSource::new(&config.prices_file);
    let metrics = analyze_with_source(config, &holdings, &source)?;

    let chart_path = config.chart_path();
    if let Some(path) = &chart_path {
        write_report(&IndexedChart, &metrics, path)?;
    }

    let renderer: Box<dyn ReportRenderer> = match config.format {
        ReportFormat::Markdown => {
            let markdown = MarkdownReport::new(config.max_chart_rows);
            match chart_path {
                Some(_) => Box::new(markdown.with_chart(&config.chart_file)),
                None => Box::new(markdown),
            }
        }
        ReportFormat::Json => Box::new(JsonReport),
    };
    write_report(renderer.as_ref(), &metrics, &config.output_file)?;

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Holding, PriceTable};
    use crate::Error;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    /// In-memory source returning a fixed table.
    struct StaticSource(PriceTable);

    impl PriceSource for StaticSource {
        fn fetch(
            &self,
            symbols: &[String],
            _start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
        ) -> Result<PriceTable> {
            if let Some(missing) = symbols.iter().find(|s| !self.0.has_symbol(s)) {
                return Err(Error::Schema(format!("No column for {missing}")));
            }
            Ok(self.0.clone())
        }
    }

    fn write_inputs(dir: &std::path::Path) -> ReportConfig {
        let holdings_file = dir.join("portfolio.csv");
        let prices_file = dir.join("prices.csv");
        fs::write(&holdings_file, "Ticker,Shares\nSTOCKA,10\nSTOCKB,5\n").unwrap();
        fs::write(
            &prices_file,
            "Date,STOCKA,STOCKB,^GSPC\n\
             2023-12-29,99.0,199.0,399.0\n\
             2024-01-01,100.0,200.0,400.0\n\
             2024-01-02,102.0,200.0,404.0\n\
             2024-01-03,101.0,204.0,402.0\n\
             2024-01-04,105.0,208.0,410.0\n",
        )
        .unwrap();

        ReportConfig {
            holdings_file,
            prices_file,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            output_file: dir.join("out/Financial_Report.md"),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_report_markdown() {
        let dir = tempdir().unwrap();
        let config = write_inputs(dir.path());

        let metrics = run_report(&config).unwrap();
        assert_eq!(metrics.total_current_value, 2090.0);
        assert!((metrics.total_return_percent - 4.5).abs() < 1e-9);
        assert!(metrics.benchmark.is_some());

        let report = fs::read_to_string(&config.output_file).unwrap();
        assert!(report.contains("Analysis Period: 2024-01-01 to 2024-01-04"));
        assert!(report.contains("## Benchmark (^GSPC)"));
        assert!(report.contains("(performance_chart.svg)"));

        let chart = fs::read_to_string(dir.path().join("out/performance_chart.svg")).unwrap();
        assert!(chart.starts_with("<svg"));
        assert!(chart.contains("Portfolio vs ^GSPC (Indexed to 100)"));
    }

    #[test]
    fn test_run_report_without_chart() {
        let dir = tempdir().unwrap();
        let config = ReportConfig {
            chart_file: String::new(),
            ..write_inputs(dir.path())
        };

        run_report(&config).unwrap();

        let report = fs::read_to_string(&config.output_file).unwrap();
        assert!(!report.contains("!["));
        assert!(!dir.path().join("out/performance_chart.svg").exists());
    }

    #[test]
    fn test_run_report_json() {
        let dir = tempdir().unwrap();
        let config = ReportConfig {
            format: ReportFormat::Json,
            benchmark: None,
            output_file: dir.path().join("report.json"),
            ..write_inputs(dir.path())
        };

        run_report(&config).unwrap();

        let json = fs::read_to_string(&config.output_file).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_current_value"], 2090.0);
        assert!(value.get("benchmark").is_none());
    }

    #[test]
    fn test_run_report_missing_holdings_file() {
        let dir = tempdir().unwrap();
        let config = ReportConfig {
            holdings_file: dir.path().join("absent.csv"),
            ..Default::default()
        };
        assert!(matches!(run_report(&config), Err(Error::Io(_))));
    }

    #[test]
    fn test_analyze_with_source_requests_benchmark() {
        let dates = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap())
            .collect();
        let table = PriceTable::new(
            dates,
            vec![
                ("AAA".to_string(), vec![10.0, 11.0, 12.0]),
                ("IDX".to_string(), vec![100.0, 101.0, 103.0]),
            ],
        )
        .unwrap();
        let holdings = Holdings::new(vec![Holding::new("AAA", 2.0)]).unwrap();

        let config = ReportConfig {
            benchmark: Some("IDX".to_string()),
            ..Default::default()
        };
        let metrics = analyze_with_source(&config, &holdings, &StaticSource(table.clone())).unwrap();
        assert_eq!(metrics.benchmark.unwrap().symbol, "IDX");

        let config = ReportConfig {
            benchmark: Some("MISSING".to_string()),
            ..Default::default()
        };
        let result = analyze_with_source(&config, &holdings, &StaticSource(table));
        assert!(matches!(result, Err(Error::Schema(_))));
    }
}
