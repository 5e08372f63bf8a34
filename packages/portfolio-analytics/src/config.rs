//! Report configuration loaded from TOML.

use crate::analysis::AnalysisOptions;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output format of a generated report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// Settings for an end-to-end report run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// CSV file with `Ticker,Shares` columns
    pub holdings_file: PathBuf,
    /// Wide CSV file of daily prices (`Date,SYM1,SYM2,...`)
    pub prices_file: PathBuf,
    /// First date to include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// First date to exclude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// VaR confidence level
    pub confidence_level: f64,
    /// Benchmark column in the price file (empty string disables the comparison)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    /// Where to write the report
    pub output_file: PathBuf,
    /// Report format
    pub format: ReportFormat,
    /// Maximum rows in the indexed performance table
    pub max_chart_rows: usize,
    /// SVG chart written next to the report (empty string disables it)
    pub chart_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            holdings_file: PathBuf::from("portfolio.csv"),
            prices_file: PathBuf::from("prices.csv"),
            start_date: None,
            end_date: None,
            confidence_level: 0.95,
            benchmark: Some("^GSPC".to_string()),
            output_file: PathBuf::from("Financial_Report.md"),
            format: ReportFormat::Markdown,
            max_chart_rows: 24,
            chart_file: "performance_chart.svg".to_string(),
        }
    }
}

impl ReportConfig {
    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/portfolio-report/config.toml`
    /// Can be overridden with `PORTFOLIO_REPORT_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PORTFOLIO_REPORT_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("portfolio-report/config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Where the chart is written: `chart_file` in the report's directory.
    pub fn chart_path(&self) -> Option<PathBuf> {
        if self.chart_file.is_empty() {
            return None;
        }
        let dir = self.output_file.parent().unwrap_or_else(|| Path::new(""));
        Some(dir.join(&self.chart_file))
    }

    /// Analysis options described by this config.
    ///
    /// The benchmark is read from the same price file as the holdings.
    pub fn analysis_options(&self) -> AnalysisOptions {
        let options = AnalysisOptions::default().with_confidence(self.confidence_level);
        match self.benchmark.as_deref().filter(|s| !s.is_empty()) {
            Some(symbol) => options.with_benchmark_column(symbol),
            None => options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::BenchmarkSource;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.benchmark.as_deref(), Some("^GSPC"));
        assert_eq!(config.format, ReportFormat::Markdown);
        assert_eq!(config.holdings_file, PathBuf::from("portfolio.csv"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let config = ReportConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
holdings_file = "data/holdings.csv"
start_date = "2024-01-01"
end_date = "2025-08-18"
confidence_level = 0.99
format = "json"
"#,
        )
        .unwrap();

        let config = ReportConfig::load(&path).unwrap();
        assert_eq!(config.holdings_file, PathBuf::from("data/holdings.csv"));
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2025, 8, 18));
        assert_eq!(config.confidence_level, 0.99);
        assert_eq!(config.format, ReportFormat::Json);
        // Unset keys keep their defaults
        assert_eq!(config.prices_file, PathBuf::from("prices.csv"));
        assert_eq!(config.max_chart_rows, 24);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "confidence_level = \"high\"").unwrap();

        assert!(matches!(
            ReportConfig::load(&path),
            Err(crate::Error::TomlDe(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = ReportConfig {
            benchmark: Some("SPY".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            max_chart_rows: 10,
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(ReportConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_chart_path() {
        let config = ReportConfig {
            output_file: PathBuf::from("reports/Financial_Report.md"),
            ..Default::default()
        };
        assert_eq!(
            config.chart_path(),
            Some(PathBuf::from("reports/performance_chart.svg"))
        );

        assert_eq!(
            ReportConfig::default().chart_path(),
            Some(PathBuf::from("performance_chart.svg"))
        );

        let config = ReportConfig {
            chart_file: String::new(),
            ..Default::default()
        };
        assert_eq!(config.chart_path(), None);
    }

    #[test]
    fn test_analysis_options() {
        let options = ReportConfig::default().analysis_options();
        assert_eq!(options.confidence_level, 0.95);
        assert_eq!(
            options.benchmark,
            Some(BenchmarkSource::Column("^GSPC".to_string()))
        );

        let config = ReportConfig {
            benchmark: None,
            ..Default::default()
        };
        assert!(config.analysis_options().benchmark.is_none());

        let config = ReportConfig {
            benchmark: Some(String::new()),
            ..Default::default()
        };
        assert!(config.analysis_options().benchmark.is_none());
    }
}
