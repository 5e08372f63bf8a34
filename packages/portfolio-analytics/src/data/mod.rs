//! Price and holdings loading.
//!
//! The analyzer consumes a dense [`PriceTable`]; a [`PriceSource`] is whatever
//! produces one for a set of symbols and a date range. [`CsvPriceSource`]
//! reads a wide CSV file (`Date,SYM1,SYM2,...`) and forward-fills gaps.

use crate::types::{Holding, Holdings, PriceTable};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Date format used in price files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Provider of historical prices.
pub trait PriceSource {
    /// Fetch a dense, date-ascending price table for `symbols`.
    ///
    /// `start` is inclusive and `end` exclusive; `None` leaves that side open.
    fn fetch(
        &self,
        symbols: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceTable>;
}

/// Price source backed by a wide CSV file.
///
/// The first column holds `YYYY-MM-DD` dates, every other column the closing
/// prices of one symbol. Empty cells are missing prices.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(
        &self,
        symbols: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceTable> {
        info!(
            "Fetching prices for {} from {}",
            symbols.join(", "),
            self.path.display()
        );
        let file = File::open(&self.path)?;
        let table = read_prices(file, symbols, start, end)?;
        info!(rows = table.len(), "Price data loaded");
        Ok(table)
    }
}

/// Read a wide price CSV from any reader.
///
/// Keeps the requested symbols in request order (duplicates collapsed),
/// restricts rows to `start <= date < end`, sorts by date and forward-fills.
pub fn read_prices<R: Read>(
    reader: R,
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut seen = HashSet::new();
    let requested: Vec<&String> = symbols.iter().filter(|s| seen.insert(*s)).collect();

    let mut indices = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for symbol in &requested {
        match headers.iter().skip(1).position(|h| h == symbol.as_str()) {
            Some(idx) => indices.push(idx + 1),
            None => missing.push(symbol.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::Schema(format!(
            "Price data has no column for: {}",
            missing.join(", ")
        )));
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let date = NaiveDate::parse_from_str(record.get(0).unwrap_or_default(), DATE_FORMAT)?;

        if start.is_some_and(|s| date < s) || end.is_some_and(|e| date >= e) {
            continue;
        }

        let prices = indices
            .iter()
            .map(|&idx| parse_price(record.get(idx).unwrap_or_default(), date))
            .collect::<Result<Vec<_>>>()?;
        rows.push((date, prices));
    }

    rows.sort_by_key(|(date, _)| *date);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(Error::Validation(format!("Duplicate price date: {}", pair[0].0)));
    }
    debug!(rows = rows.len(), "Parsed price rows");

    let dates: Vec<NaiveDate> = rows.iter().map(|(date, _)| *date).collect();
    let columns: Vec<(String, Vec<Option<f64>>)> = requested
        .iter()
        .enumerate()
        .map(|(col, symbol)| {
            let prices: Vec<Option<f64>> = rows.iter().map(|(_, prices)| prices[col]).collect();
            (symbol.to_string(), prices)
        })
        .collect();

    PriceTable::forward_filled(dates, columns)
}

fn parse_price(cell: &str, date: NaiveDate) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|e| Error::Validation(format!("Invalid price {cell:?} on {date}: {e}")))
}

#[derive(Debug, Deserialize)]
struct HoldingRecord {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Shares")]
    shares: f64,
}

/// Load holdings from a `Ticker,Shares` CSV file.
pub fn load_holdings(path: &Path) -> Result<Holdings> {
    let file = File::open(path)?;
    let holdings = read_holdings(file)?;
    info!(
        "Loaded {} holdings from {}",
        holdings.len(),
        path.display()
    );
    Ok(holdings)
}

/// Read holdings from a `Ticker,Shares` CSV reader.
pub fn read_holdings<R: Read>(reader: R) -> Result<Holdings> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let holdings = rdr
        .deserialize::<HoldingRecord>()
        .map(|record| record.map(|r| Holding::new(&r.ticker, r.shares)))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    Holdings::new(holdings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const PRICES: &str = "\
Date,STOCKA,STOCKB,^GSPC
2024-01-03,101.0,204.0,402.0
2024-01-01,100.0,,400.0
2024-01-02,102.0,200.0,404.0
2024-01-04,,208.0,410.0
2024-01-05,106.0,209.0,
";

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_read_prices_sorts_and_fills() {
        let table = read_prices(
            PRICES.as_bytes(),
            &symbols(&["STOCKA", "STOCKB"]),
            None,
            None,
        )
        .unwrap();

        // 2024-01-01 dropped: STOCKB not yet observed
        assert_eq!(table.dates(), [date(2), date(3), date(4), date(5)]);
        assert_eq!(table.symbols(), ["STOCKA", "STOCKB"]);
        assert_eq!(table.column("STOCKA"), Some(&[102.0, 101.0, 101.0, 106.0][..]));
        assert_eq!(table.column("STOCKB"), Some(&[200.0, 204.0, 208.0, 209.0][..]));
        assert!(!table.has_symbol("^GSPC"));
    }

    #[test]
    fn test_read_prices_date_range() {
        let table = read_prices(
            PRICES.as_bytes(),
            &symbols(&["STOCKA", "^GSPC"]),
            Some(date(2)),
            Some(date(4)),
        )
        .unwrap();

        // End date is exclusive
        assert_eq!(table.dates(), [date(2), date(3)]);
        assert_eq!(table.column("^GSPC"), Some(&[404.0, 402.0][..]));
    }

    #[test]
    fn test_read_prices_missing_column() {
        let result = read_prices(PRICES.as_bytes(), &symbols(&["STOCKA", "NOPE"]), None, None);
        match result {
            Err(Error::Schema(msg)) => assert!(msg.contains("NOPE")),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_prices_duplicate_symbol_requested() {
        let table = read_prices(
            PRICES.as_bytes(),
            &symbols(&["STOCKA", "STOCKA"]),
            None,
            None,
        )
        .unwrap();
        assert_eq!(table.symbols(), ["STOCKA"]);
    }

    #[test]
    fn test_read_prices_rejects_duplicate_dates() {
        let data = "Date,A\n2024-01-01,1.0\n2024-01-01,2.0\n";
        let result = read_prices(data.as_bytes(), &symbols(&["A"]), None, None);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_read_prices_bad_values() {
        let data = "Date,A\n2024-01-01,abc\n";
        let result = read_prices(data.as_bytes(), &symbols(&["A"]), None, None);
        assert!(matches!(result, Err(Error::Validation(_))));

        let data = "Date,A\n01/02/2024,1.0\n";
        let result = read_prices(data.as_bytes(), &symbols(&["A"]), None, None);
        assert!(matches!(result, Err(Error::DateParse(_))));
    }

    #[test]
    fn test_csv_price_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, PRICES).unwrap();

        let source = CsvPriceSource::new(&path);
        let table = source.fetch(&symbols(&["^GSPC"]), None, None).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.column("^GSPC").unwrap()[4], 410.0);
    }

    #[test]
    fn test_csv_price_source_missing_file() {
        let source = CsvPriceSource::new("/nonexistent/prices.csv");
        let result = source.fetch(&symbols(&["A"]), None, None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_read_holdings() {
        let data = "Ticker,Shares\nSTOCKA, 10\nSTOCKB,2.5\n";
        let holdings = read_holdings(data.as_bytes()).unwrap();

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings.symbols(), vec!["STOCKA", "STOCKB"]);
        assert_eq!(holdings.shares("STOCKB"), Some(2.5));
    }

    #[test]
    fn test_read_holdings_rejects_duplicates() {
        let data = "Ticker,Shares\nSTOCKA,10\nSTOCKA,2\n";
        assert!(matches!(read_holdings(data.as_bytes()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_load_holdings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portfolio.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Ticker,Shares").unwrap();
        writeln!(file, "AAPL,3").unwrap();

        let holdings = load_holdings(&path).unwrap();
        assert_eq!(holdings.shares("AAPL"), Some(3.0));
    }
}
