//! Indexed performance chart as a standalone SVG document.

use super::ReportRenderer;
use crate::analysis::stats::indexed_to_100;
use crate::types::{MetricsResult, TimeSeries};
use crate::Result;
use chrono::{Datelike, NaiveDate};

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 432.0;
const PADDING: f64 = 48.0;
const PORTFOLIO_COLOR: &str = "#191970";
const BENCHMARK_COLOR: &str = "#8b0000";
const GRID_COLOR: &str = "#dddddd";
const MAX_DATE_TICKS: usize = 12;

/// Line chart of the portfolio (and benchmark) indexed to 100.
///
/// The portfolio is drawn solid, the benchmark dashed. Without a benchmark
/// only the portfolio line is drawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedChart;

struct Line<'a> {
    label: &'a str,
    color: &'static str,
    dash: bool,
    series: &'a TimeSeries,
}

impl ReportRenderer for IndexedChart {
    fn render(&self, metrics: &MetricsResult) -> Result<String> {
        let portfolio_only;
        let (title, lines) = match &metrics.benchmark {
            Some(bench) => (
                format!("Portfolio vs {} (Indexed to 100)", bench.symbol),
                vec![
                    Line {
                        label: "Portfolio",
                        color: PORTFOLIO_COLOR,
                        dash: false,
                        series: &bench.portfolio_indexed_norm,
                    },
                    Line {
                        label: &bench.symbol,
                        color: BENCHMARK_COLOR,
                        dash: true,
                        series: &bench.benchmark_indexed_norm,
                    },
                ],
            ),
            None => {
                let history = &metrics.portfolio_history;
                portfolio_only = TimeSeries {
                    dates: history.dates.clone(),
                    values: indexed_to_100(&history.total),
                };
                (
                    "Portfolio Value (Indexed to 100)".to_string(),
                    vec![Line {
                        label: "Portfolio",
                        color: PORTFOLIO_COLOR,
                        dash: false,
                        series: &portfolio_only,
                    }],
                )
            }
        };

        Ok(render_lines(&title, &lines))
    }
}

fn render_lines(title: &str, lines: &[Line<'_>]) -> String {
    let mut svg = svg_header();
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-size="14" fill="#333">{title}</text>"##,
        x = WIDTH / 2.0,
        y = PADDING / 2.0,
        title = escape(title)
    ));

    let first = lines.iter().filter_map(|l| l.series.dates.first()).min().copied();
    let last = lines.iter().filter_map(|l| l.series.dates.last()).max().copied();
    let (Some(first), Some(last), Some((min_v, max_v))) = (first, last, value_extent(lines))
    else {
        svg.push_str(svg_footer());
        return svg;
    };

    add_value_axis(&mut svg, min_v, max_v);
    add_date_axis(&mut svg, lines[0].series, first, last);

    for line in lines {
        let points: Vec<String> = line
            .series
            .iter()
            .filter(|(_, value)| value.is_finite())
            .map(|(date, value)| {
                format!(
                    "{:.2},{:.2}",
                    scale_date(date, first, last),
                    scale_value(value, min_v, max_v)
                )
            })
            .collect();
        if points.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" stroke-dasharray="{dash}" points="{points}" />"#,
            color = line.color,
            dash = dash_pattern(line.dash),
            points = points.join(" ")
        ));
    }

    add_legend(&mut svg, lines);
    svg.push_str(svg_footer());
    svg
}

fn svg_header() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style>"#,
        w = WIDTH,
        h = HEIGHT
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn dash_pattern(dash: bool) -> &'static str {
    if dash {
        "6 4"
    } else {
        "0"
    }
}

/// Finite value range over all lines, widened when flat.
fn value_extent(lines: &[Line<'_>]) -> Option<(f64, f64)> {
    let (min_v, max_v) = lines
        .iter()
        .flat_map(|l| l.series.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }
    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        return Some((min_v - adjust, max_v + adjust));
    }
    Some((min_v, max_v))
}

fn scale_value(value: f64, min_v: f64, max_v: f64) -> f64 {
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * (HEIGHT - 2.0 * PADDING)
}

/// Horizontal position by calendar day, so series on different date
/// indices line up.
fn scale_date(date: NaiveDate, first: NaiveDate, last: NaiveDate) -> f64 {
    let span = (last - first).num_days();
    if span == 0 {
        return WIDTH / 2.0;
    }
    let offset = (date - first).num_days() as f64 / span as f64;
    PADDING + offset * (WIDTH - 2.0 * PADDING)
}

fn add_value_axis(svg: &mut String, min_v: f64, max_v: f64) {
    svg.push_str(&format!(
        r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#000" stroke-width="1" />"##,
        x = PADDING,
        y1 = PADDING,
        y2 = HEIGHT - PADDING
    ));

    for value in [min_v, max_v] {
        let y = scale_value(value, min_v, max_v);
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{GRID_COLOR}" stroke-width="0.5" />"#,
            x1 = PADDING,
            x2 = WIDTH - PADDING,
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{value:.1}</text>"#,
            x = PADDING - 4.0,
            y = y + 3.0,
        ));
    }

    // Start level
    if (min_v..=max_v).contains(&100.0) {
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#bbbbbb" stroke-width="1" stroke-dasharray="4 3" />"##,
            x1 = PADDING,
            x2 = WIDTH - PADDING,
            y = scale_value(100.0, min_v, max_v)
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" transform="rotate(-90 {x:.2} {y:.2})">Value (Start = 100)</text>"#,
        x = PADDING / 3.0,
        y = HEIGHT / 2.0
    ));
}

/// Axis line with a tick at the first date of each month, thinned to at
/// most [`MAX_DATE_TICKS`] labels.
fn add_date_axis(svg: &mut String, series: &TimeSeries, first: NaiveDate, last: NaiveDate) {
    let axis_y = HEIGHT - PADDING;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = WIDTH - PADDING,
        y = axis_y
    ));

    let mut month_starts: Vec<NaiveDate> = Vec::new();
    for &date in &series.dates {
        let same_month = month_starts
            .last()
            .is_some_and(|d| (d.year(), d.month()) == (date.year(), date.month()));
        if !same_month {
            month_starts.push(date);
        }
    }

    let step = month_starts.len().div_ceil(MAX_DATE_TICKS).max(1);
    for date in month_starts.into_iter().step_by(step) {
        let x = scale_date(date, first, last);
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="{GRID_COLOR}" stroke-width="0.5" />"#,
            y1 = PADDING,
            y2 = axis_y
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = axis_y + 16.0,
            label = date.format("%Y-%m")
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">Date</text>"#,
        x = WIDTH / 2.0,
        y = HEIGHT - PADDING / 4.0
    ));
}

fn add_legend(svg: &mut String, lines: &[Line<'_>]) {
    let x = PADDING + 10.0;
    let mut y = PADDING + 14.0;
    for line in lines {
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y1:.2}" stroke="{color}" stroke-width="2" stroke-dasharray="{dash}" />"#,
            x1 = x,
            x2 = x + 20.0,
            y1 = y - 4.0,
            color = line.color,
            dash = dash_pattern(line.dash)
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            x = x + 26.0,
            label = escape(line.label)
        ));
        y += 16.0;
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisOptions};
    use crate::types::{Holding, Holdings, PriceTable};

    fn dates(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect()
    }

    fn sample_metrics(benchmark: bool) -> MetricsResult {
        let prices = PriceTable::new(
            dates(4),
            vec![
                ("STOCKA".to_string(), vec![100.0, 102.0, 101.0, 105.0]),
                ("STOCKB".to_string(), vec![200.0, 200.0, 204.0, 208.0]),
                ("^GSPC".to_string(), vec![400.0, 404.0, 402.0, 410.0]),
            ],
        )
        .unwrap();
        let holdings =
            Holdings::new(vec![Holding::new("STOCKA", 10.0), Holding::new("STOCKB", 5.0)])
                .unwrap();

        let options = if benchmark {
            AnalysisOptions::default().with_benchmark_column("^GSPC")
        } else {
            AnalysisOptions::default()
        };
        analyze(&prices, &holdings, &options).unwrap()
    }

    #[test]
    fn test_chart_with_benchmark() {
        let svg = IndexedChart.render(&sample_metrics(true)).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Portfolio vs ^GSPC (Indexed to 100)"));
        assert!(svg.contains("Value (Start = 100)"));
        assert!(svg.contains(">2024-01<"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains(r#"stroke-dasharray="6 4" points="#));

        // Both lines start at 100, the bottom of the range; the portfolio
        // ends at 104.5, the top of the range
        assert_eq!(svg.matches(r#"points="48.00,384.00"#).count(), 2);
        assert!(svg.contains("672.00,48.00\""));
    }

    #[test]
    fn test_chart_without_benchmark() {
        let svg = IndexedChart.render(&sample_metrics(false)).unwrap();

        assert!(svg.contains("Portfolio Value (Indexed to 100)"));
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(!svg.contains(BENCHMARK_COLOR));
    }

    #[test]
    fn test_chart_skips_undefined_points() {
        let mut metrics = sample_metrics(true);
        if let Some(bench) = metrics.benchmark.as_mut() {
            bench.benchmark_indexed_norm.values[1] = f64::NAN;
            bench.symbol = "S&P 500".to_string();
        }
        let svg = IndexedChart.render(&metrics).unwrap();

        assert!(!svg.contains("NaN"));
        assert!(svg.contains("Portfolio vs S&amp;P 500"));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn test_chart_flat_series() {
        let prices =
            PriceTable::new(dates(3), vec![("A".to_string(), vec![50.0, 50.0, 50.0])]).unwrap();
        let holdings = Holdings::new(vec![Holding::new("A", 2.0)]).unwrap();
        let metrics = analyze(&prices, &holdings, &AnalysisOptions::default()).unwrap();

        let svg = IndexedChart.render(&metrics).unwrap();

        // 100 sits mid-way in the widened range [90, 110]
        assert!(svg.contains(r#"points="48.00,216.00"#));
        assert!(svg.contains(">90.0<"));
        assert!(svg.contains(">110.0<"));
    }

    #[test]
    fn test_scale_date() {
        let (first, last) = (dates(5)[0], dates(5)[4]);
        assert_eq!(scale_date(first, first, last), PADDING);
        assert_eq!(scale_date(last, first, last), WIDTH - PADDING);
        assert_eq!(scale_date(dates(5)[2], first, last), WIDTH / 2.0);
        assert_eq!(scale_date(first, first, first), WIDTH / 2.0);
    }
}
