//! Report generation over a registry's counters.
//!
//! The engine turns live counters into a [`Report`]: counters are
//! partitioned into buckets (value / timing / laps), timers are sampled
//! lazily against "now", rows are sorted, and per-lap statistics are
//! computed. A [`Report`] is a plain serde snapshot: serialize it for the
//! JSON export, or hand it to [`gen_report`] / [`to_grepable`] for the
//! textual renderings.
//!
//! A timer that recorded laps shows up twice: once in the timing bucket
//! with its total elapsed time, and once in the laps bucket with its
//! per-interval deltas, cumulative times and statistics.
//!
//! # Examples
//!
//! ```rust
//! use cronometri::registry::Registry;
//! use cronometri::report::ReportOptions;
//!
//! let mut counters = Registry::new();
//! counters.set("requests", 42).unwrap();
//!
//! let report = counters.snapshot(&ReportOptions::default());
//! assert_eq!(report.values[0].0, "requests");
//! ```

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::counters::CounterValue;
use crate::error::{Error, Result};
use crate::format::{self, TableFormat};
use crate::registry::Counter;

/// Bucket title for scalar counters.
pub const VALUE_COUNTERS: &str = "Value counters";
/// Bucket title for timers.
pub const TIME_COUNTERS: &str = "Timing counters";
/// Bucket title for timers with recorded laps.
pub const LAPS_COUNTERS: &str = "Laps counters";

const GREPABLE_TAG: &str = "[PerfCounters]";

/// Row ordering for report buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Sort by the row's numeric value (the default).
    #[default]
    Value,
    /// Sort by counter name.
    Name,
}

/// How a report is assembled: sort key and direction.
///
/// The default is the most common reading: largest value first.
///
/// # Examples
///
/// ```rust
/// use cronometri::report::{ReportOptions, SortBy};
///
/// let options = ReportOptions::new().sort_by(SortBy::Name).reverse(false);
/// assert_eq!(options.sort_by, SortBy::Name);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Sort key for the value and timing buckets.
    pub sort_by: SortBy,
    /// Reverse the sort (descending). Defaults to `true`.
    pub reverse: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            sort_by: SortBy::Value,
            reverse: true,
        }
    }
}

impl ReportOptions {
    /// Creates the default options: by value, descending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sort key, returning `self` for chaining.
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Sets the sort direction, returning `self` for chaining.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Output encoding for a full report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Banners and rounded text grids (default).
    #[default]
    Text,
    /// `<h1>`/`<h2>` banners and HTML tables.
    Html,
    /// `#`/`##` banners and pipe tables.
    Markdown,
    /// `\section`/`\subsection` banners and `tabular` fragments.
    Latex,
}

impl ReportFormat {
    /// The canonical format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Latex => "latex",
        }
    }

    /// The table encoding used for this report format.
    pub(crate) fn table_format(self) -> TableFormat {
        match self {
            ReportFormat::Text => TableFormat::Text,
            ReportFormat::Html => TableFormat::Html,
            ReportFormat::Markdown => TableFormat::Markdown,
            ReportFormat::Latex => TableFormat::Latex,
        }
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "html" => Ok(ReportFormat::Html),
            "markdown" | "md" | "github" => Ok(ReportFormat::Markdown),
            "latex" => Ok(ReportFormat::Latex),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Statistics over the lap deltas of one timer, in seconds.
///
/// `stddev` is the population standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LapStats {
    pub min: f64,
    pub average: f64,
    pub median: f64,
    pub max: f64,
    pub stddev: f64,
}

impl LapStats {
    /// Computes the statistics over a series of lap deltas. An empty
    /// series yields all zeros.
    pub fn from_deltas(deltas: &[f64]) -> Self {
        if deltas.is_empty() {
            return LapStats::default();
        }

        let mut sorted = deltas.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let min = sorted[0];
        let max = sorted[count - 1];
        let average = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };
        let variance =
            sorted.iter().map(|v| (v - average).powi(2)).sum::<f64>() / count as f64;

        LapStats {
            min,
            average,
            median,
            max,
            stddev: variance.sqrt(),
        }
    }

    fn rows(&self) -> Vec<[String; 2]> {
        vec![
            ["min".to_string(), self.min.to_string()],
            ["average".to_string(), self.average.to_string()],
            ["median".to_string(), self.median.to_string()],
            ["max".to_string(), self.max.to_string()],
            ["stddev".to_string(), self.stddev.to_string()],
        ]
    }
}

/// One timer's laps bucket entry: `(delta, cumulative)` rows in seconds
/// plus the statistics over the deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapsEntry {
    pub name: String,
    pub laps: Vec<(f64, f64)>,
    pub stats: LapStats,
}

/// A processed snapshot of a registry: sorted rows per bucket.
///
/// Serializes with the bucket titles as keys; an empty bucket is omitted
/// entirely, so an idle registry serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Scalar counter rows, `(name, value)`.
    #[serde(rename = "Value counters", skip_serializing_if = "Vec::is_empty", default)]
    pub values: Vec<(String, CounterValue)>,
    /// Timer rows, `(name, elapsed seconds)`.
    #[serde(rename = "Timing counters", skip_serializing_if = "Vec::is_empty", default)]
    pub timings: Vec<(String, f64)>,
    /// Timers with recorded laps.
    #[serde(rename = "Laps counters", skip_serializing_if = "Vec::is_empty", default)]
    pub laps: Vec<LapsEntry>,
}

impl Report {
    /// Returns `true` if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.timings.is_empty() && self.laps.is_empty()
    }

    /// Serializes the report to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Processes live counters into a sorted [`Report`].
///
/// "Now" is read once per timer, so a batch of running timers is sampled
/// at (essentially) the same moment and stopped timers keep their frozen
/// reading. Timings are raw seconds, deliberately unrounded; rounding is
/// a rendering concern.
pub fn process_counters<'a, I>(counters: I, options: &ReportOptions) -> Report
where
    I: IntoIterator<Item = &'a Counter>,
{
    let mut values = Vec::new();
    let mut timings = Vec::new();
    let mut laps: Vec<(f64, LapsEntry)> = Vec::new();

    for counter in counters {
        match counter {
            Counter::Value(counter) => {
                values.push((counter.name().to_string(), counter.value()));
            }
            Counter::Timer(timer) => {
                let elapsed = timer.elapsed().as_secs_f64();
                timings.push((timer.name().to_string(), elapsed));

                if timer.has_laps() {
                    let deltas = timer.lap_deltas();
                    let mut cumulative = 0.0;
                    let rows: Vec<(f64, f64)> = deltas
                        .iter()
                        .map(|delta| {
                            cumulative += delta;
                            (*delta, cumulative)
                        })
                        .collect();
                    let stats = LapStats::from_deltas(&deltas);
                    let entry = LapsEntry {
                        name: timer.name().to_string(),
                        laps: rows,
                        stats,
                    };
                    laps.push((elapsed, entry));
                }
            }
        }
    }

    match options.sort_by {
        SortBy::Value => {
            values.sort_by(|a, b| a.1.as_f64().total_cmp(&b.1.as_f64()));
            timings.sort_by(|a, b| a.1.total_cmp(&b.1));
            laps.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        SortBy::Name => {
            values.sort_by(|a, b| a.0.cmp(&b.0));
            timings.sort_by(|a, b| a.0.cmp(&b.0));
            laps.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        }
    }
    if options.reverse {
        values.reverse();
        timings.reverse();
        laps.reverse();
    }

    Report {
        values,
        timings,
        laps: laps.into_iter().map(|(_, entry)| entry).collect(),
    }
}

/// Renders a processed report with section banners and one table per
/// bucket (plus a lap table and a stats table per laps entry). An empty
/// report renders as an empty string.
pub fn gen_report(report: &Report, format: ReportFormat) -> String {
    let mut out = String::new();
    let table_format = format.table_format();
    let gap = table_gap(format);

    if !report.values.is_empty() {
        let rows: Vec<[String; 2]> = report
            .values
            .iter()
            .map(|(name, value)| [name.clone(), value.to_string()])
            .collect();
        out.push_str(&banner(VALUE_COUNTERS, 1, format));
        out.push_str(&format::styled_table(&rows, ["name", "value"], table_format));
        out.push_str(gap);
    }

    if !report.timings.is_empty() {
        let rows: Vec<[String; 2]> = report
            .timings
            .iter()
            .map(|(name, value)| [name.clone(), value.to_string()])
            .collect();
        out.push_str(&banner(TIME_COUNTERS, 1, format));
        out.push_str(&format::styled_table(&rows, ["name", "value"], table_format));
        out.push_str(gap);
    }

    if !report.laps.is_empty() {
        out.push_str(&banner(LAPS_COUNTERS, 1, format));
        for entry in &report.laps {
            let rows: Vec<[String; 2]> = entry
                .laps
                .iter()
                .map(|(delta, cumulative)| [delta.to_string(), cumulative.to_string()])
                .collect();
            out.push_str(&banner(&entry.name, 2, format));
            out.push_str(&format::styled_table(
                &rows,
                ["lap time", "cumulative time"],
                table_format,
            ));
            out.push_str(gap);
            out.push_str(&format::styled_table(
                &entry.stats.rows(),
                ["stat", "value"],
                table_format,
            ));
            out.push_str(gap);
        }
    }

    out
}

/// Renders a processed report as grep-friendly lines: one per value/timing
/// row, two per laps entry (the lap pairs and the stats).
pub fn to_grepable(report: &Report) -> String {
    let mut out = String::new();
    for (name, value) in &report.values {
        out.push_str(&format!(
            "{}{}:{}:{}\n",
            GREPABLE_TAG, VALUE_COUNTERS, name, value
        ));
    }
    for (name, value) in &report.timings {
        out.push_str(&format!(
            "{}{}:{}:{}\n",
            GREPABLE_TAG, TIME_COUNTERS, name, value
        ));
    }
    for entry in &report.laps {
        out.push_str(&format!(
            "{}{}:{}:laps:{}\n",
            GREPABLE_TAG,
            LAPS_COUNTERS,
            entry.name,
            format_lap_pairs(&entry.laps)
        ));
        out.push_str(&format!(
            "{}{}:{}:stats:min={},average={},median={},max={},stddev={}\n",
            GREPABLE_TAG,
            LAPS_COUNTERS,
            entry.name,
            entry.stats.min,
            entry.stats.average,
            entry.stats.median,
            entry.stats.max,
            entry.stats.stddev
        ));
    }
    out
}

fn format_lap_pairs(pairs: &[(f64, f64)]) -> String {
    let cells: Vec<String> = pairs
        .iter()
        .map(|(delta, cumulative)| format!("[{}, {}]", delta, cumulative))
        .collect();
    format!("[{}]", cells.join(", "))
}

fn banner(title: &str, level: usize, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => {
            if level == 1 {
                format!("-=[{}]=-\n", title)
            } else {
                format!("-= {} =-\n", title)
            }
        }
        ReportFormat::Html => {
            format!("<h{level}>{}</h{level}>\n", format::escape_html(title))
        }
        ReportFormat::Markdown => format!("{}{}\n", "#".repeat(level), title),
        ReportFormat::Latex => {
            if level == 1 {
                format!("\\section{{{}}}\n", format::escape_latex(title))
            } else {
                format!("\\subsection{{{}}}\n", format::escape_latex(title))
            }
        }
    }
}

fn table_gap(format: ReportFormat) -> &'static str {
    match format {
        ReportFormat::Text => "\n\n",
        _ => "\n",
    }
}
