//! Tabular rendering of counter mappings.
//!
//! Everything a store or report wants to show ends up here as a list of
//! two-column rows plus a header pair, rendered into one of the
//! [`TableFormat`] encodings. Text and Markdown go through `tabled`; HTML
//! and LaTeX are emitted directly (both are plain enough that a table
//! library buys nothing); JSON serializes the name → value mapping itself.
//!
//! # Examples
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use cronometri::counters::CounterValue;
//! use cronometri::format::{format_counters, TableFormat};
//!
//! let mut rows = BTreeMap::new();
//! rows.insert("requests".to_string(), CounterValue::Int(42));
//!
//! let json = format_counters(&rows, ["Name", "Value"], TableFormat::Json).unwrap();
//! assert_eq!(json, r#"{"requests":42}"#);
//!
//! let format: TableFormat = "markdown".parse().unwrap();
//! assert_eq!(format, TableFormat::Markdown);
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use tabled::{builder::Builder, settings::Style};

use crate::counters::CounterValue;
use crate::error::{Error, Result};

/// Output encoding for a counter table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableFormat {
    /// Rounded text grid (default).
    #[default]
    Text,
    /// HTML `<table>` fragment.
    Html,
    /// GitHub-flavored Markdown pipe table.
    Markdown,
    /// LaTeX `tabular` fragment.
    Latex,
    /// JSON object of the name → value mapping.
    Json,
}

impl TableFormat {
    /// The canonical format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Text => "text",
            TableFormat::Html => "html",
            TableFormat::Markdown => "markdown",
            TableFormat::Latex => "latex",
            TableFormat::Json => "json",
        }
    }
}

impl Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" | "grid" | "rounded" => Ok(TableFormat::Text),
            "html" => Ok(TableFormat::Html),
            "markdown" | "md" | "github" => Ok(TableFormat::Markdown),
            "latex" => Ok(TableFormat::Latex),
            "json" => Ok(TableFormat::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Renders a name → value mapping in the requested format.
///
/// `headers` labels the two columns of the tabular formats; JSON ignores it
/// and serializes the mapping directly.
pub fn format_counters(
    rows: &BTreeMap<String, CounterValue>,
    headers: [&str; 2],
    format: TableFormat,
) -> Result<String> {
    match format {
        TableFormat::Json => Ok(serde_json::to_string(rows)?),
        _ => Ok(styled_table(&mapping_rows(rows), headers, format)),
    }
}

/// Converts a mapping into display rows, in name order.
pub(crate) fn mapping_rows(rows: &BTreeMap<String, CounterValue>) -> Vec<[String; 2]> {
    rows.iter()
        .map(|(name, value)| [name.clone(), value.to_string()])
        .collect()
}

/// Dispatches to the tabular emitters. JSON is handled by the callers
/// before this point and falls back to the text grid.
pub(crate) fn styled_table(rows: &[[String; 2]], headers: [&str; 2], format: TableFormat) -> String {
    match format {
        TableFormat::Text | TableFormat::Json => text_table(rows, headers),
        TableFormat::Html => html_table(rows, headers),
        TableFormat::Markdown => markdown_table(rows, headers),
        TableFormat::Latex => latex_table(rows, headers),
    }
}

/// Rounded text grid.
pub(crate) fn text_table(rows: &[[String; 2]], headers: [&str; 2]) -> String {
    let mut table = build_table(rows, headers);
    table.with(Style::rounded());
    table.to_string()
}

/// GitHub-flavored Markdown pipe table.
pub(crate) fn markdown_table(rows: &[[String; 2]], headers: [&str; 2]) -> String {
    let mut table = build_table(rows, headers);
    table.with(Style::markdown());
    table.to_string()
}

fn build_table(rows: &[[String; 2]], headers: [&str; 2]) -> tabled::Table {
    let mut builder = Builder::default();
    builder.push_record(headers);
    for row in rows {
        builder.push_record(row.clone());
    }
    builder.build()
}

/// Plain HTML `<table>` fragment with escaped cell text.
pub(crate) fn html_table(rows: &[[String; 2]], headers: [&str; 2]) -> String {
    let mut out = String::from("<table>\n<thead>\n<tr>");
    for header in headers {
        out.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");
    out
}

/// LaTeX `tabular` fragment with escaped cell text.
pub(crate) fn latex_table(rows: &[[String; 2]], headers: [&str; 2]) -> String {
    let mut out = String::from("\\begin{tabular}{ll}\n\\hline\n");
    out.push_str(&format!(
        "{} & {} \\\\\n\\hline\n",
        escape_latex(headers[0]),
        escape_latex(headers[1])
    ));
    for row in rows {
        out.push_str(&format!(
            "{} & {} \\\\\n",
            escape_latex(&row[0]),
            escape_latex(&row[1])
        ));
    }
    out.push_str("\\hline\n\\end{tabular}");
    out
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_latex(text: &str) -> String {
    text.replace('&', "\\&")
        .replace('%', "\\%")
        .replace('#', "\\#")
        .replace('_', "\\_")
}
