//! Scalar value counters.
//!
//! A [`ValueCounter`] is a named number that the caller moves explicitly:
//! set it, increment it, decrement it, and optionally record laps. A lap
//! here means "remember the current value", so a series of laps captures
//! how the counter evolved. [`ValueCounters`] is the keyed store with the
//! usual rendering surface on top.
//!
//! # Examples
//!
//! ```rust
//! use cronometri::counters::value::ValueCounters;
//! use cronometri::counters::CounterValue;
//!
//! let mut counters = ValueCounters::new();
//! counters.increment("requests", 1);
//! counters.increment("requests", 1);
//! counters.set("backlog", 17);
//!
//! assert_eq!(counters.get("requests", 2).unwrap(), CounterValue::Int(2));
//! println!("{}", counters.to_text(2));
//! ```

use std::collections::BTreeMap;

use crate::counters::{prefixed, CounterValue};
use crate::error::{Error, Result};
use crate::format::{self, TableFormat};

/// A named scalar counter with an optional series of recorded laps.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCounter {
    name: String,
    value: CounterValue,
    laps: Vec<CounterValue>,
}

impl ValueCounter {
    /// Creates a counter holding `value`.
    pub fn new(name: impl Into<String>, value: CounterValue) -> Self {
        ValueCounter {
            name: name.into(),
            value,
            laps: Vec::new(),
        }
    }

    /// Returns the counter name (the stored, already-prefixed name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw current value, unrounded.
    pub fn value(&self) -> CounterValue {
        self.value
    }

    /// Overwrites the current value. Recorded laps are kept.
    pub fn set(&mut self, value: CounterValue) {
        self.value = value;
    }

    /// Adds `delta` to the current value and returns the new value.
    pub fn add(&mut self, delta: CounterValue) -> CounterValue {
        self.value = self.value.add(delta);
        self.value
    }

    /// Subtracts `delta` from the current value and returns the new value.
    pub fn sub(&mut self, delta: CounterValue) -> CounterValue {
        self.value = self.value.sub(delta);
        self.value
    }

    /// Records the current value as a lap.
    pub fn lap(&mut self) {
        self.laps.push(self.value);
    }

    /// Sets the value back to zero. Recorded laps are kept.
    pub fn reset(&mut self) {
        self.value = CounterValue::Int(0);
    }

    /// Returns `true` if at least one lap was recorded.
    pub fn has_laps(&self) -> bool {
        !self.laps.is_empty()
    }

    /// Number of recorded laps.
    pub fn lap_count(&self) -> usize {
        self.laps.len()
    }

    /// The current value, floats rounded to `rounding` digits.
    pub fn get(&self, rounding: u32) -> CounterValue {
        self.value.rounded(rounding)
    }

    /// The recorded lap values followed by the current value, each rounded:
    /// exactly k+1 entries for k recorded laps.
    pub fn laps(&self, rounding: u32) -> Vec<CounterValue> {
        let mut series: Vec<CounterValue> =
            self.laps.iter().map(|v| v.rounded(rounding)).collect();
        series.push(self.value.rounded(rounding));
        series
    }
}

/// Store of scalar counters keyed by stored (prefixed) name.
///
/// Mutators never fail: a missing counter is created on the spot, starting
/// from zero for increments and laps. Readers return
/// [`Error::NotFound`] for unknown names.
///
/// # Examples
///
/// ```rust
/// use cronometri::counters::value::ValueCounters;
/// use cronometri::counters::CounterValue;
///
/// let mut counters = ValueCounters::with_prefix("web");
/// counters.increment("hits", 1);
///
/// // Stored under the prefixed name, addressed by the plain one.
/// assert_eq!(counters.get("hits", 2).unwrap(), CounterValue::Int(1));
/// assert!(counters.get_all(2).contains_key("web_hits"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueCounters {
    prefix: String,
    counters: BTreeMap<String, ValueCounter>,
}

impl ValueCounters {
    const HEADERS: [&'static str; 2] = ["Name", "Value"];

    /// Creates an empty store with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose counters are stored as
    /// `<prefix>_<name>`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        ValueCounters {
            prefix: prefix.into(),
            counters: BTreeMap::new(),
        }
    }

    /// Returns the name prefix (empty when unset).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of counters in the store.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns `true` if the store holds no counters.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Creates the counter at `value`, or overwrites it if present.
    pub fn set(&mut self, name: &str, value: impl Into<CounterValue>) {
        let value = value.into();
        self.counters
            .entry(prefixed(&self.prefix, name))
            .or_insert_with_key(|key| ValueCounter::new(key.clone(), value))
            .set(value);
    }

    /// Adds `delta`, creating the counter at zero first if absent.
    /// Returns the new value.
    pub fn increment(&mut self, name: &str, delta: impl Into<CounterValue>) -> CounterValue {
        self.entry(name).add(delta.into())
    }

    /// Subtracts `delta`, creating the counter at zero first if absent.
    /// Returns the new value.
    pub fn decrement(&mut self, name: &str, delta: impl Into<CounterValue>) -> CounterValue {
        self.entry(name).sub(delta.into())
    }

    /// Records the current value as a lap, creating the counter at zero
    /// first if absent.
    pub fn lap(&mut self, name: &str) {
        self.entry(name).lap();
    }

    /// Sets the counter back to zero.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        self.lookup_mut(name)?.reset();
        Ok(())
    }

    /// Sets every counter back to zero.
    pub fn reset_all(&mut self) {
        self.counters.values_mut().for_each(ValueCounter::reset);
    }

    /// The current value, floats rounded to `rounding` digits.
    pub fn get(&self, name: &str, rounding: u32) -> Result<CounterValue> {
        Ok(self.lookup(name)?.get(rounding))
    }

    /// The recorded lap values followed by the current value: exactly k+1
    /// entries for k recorded laps.
    pub fn get_laps(&self, name: &str, rounding: u32) -> Result<Vec<CounterValue>> {
        Ok(self.lookup(name)?.laps(rounding))
    }

    /// Stored-name → rounded value, for every counter, in name order.
    pub fn get_all(&self, rounding: u32) -> BTreeMap<String, CounterValue> {
        self.counters
            .iter()
            .map(|(name, counter)| (name.clone(), counter.get(rounding)))
            .collect()
    }

    /// Renders every counter in the requested format.
    pub fn render(&self, format: TableFormat, rounding: u32) -> Result<String> {
        format::format_counters(&self.get_all(rounding), Self::HEADERS, format)
    }

    /// Prints the text table to stdout.
    pub fn report(&self, rounding: u32) {
        println!("{}", self.to_text(rounding));
    }

    /// The counters as a rounded text grid.
    pub fn to_text(&self, rounding: u32) -> String {
        format::text_table(&format::mapping_rows(&self.get_all(rounding)), Self::HEADERS)
    }

    /// The counters as an HTML table.
    pub fn to_html(&self, rounding: u32) -> String {
        format::html_table(&format::mapping_rows(&self.get_all(rounding)), Self::HEADERS)
    }

    /// The counters as a GitHub-flavored Markdown table.
    pub fn to_md(&self, rounding: u32) -> String {
        format::markdown_table(&format::mapping_rows(&self.get_all(rounding)), Self::HEADERS)
    }

    /// The counters as a LaTeX `tabular` fragment.
    pub fn to_latex(&self, rounding: u32) -> String {
        format::latex_table(&format::mapping_rows(&self.get_all(rounding)), Self::HEADERS)
    }

    /// The name → value mapping as JSON.
    pub fn to_json(&self, rounding: u32) -> Result<String> {
        self.render(TableFormat::Json, rounding)
    }

    /// Iterates over the stored counters in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ValueCounter> {
        self.counters.values()
    }

    fn entry(&mut self, name: &str) -> &mut ValueCounter {
        self.counters
            .entry(prefixed(&self.prefix, name))
            .or_insert_with_key(|key| ValueCounter::new(key.clone(), CounterValue::Int(0)))
    }

    fn lookup(&self, name: &str) -> Result<&ValueCounter> {
        let key = prefixed(&self.prefix, name);
        self.counters.get(&key).ok_or(Error::NotFound(key))
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut ValueCounter> {
        let key = prefixed(&self.prefix, name);
        self.counters.get_mut(&key).ok_or(Error::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let counters = ValueCounters::new();
        assert!(counters.is_empty());
        assert_eq!(counters.len(), 0);
    }

    #[test]
    fn test_set_creates_and_overwrites() {
        let mut counters = ValueCounters::new();
        counters.set("backlog", 17);
        assert_eq!(counters.get("backlog", 2).unwrap(), CounterValue::Int(17));
        counters.set("backlog", 3);
        assert_eq!(counters.get("backlog", 2).unwrap(), CounterValue::Int(3));
        assert_eq!(counters.len(), 1);
    }

    #[test]
    fn test_increment_sums_from_zero() {
        let mut counters = ValueCounters::new();
        counters.increment("requests", 1);
        let value = counters.increment("requests", 1);
        assert_eq!(value, CounterValue::Int(2));
        assert_eq!(counters.get("requests", 2).unwrap(), CounterValue::Int(2));
    }

    #[test]
    fn test_decrement_goes_negative() {
        let mut counters = ValueCounters::new();
        counters.decrement("budget", 3);
        assert_eq!(counters.get("budget", 2).unwrap(), CounterValue::Int(-3));
    }

    #[test]
    fn test_float_delta_contaminates() {
        let mut counters = ValueCounters::new();
        counters.increment("load", 1);
        let value = counters.increment("load", 0.5);
        assert_eq!(value, CounterValue::Float(1.5));
        assert!(counters.get("load", 2).unwrap().is_float());
    }

    #[test]
    fn test_get_rounds_floats_only() {
        let mut counters = ValueCounters::new();
        counters.set("ratio", 2.5561);
        counters.set("count", 1234);
        assert_eq!(counters.get("ratio", 2).unwrap(), CounterValue::Float(2.56));
        assert_eq!(counters.get("count", 2).unwrap(), CounterValue::Int(1234));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let counters = ValueCounters::new();
        assert!(matches!(
            counters.get("ghost", 2),
            Err(Error::NotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_lap_series_has_one_extra_entry() {
        let mut counters = ValueCounters::new();
        counters.set("progress", 1);
        counters.lap("progress");
        counters.increment("progress", 2);
        counters.lap("progress");
        counters.set("progress", 5);

        let laps = counters.get_laps("progress", 2).unwrap();
        assert_eq!(
            laps,
            vec![
                CounterValue::Int(1),
                CounterValue::Int(3),
                CounterValue::Int(5)
            ]
        );
    }

    #[test]
    fn test_lap_auto_creates_at_zero() {
        let mut counters = ValueCounters::new();
        counters.lap("fresh");
        let laps = counters.get_laps("fresh", 2).unwrap();
        assert_eq!(laps, vec![CounterValue::Int(0), CounterValue::Int(0)]);
    }

    #[test]
    fn test_reset_zeroes_but_keeps_laps() {
        let mut counters = ValueCounters::new();
        counters.set("progress", 9);
        counters.lap("progress");
        counters.reset("progress").unwrap();

        assert_eq!(counters.get("progress", 2).unwrap(), CounterValue::Int(0));
        // The lap history survives, only the live value goes back to zero.
        assert_eq!(counters.get_laps("progress", 2).unwrap().len(), 2);
    }

    #[test]
    fn test_reset_missing_is_not_found() {
        let mut counters = ValueCounters::new();
        assert!(matches!(
            counters.reset("ghost"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_reset_all() {
        let mut counters = ValueCounters::new();
        counters.set("a", 1);
        counters.set("b", 2);
        counters.reset_all();
        assert_eq!(counters.get("a", 2).unwrap(), CounterValue::Int(0));
        assert_eq!(counters.get("b", 2).unwrap(), CounterValue::Int(0));
    }

    #[test]
    fn test_prefix_applies_to_stored_names() {
        let mut counters = ValueCounters::with_prefix("web");
        counters.set("hits", 1);

        assert_eq!(counters.get("hits", 2).unwrap(), CounterValue::Int(1));
        let all = counters.get_all(2);
        assert!(all.contains_key("web_hits"));
        assert!(!all.contains_key("hits"));
    }

    #[test]
    fn test_get_all_rounds() {
        let mut counters = ValueCounters::new();
        counters.set("ratio", 0.6666);
        let all = counters.get_all(2);
        assert_eq!(all["ratio"], CounterValue::Float(0.67));
    }

    #[test]
    fn test_to_json() {
        let mut counters = ValueCounters::new();
        counters.set("a", 1);
        counters.set("b", 2.5);
        assert_eq!(counters.to_json(2).unwrap(), r#"{"a":1,"b":2.5}"#);
    }

    #[test]
    fn test_to_text_contains_rows() {
        let mut counters = ValueCounters::new();
        counters.set("requests", 42);
        let table = counters.to_text(2);
        assert!(table.contains("Name"));
        assert!(table.contains("Value"));
        assert!(table.contains("requests"));
        assert!(table.contains("42"));
    }

    #[test]
    fn test_to_md_is_pipe_table() {
        let mut counters = ValueCounters::new();
        counters.set("requests", 42);
        let table = counters.to_md(2);
        assert!(table.starts_with('|'));
        assert!(table.contains("| requests "));
    }

    #[test]
    fn test_to_html_wraps_cells() {
        let mut counters = ValueCounters::new();
        counters.set("requests", 42);
        let table = counters.to_html(2);
        assert!(table.starts_with("<table>"));
        assert!(table.contains("<th>Name</th>"));
        assert!(table.contains("<td>requests</td>"));
        assert!(table.contains("<td>42</td>"));
    }

    #[test]
    fn test_to_latex_is_tabular() {
        let mut counters = ValueCounters::new();
        counters.set("requests", 42);
        let table = counters.to_latex(2);
        assert!(table.starts_with("\\begin{tabular}"));
        assert!(table.contains("requests & 42"));
        assert!(table.ends_with("\\end{tabular}"));
    }
}
