//! The registry: both counter kinds behind one facade.
//!
//! A [`Registry`] owns scalar counters and timers in a single namespace,
//! optionally under a shared name prefix. Callers mutate counters by their
//! plain name; the registry resolves it to the stored (prefixed) name, keeps
//! one kind per name, and classifies everything at report time through the
//! [`report`](crate::report) engine.
//!
//! Reading a live timer is lazy. Nothing ticks in the background; the
//! elapsed time is computed against "now" when a report is drawn, so an
//! instrumented hot path pays for a map lookup and little else.
//!
//! # Examples
//!
//! ```rust
//! use cronometri::registry::Registry;
//!
//! let mut counters = Registry::new();
//! counters.set("batch_size", 64).unwrap();
//! counters.increment("records", 128).unwrap();
//!
//! counters.start("ingest").unwrap();
//! counters.lap("ingest").unwrap();
//! counters.stop("ingest").unwrap();
//!
//! // Text report: Value counters, Timing counters, Laps counters.
//! println!("{}", counters.to_text());
//! ```

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::counters::timer::{StartOptions, TimerCounter};
use crate::counters::value::ValueCounter;
use crate::counters::{prefixed, CounterValue};
use crate::error::{Error, Result};
use crate::report::{self, Report, ReportFormat, ReportOptions};
use crate::sink::Sink;

/// The two counter kinds a registry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Value,
    Timer,
}

/// One registered counter.
#[derive(Debug, Clone)]
pub enum Counter {
    Value(ValueCounter),
    Timer(TimerCounter),
}

impl Counter {
    /// The stored (prefixed) counter name.
    pub fn name(&self) -> &str {
        match self {
            Counter::Value(counter) => counter.name(),
            Counter::Timer(timer) => timer.name(),
        }
    }

    /// The counter's kind.
    pub fn kind(&self) -> CounterKind {
        match self {
            Counter::Value(_) => CounterKind::Value,
            Counter::Timer(_) => CounterKind::Timer,
        }
    }
}

/// Scalar counters and timers under one namespace.
///
/// A name holds exactly one kind: scalar mutators refuse a name bound to a
/// timer, `start` refuses any existing name. Merging registries carries
/// stored names over verbatim and refuses to clobber.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    prefix: String,
    counters: BTreeMap<String, Counter>,
}

impl Registry {
    /// Creates an empty registry without a prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose counters are stored under
    /// `<prefix>_<name>`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Registry {
            prefix: prefix.into(),
            counters: BTreeMap::new(),
        }
    }

    /// The configured name prefix (may be empty).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of registered counters, both kinds.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns `true` if no counter is registered.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Iterates the registered counters in stored-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Counter> {
        self.counters.values()
    }

    /// Sets a scalar counter to `value`, creating it if absent.
    ///
    /// Fails with [`Error::AlreadyExists`] if the name is bound to a timer.
    pub fn set(&mut self, name: &str, value: impl Into<CounterValue>) -> Result<()> {
        self.with_value_counter(name, |counter| counter.set(value.into()))
    }

    /// Adds `delta` to a scalar counter, creating it at zero if absent, and
    /// returns the new value.
    ///
    /// Fails with [`Error::AlreadyExists`] if the name is bound to a timer.
    pub fn increment(
        &mut self,
        name: &str,
        delta: impl Into<CounterValue>,
    ) -> Result<CounterValue> {
        self.with_value_counter(name, |counter| counter.add(delta.into()))
    }

    /// Subtracts `delta` from a scalar counter, creating it at zero if
    /// absent, and returns the new value.
    ///
    /// Fails with [`Error::AlreadyExists`] if the name is bound to a timer.
    pub fn decrement(
        &mut self,
        name: &str,
        delta: impl Into<CounterValue>,
    ) -> Result<CounterValue> {
        self.with_value_counter(name, |counter| counter.sub(delta.into()))
    }

    fn with_value_counter<T>(
        &mut self,
        name: &str,
        apply: impl FnOnce(&mut ValueCounter) -> T,
    ) -> Result<T> {
        let key = prefixed(&self.prefix, name);
        match self.counters.entry(key) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Counter::Value(counter) => Ok(apply(counter)),
                Counter::Timer(_) => Err(Error::AlreadyExists(occupied.key().clone())),
            },
            Entry::Vacant(vacant) => {
                let mut counter = ValueCounter::new(vacant.key().clone(), CounterValue::Int(0));
                let result = apply(&mut counter);
                vacant.insert(Counter::Value(counter));
                Ok(result)
            }
        }
    }

    /// Creates and starts a timer.
    ///
    /// Fails with [`Error::AlreadyExists`] if the name exists, whatever its
    /// kind or state; [`Self::reset`] is the restart path.
    pub fn start(&mut self, name: &str) -> Result<()> {
        self.start_with(name, StartOptions::default())
    }

    /// Creates and starts a timer configured from `options`: an optional
    /// warning deadline checked when the timer stops, and optional
    /// start/stop log events.
    pub fn start_with(&mut self, name: &str, options: StartOptions) -> Result<()> {
        let key = prefixed(&self.prefix, name);
        if self.counters.contains_key(&key) {
            return Err(Error::AlreadyExists(key));
        }
        if options.log {
            info!(counter = %key, "counter started");
        }
        let timer = TimerCounter::from_options(key.clone(), options);
        self.counters.insert(key, Counter::Timer(timer));
        Ok(())
    }

    /// Stops a timer, freezing its reading. Stopping again overwrites the
    /// stop instant. The deadline warning, if configured, fires here.
    ///
    /// Fails with [`Error::NotFound`] for a missing name or a name bound to
    /// a scalar counter.
    pub fn stop(&mut self, name: &str) -> Result<()> {
        let key = prefixed(&self.prefix, name);
        match self.counters.get_mut(&key) {
            Some(Counter::Timer(timer)) => {
                timer.stop();
                Ok(())
            }
            _ => Err(Error::NotFound(key)),
        }
    }

    /// Stops every running timer. Already-stopped timers keep their stop
    /// instant.
    pub fn stop_all(&mut self) {
        for counter in self.counters.values_mut() {
            if let Counter::Timer(timer) = counter {
                if !timer.is_stopped() {
                    timer.stop();
                }
            }
        }
    }

    /// Records a lap: the current value for a scalar counter, a lap instant
    /// for a timer.
    ///
    /// Fails with [`Error::NotFound`] if the name is absent; the kind to
    /// create cannot be inferred from a lap.
    pub fn lap(&mut self, name: &str) -> Result<()> {
        let key = prefixed(&self.prefix, name);
        match self.counters.get_mut(&key) {
            Some(Counter::Value(counter)) => {
                counter.lap();
                Ok(())
            }
            Some(Counter::Timer(timer)) => {
                timer.lap();
                Ok(())
            }
            None => Err(Error::NotFound(key)),
        }
    }

    /// Resets a counter: scalars go back to zero (keeping recorded laps),
    /// timers restart from now (clearing stop and laps, keeping their
    /// deadline and log configuration).
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let key = prefixed(&self.prefix, name);
        match self.counters.get_mut(&key) {
            Some(Counter::Value(counter)) => {
                counter.reset();
                Ok(())
            }
            Some(Counter::Timer(timer)) => {
                timer.reset();
                Ok(())
            }
            None => Err(Error::NotFound(key)),
        }
    }

    /// Resets every counter, both kinds.
    pub fn reset_all(&mut self) {
        for counter in self.counters.values_mut() {
            match counter {
                Counter::Value(counter) => counter.reset(),
                Counter::Timer(timer) => timer.reset(),
            }
        }
    }

    /// Soft read: the raw value of a scalar counter, or a timer's elapsed
    /// seconds (unrounded). `None` for unknown names.
    pub fn get(&self, name: &str) -> Option<CounterValue> {
        let key = prefixed(&self.prefix, name);
        match self.counters.get(&key)? {
            Counter::Value(counter) => Some(counter.value()),
            Counter::Timer(timer) => {
                Some(CounterValue::Float(timer.elapsed().as_secs_f64()))
            }
        }
    }

    /// Copies every counter of `other` into `self`, stored names kept
    /// verbatim, state and lap history included.
    ///
    /// If any incoming stored name already exists here, fails with
    /// [`Error::DuplicateName`] and leaves `self` completely unmodified.
    pub fn merge(&mut self, other: &Registry) -> Result<()> {
        for key in other.counters.keys() {
            if self.counters.contains_key(key) {
                return Err(Error::DuplicateName(key.clone()));
            }
        }
        for (key, counter) in &other.counters {
            self.counters.insert(key.clone(), counter.clone());
        }
        Ok(())
    }

    /// Classifies and sorts the live counters into a [`Report`].
    pub fn snapshot(&self, options: &ReportOptions) -> Report {
        report::process_counters(self.counters.values(), options)
    }

    /// Renders the full report in `format`.
    pub fn render(&self, options: &ReportOptions, format: ReportFormat) -> String {
        report::gen_report(&self.snapshot(options), format)
    }

    /// The text report with default options (by value, descending).
    pub fn to_text(&self) -> String {
        self.render(&ReportOptions::default(), ReportFormat::Text)
    }

    /// The HTML report with default options.
    pub fn to_html(&self) -> String {
        self.render(&ReportOptions::default(), ReportFormat::Html)
    }

    /// The Markdown report with default options.
    pub fn to_md(&self) -> String {
        self.render(&ReportOptions::default(), ReportFormat::Markdown)
    }

    /// The LaTeX report with default options.
    pub fn to_latex(&self) -> String {
        self.render(&ReportOptions::default(), ReportFormat::Latex)
    }

    /// The JSON export of the default-options snapshot.
    pub fn to_json(&self) -> Result<String> {
        self.snapshot(&ReportOptions::default()).to_json()
    }

    /// One grep-friendly line per counter (two per laps entry).
    pub fn to_grepable(&self, options: &ReportOptions) -> String {
        report::to_grepable(&self.snapshot(options))
    }

    /// Prints the text report to stdout.
    pub fn report(&self, options: &ReportOptions) {
        println!("{}", self.render(options, ReportFormat::Text));
    }

    /// Emits one info event per report row through the logging
    /// collaborator.
    pub fn log(&self, options: &ReportOptions) {
        let snapshot = self.snapshot(options);
        for (name, value) in &snapshot.values {
            info!(
                bucket = report::VALUE_COUNTERS,
                counter = %name,
                value = %value,
                "counter"
            );
        }
        for (name, seconds) in &snapshot.timings {
            info!(
                bucket = report::TIME_COUNTERS,
                counter = %name,
                seconds = *seconds,
                "counter"
            );
        }
        for entry in &snapshot.laps {
            info!(
                bucket = report::LAPS_COUNTERS,
                counter = %entry.name,
                laps = entry.laps.len(),
                average = entry.stats.average,
                max = entry.stats.max,
                "counter laps"
            );
        }
    }

    /// Hands the default-options snapshot to `sink`. Publishing is
    /// best-effort: a sink failure is logged as a warning, never returned.
    pub fn publish(&self, sink: &mut dyn Sink) {
        let snapshot = self.snapshot(&ReportOptions::default());
        if let Err(error) = sink.publish(&snapshot) {
            warn!(error = %error, "sink publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        reports: Vec<Report>,
    }

    impl Sink for RecordingSink {
        fn publish(
            &mut self,
            report: &Report,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.reports.push(report.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn publish(
            &mut self,
            _report: &Report,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("sink unavailable".into())
        }
    }

    #[test]
    fn test_increment_sums_from_zero() {
        let mut registry = Registry::new();
        registry.increment("requests", 1).unwrap();
        let value = registry.increment("requests", 1).unwrap();
        assert_eq!(value, CounterValue::Int(2));
        assert_eq!(registry.get("requests"), Some(CounterValue::Int(2)));
    }

    #[test]
    fn test_set_overwrites() {
        let mut registry = Registry::new();
        registry.set("load", 5).unwrap();
        registry.set("load", 2.5).unwrap();
        assert_eq!(registry.get("load"), Some(CounterValue::Float(2.5)));
    }

    #[test]
    fn test_decrement_goes_negative() {
        let mut registry = Registry::new();
        registry.decrement("budget", 3).unwrap();
        assert_eq!(registry.get("budget"), Some(CounterValue::Int(-3)));
    }

    #[test]
    fn test_one_kind_per_name() {
        let mut registry = Registry::new();
        registry.start("job").unwrap();
        assert!(matches!(
            registry.set("job", 1),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.increment("job", 1),
            Err(Error::AlreadyExists(_))
        ));

        registry.set("hits", 1).unwrap();
        assert!(matches!(
            registry.start("hits"),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_start_twice_is_already_exists() {
        let mut registry = Registry::new();
        registry.start("job").unwrap();
        registry.stop("job").unwrap();
        assert!(matches!(
            registry.start("job"),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_stop_requires_a_timer() {
        let mut registry = Registry::new();
        assert!(matches!(registry.stop("nope"), Err(Error::NotFound(_))));
        registry.set("hits", 1).unwrap();
        assert!(matches!(registry.stop("hits"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_lap_dispatches_by_kind() {
        let mut registry = Registry::new();
        registry.set("hits", 3).unwrap();
        registry.start("job").unwrap();
        registry.lap("hits").unwrap();
        registry.lap("job").unwrap();
        assert!(matches!(registry.lap("absent"), Err(Error::NotFound(_))));

        let report = registry.snapshot(&ReportOptions::default());
        assert_eq!(report.laps.len(), 1, "scalar laps are not a laps entry");
        assert_eq!(report.laps[0].name, "job");
    }

    #[test]
    fn test_get_is_a_soft_read() {
        let mut registry = Registry::new();
        assert_eq!(registry.get("nope"), None);

        registry.set("hits", 7).unwrap();
        assert_eq!(registry.get("hits"), Some(CounterValue::Int(7)));

        registry.start("job").unwrap();
        match registry.get("job") {
            Some(CounterValue::Float(seconds)) => assert!(seconds >= 0.0),
            other => panic!("expected elapsed seconds, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_dispatches_by_kind() {
        let mut registry = Registry::new();
        registry.set("hits", 9).unwrap();
        registry.start("job").unwrap();
        sleep(Duration::from_millis(100));
        registry.stop("job").unwrap();
        let frozen = registry.get("job");

        registry.reset("hits").unwrap();
        registry.reset("job").unwrap();
        assert_eq!(registry.get("hits"), Some(CounterValue::Int(0)));
        match (registry.get("job"), frozen) {
            (Some(CounterValue::Float(after)), Some(CounterValue::Float(before))) => {
                assert!(after < before)
            }
            other => panic!("expected elapsed seconds, got {other:?}"),
        }
        assert!(matches!(registry.reset("absent"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_stop_all_freezes_readings() {
        let mut registry = Registry::new();
        registry.start("a").unwrap();
        registry.start("b").unwrap();
        sleep(Duration::from_millis(10));
        registry.stop_all();

        let first = registry.get("a");
        sleep(Duration::from_millis(10));
        assert_eq!(registry.get("a"), first);
        assert!(registry.get("b").is_some());
    }

    #[test]
    fn test_prefix_is_baked_into_stored_names() {
        let mut registry = Registry::with_prefix("web");
        registry.increment("hits", 1).unwrap();
        registry.start("render").unwrap();

        let report = registry.snapshot(&ReportOptions::default());
        assert_eq!(report.values[0].0, "web_hits");
        assert_eq!(report.timings[0].0, "web_render");
        // Caller-facing names stay unprefixed.
        assert_eq!(registry.get("hits"), Some(CounterValue::Int(1)));
    }

    #[test]
    fn test_merge_keeps_stored_names() {
        let mut registry = Registry::new();
        registry.set("total", 1).unwrap();

        let mut job = Registry::with_prefix("job");
        job.set("rows", 500).unwrap();
        job.start("run").unwrap();

        registry.merge(&job).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("job_rows"), Some(CounterValue::Int(500)));
    }

    #[test]
    fn test_merge_collision_leaves_destination_unmodified() {
        let mut registry = Registry::new();
        registry.set("a", 1).unwrap();
        registry.set("z", 9).unwrap();

        let mut other = Registry::new();
        other.set("b", 5).unwrap();
        other.set("z", 2).unwrap();

        let err = registry.merge(&other).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(name) if name == "z"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a"), Some(CounterValue::Int(1)));
        assert_eq!(registry.get("z"), Some(CounterValue::Int(9)));
        assert_eq!(registry.get("b"), None, "nothing is copied on collision");
    }

    #[test]
    fn test_snapshot_classifies_counters() {
        let mut registry = Registry::new();
        registry.set("hits", 42).unwrap();
        registry.start("job").unwrap();
        registry.lap("job").unwrap();
        registry.start("plain").unwrap();

        let report = registry.snapshot(&ReportOptions::default());
        assert_eq!(report.values.len(), 1);
        assert_eq!(report.timings.len(), 2);
        assert_eq!(report.laps.len(), 1);
        assert_eq!(report.laps[0].name, "job");
    }

    #[test]
    fn test_to_json_shape() {
        let mut registry = Registry::new();
        registry.set("requests", 42).unwrap();
        assert_eq!(
            registry.to_json().unwrap(),
            r#"{"Value counters":[["requests",42]]}"#
        );
    }

    #[test]
    fn test_render_formats() {
        let mut registry = Registry::new();
        registry.set("requests", 42).unwrap();

        assert!(registry.to_text().contains("-=[Value counters]=-"));
        assert!(registry.to_md().contains("#Value counters"));
        assert!(registry.to_html().contains("<h1>Value counters</h1>"));
        assert!(registry.to_latex().contains("\\section{Value counters}"));
    }

    #[test]
    fn test_grepable_tags_every_row() {
        let mut registry = Registry::new();
        registry.set("requests", 42).unwrap();
        registry.start("job").unwrap();

        let grepable = registry.to_grepable(&ReportOptions::default());
        assert_eq!(grepable.lines().count(), 2);
        assert!(grepable
            .lines()
            .all(|line| line.starts_with("[PerfCounters]")));
    }

    #[test]
    fn test_publish_hands_over_the_snapshot() {
        let mut registry = Registry::new();
        registry.set("requests", 42).unwrap();

        let mut sink = RecordingSink::default();
        registry.publish(&mut sink);
        assert_eq!(sink.reports.len(), 1);
        assert_eq!(sink.reports[0].values[0].0, "requests");
    }

    #[test]
    fn test_publish_swallows_sink_failures() {
        let mut registry = Registry::new();
        registry.set("requests", 42).unwrap();
        registry.publish(&mut FailingSink);
        // Still usable afterwards; the failure never surfaced.
        assert_eq!(registry.get("requests"), Some(CounterValue::Int(42)));
    }

    #[test]
    fn test_counter_accessors() {
        let mut registry = Registry::with_prefix("app");
        registry.set("hits", 1).unwrap();
        registry.start("job").unwrap();

        let kinds: Vec<(&str, CounterKind)> = registry
            .iter()
            .map(|counter| (counter.name(), counter.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("app_hits", CounterKind::Value),
                ("app_job", CounterKind::Timer)
            ]
        );
    }
}
