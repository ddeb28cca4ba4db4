//! Timer counters on the monotonic clock.
//!
//! A [`TimerCounter`] starts running the moment it is created and stores
//! nothing but instants: its start, an optional stop, and the laps recorded
//! in between. Readings are lazy: a running timer is measured against
//! "now" at the reading site, so an armed timer costs nothing until
//! someone looks at it. [`TimerCounters`] is the keyed store.
//!
//! Timers can carry a warning deadline: when the timer is stopped (directly
//! or through [`TimerCounters::stop_all`]) and its elapsed time exceeds the
//! deadline, a `tracing` warning is emitted. A missed deadline is never an
//! error.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use cronometri::counters::timer::TimerCounters;
//! use cronometri::counters::TimeUnit;
//!
//! let mut timers = TimerCounters::new();
//! timers.start("fetch").unwrap();
//! std::thread::sleep(Duration::from_millis(10));
//! timers.stop("fetch").unwrap();
//!
//! let elapsed = timers.get("fetch", TimeUnit::Seconds, 6).unwrap();
//! assert!(elapsed.as_f64() >= 0.01);
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::counters::{prefixed, time_reading, CounterValue, TimeUnit};
use crate::error::{Error, Result};
use crate::format::{self, TableFormat};

/// Options attached to a timer when it is started.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use cronometri::counters::timer::StartOptions;
///
/// let options = StartOptions::new()
///     .warning_deadline(Duration::from_secs(2))
///     .log(true);
/// assert_eq!(options.warning_deadline, Some(Duration::from_secs(2)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Elapsed time above which stopping the timer logs a warning.
    pub warning_deadline: Option<Duration>,
    /// Emit info events when the timer starts and stops.
    pub log: bool,
}

impl StartOptions {
    /// Creates the default options: no deadline, no log events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the warning deadline, returning `self` for chaining.
    pub fn warning_deadline(mut self, deadline: Duration) -> Self {
        self.warning_deadline = Some(deadline);
        self
    }

    /// Requests start/stop log events, returning `self` for chaining.
    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

/// A named stopwatch. Created running; stopped on demand.
#[derive(Debug, Clone)]
pub struct TimerCounter {
    name: String,
    started_at: Instant,
    stopped_at: Option<Instant>,
    laps: Vec<Instant>,
    warning_deadline: Option<Duration>,
    log: bool,
}

impl TimerCounter {
    /// Creates a timer named `name`, started now.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_options(name, StartOptions::default())
    }

    /// Creates a started timer configured from `options`.
    pub fn from_options(name: impl Into<String>, options: StartOptions) -> Self {
        TimerCounter {
            name: name.into(),
            started_at: Instant::now(),
            stopped_at: None,
            laps: Vec::new(),
            warning_deadline: options.warning_deadline,
            log: options.log,
        }
    }

    /// Sets the warning deadline, returning `self` for chaining.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.warning_deadline = Some(deadline);
        self
    }

    /// Requests start/stop log events, returning `self` for chaining.
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Returns the counter name (the stored, already-prefixed name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once the timer has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Returns `true` if at least one lap was recorded.
    pub fn has_laps(&self) -> bool {
        !self.laps.is_empty()
    }

    /// Number of recorded laps.
    pub fn lap_count(&self) -> usize {
        self.laps.len()
    }

    /// The configured warning deadline, if any.
    pub fn warning_deadline(&self) -> Option<Duration> {
        self.warning_deadline
    }

    /// Records a lap instant.
    pub fn lap(&mut self) {
        self.laps.push(Instant::now());
    }

    /// Stops the timer. Stopping again overwrites the stop instant.
    ///
    /// Emits the requested "counter stopped" info event, and a warning if
    /// the configured deadline was exceeded. Deadlines never fail the call.
    pub fn stop(&mut self) {
        self.stopped_at = Some(Instant::now());
        if self.log {
            info!(counter = %self.name, "counter stopped");
        }
        if let Some((elapsed, deadline)) = self.deadline_exceeded() {
            warn!(
                counter = %self.name,
                elapsed_secs = elapsed.as_secs_f64(),
                deadline_secs = deadline.as_secs_f64(),
                "counter deadline exceeded"
            );
        }
    }

    /// Restarts the timer: start is now, stop and laps are cleared. The
    /// deadline and log settings are configuration and survive.
    pub fn reset(&mut self) {
        self.started_at = Instant::now();
        self.stopped_at = None;
        self.laps.clear();
    }

    /// Time between start and stop, or start and now for a running timer.
    pub fn elapsed(&self) -> Duration {
        let end = self.stopped_at.unwrap_or_else(Instant::now);
        end.duration_since(self.started_at)
    }

    /// Returns `(elapsed, deadline)` when a configured deadline has been
    /// exceeded.
    pub fn deadline_exceeded(&self) -> Option<(Duration, Duration)> {
        let deadline = self.warning_deadline?;
        let elapsed = self.elapsed();
        (elapsed > deadline).then_some((elapsed, deadline))
    }

    /// The elapsed time converted to `unit`. `rounding == 0` truncates to
    /// an integer reading; any other precision rounds a float reading.
    pub fn get(&self, unit: TimeUnit, rounding: u32) -> CounterValue {
        time_reading(self.elapsed(), unit, rounding)
    }

    /// Seconds between consecutive recorded laps, the first measured from
    /// the start instant: exactly k entries for k laps.
    pub fn lap_deltas(&self) -> Vec<f64> {
        let mut deltas = Vec::with_capacity(self.laps.len());
        let mut previous = self.started_at;
        for lap in &self.laps {
            deltas.push(lap.duration_since(previous).as_secs_f64());
            previous = *lap;
        }
        deltas
    }

    /// The interval series in `unit`: the deltas between consecutive laps
    /// plus the trailing interval up to the stop instant (or now for a
    /// running timer). Exactly k+1 entries for k recorded laps.
    pub fn laps(&self, unit: TimeUnit, rounding: u32) -> Vec<CounterValue> {
        let mut series = Vec::with_capacity(self.laps.len() + 1);
        let mut previous = self.started_at;
        for lap in &self.laps {
            series.push(time_reading(lap.duration_since(previous), unit, rounding));
            previous = *lap;
        }
        let end = self.stopped_at.unwrap_or_else(Instant::now);
        series.push(time_reading(end.duration_since(previous), unit, rounding));
        series
    }
}

/// Store of timer counters keyed by stored (prefixed) name.
///
/// Unlike scalar counters, timers are created explicitly: [`start`] fails
/// with [`Error::AlreadyExists`] when the name is taken, stopped or not,
/// and [`reset`](Self::reset) is the restart mechanism. Every other
/// operation on a missing name is [`Error::NotFound`].
///
/// [`start`]: Self::start
#[derive(Debug, Clone, Default)]
pub struct TimerCounters {
    prefix: String,
    counters: BTreeMap<String, TimerCounter>,
}

impl TimerCounters {
    /// Creates an empty store with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose timers are stored as `<prefix>_<name>`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        TimerCounters {
            prefix: prefix.into(),
            counters: BTreeMap::new(),
        }
    }

    /// Returns the name prefix (empty when unset).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of timers in the store.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns `true` if the store holds no timers.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Creates and starts a timer.
    pub fn start(&mut self, name: &str) -> Result<()> {
        self.start_with(name, StartOptions::default())
    }

    /// Creates and starts a timer configured from `options`.
    pub fn start_with(&mut self, name: &str, options: StartOptions) -> Result<()> {
        let key = prefixed(&self.prefix, name);
        if self.counters.contains_key(&key) {
            return Err(Error::AlreadyExists(key));
        }
        if options.log {
            info!(counter = %key, "counter started");
        }
        let counter = TimerCounter::from_options(key.clone(), options);
        self.counters.insert(key, counter);
        Ok(())
    }

    /// Stops the timer (see [`TimerCounter::stop`]).
    pub fn stop(&mut self, name: &str) -> Result<()> {
        self.lookup_mut(name)?.stop();
        Ok(())
    }

    /// Stops every running timer; already-stopped timers are untouched.
    pub fn stop_all(&mut self) {
        for counter in self.counters.values_mut() {
            if !counter.is_stopped() {
                counter.stop();
            }
        }
    }

    /// Records a lap instant.
    pub fn lap(&mut self, name: &str) -> Result<()> {
        self.lookup_mut(name)?.lap();
        Ok(())
    }

    /// Restarts the timer (see [`TimerCounter::reset`]).
    pub fn reset(&mut self, name: &str) -> Result<()> {
        self.lookup_mut(name)?.reset();
        Ok(())
    }

    /// Restarts every timer.
    pub fn reset_all(&mut self) {
        self.counters.values_mut().for_each(TimerCounter::reset);
    }

    /// The elapsed time of one timer, converted and rounded
    /// (see [`TimerCounter::get`]).
    pub fn get(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<CounterValue> {
        Ok(self.lookup(name)?.get(unit, rounding))
    }

    /// The interval series of one timer: exactly k+1 entries for k laps
    /// (see [`TimerCounter::laps`]).
    pub fn get_laps(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<Vec<CounterValue>> {
        Ok(self.lookup(name)?.laps(unit, rounding))
    }

    /// Stored-name → elapsed, for every timer, in name order. "Now" is
    /// read per timer, at its own reading.
    pub fn get_all(&self, unit: TimeUnit, rounding: u32) -> BTreeMap<String, CounterValue> {
        self.counters
            .iter()
            .map(|(name, counter)| (name.clone(), counter.get(unit, rounding)))
            .collect()
    }

    /// Renders every timer in the requested format.
    pub fn render(&self, format: TableFormat, unit: TimeUnit, rounding: u32) -> Result<String> {
        let header = format!("Time ({})", unit);
        format::format_counters(&self.get_all(unit, rounding), ["Name", &header], format)
    }

    /// Prints the text table to stdout.
    pub fn report(&self, unit: TimeUnit, rounding: u32) {
        println!("{}", self.to_text(unit, rounding));
    }

    /// The timers as a rounded text grid.
    pub fn to_text(&self, unit: TimeUnit, rounding: u32) -> String {
        let header = format!("Time ({})", unit);
        format::text_table(
            &format::mapping_rows(&self.get_all(unit, rounding)),
            ["Name", &header],
        )
    }

    /// The timers as an HTML table.
    pub fn to_html(&self, unit: TimeUnit, rounding: u32) -> String {
        let header = format!("Time ({})", unit);
        format::html_table(
            &format::mapping_rows(&self.get_all(unit, rounding)),
            ["Name", &header],
        )
    }

    /// The timers as a GitHub-flavored Markdown table.
    pub fn to_md(&self, unit: TimeUnit, rounding: u32) -> String {
        let header = format!("Time ({})", unit);
        format::markdown_table(
            &format::mapping_rows(&self.get_all(unit, rounding)),
            ["Name", &header],
        )
    }

    /// The timers as a LaTeX `tabular` fragment.
    pub fn to_latex(&self, unit: TimeUnit, rounding: u32) -> String {
        let header = format!("Time ({})", unit);
        format::latex_table(
            &format::mapping_rows(&self.get_all(unit, rounding)),
            ["Name", &header],
        )
    }

    /// The name → elapsed mapping as JSON.
    pub fn to_json(&self, unit: TimeUnit, rounding: u32) -> Result<String> {
        self.render(TableFormat::Json, unit, rounding)
    }

    /// Renders one timer's interval series: a JSON array for
    /// [`TableFormat::Json`], otherwise a `Lap`/`Value` table indexed
    /// from 0.
    pub fn render_laps(
        &self,
        name: &str,
        format: TableFormat,
        unit: TimeUnit,
        rounding: u32,
    ) -> Result<String> {
        let series = self.get_laps(name, unit, rounding)?;
        match format {
            TableFormat::Json => Ok(serde_json::to_string(&series)?),
            _ => {
                let rows: Vec<[String; 2]> = series
                    .iter()
                    .enumerate()
                    .map(|(index, value)| [index.to_string(), value.to_string()])
                    .collect();
                Ok(format::styled_table(&rows, ["Lap", "Value"], format))
            }
        }
    }

    /// Prints one timer's interval series as a text table.
    pub fn report_laps(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<()> {
        println!("{}", self.render_laps(name, TableFormat::Text, unit, rounding)?);
        Ok(())
    }

    /// One timer's interval series as JSON.
    pub fn laps_to_json(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<String> {
        self.render_laps(name, TableFormat::Json, unit, rounding)
    }

    /// One timer's interval series as an HTML table.
    pub fn laps_to_html(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<String> {
        self.render_laps(name, TableFormat::Html, unit, rounding)
    }

    /// One timer's interval series as a Markdown table.
    pub fn laps_to_md(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<String> {
        self.render_laps(name, TableFormat::Markdown, unit, rounding)
    }

    /// One timer's interval series as a LaTeX table.
    pub fn laps_to_latex(&self, name: &str, unit: TimeUnit, rounding: u32) -> Result<String> {
        self.render_laps(name, TableFormat::Latex, unit, rounding)
    }

    /// Iterates over the stored timers in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TimerCounter> {
        self.counters.values()
    }

    fn lookup(&self, name: &str) -> Result<&TimerCounter> {
        let key = prefixed(&self.prefix, name);
        self.counters.get(&key).ok_or(Error::NotFound(key))
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut TimerCounter> {
        let key = prefixed(&self.prefix, name);
        self.counters.get_mut(&key).ok_or(Error::NotFound(key))
    }
}
