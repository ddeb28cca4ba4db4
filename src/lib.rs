//! # Cronometri - In-Process Performance Counters
//!
//! A small instrumentation library for counting things and timing things
//! inside a running program, and for turning the collected numbers into
//! reports a human (or a log pipeline) can read.
//!
//! Counters live in a [`Registry`](registry::Registry): scalar values you
//! move explicitly and timers on the monotonic clock, addressed by name and
//! optionally grouped under a shared prefix. Recording is cheap by design.
//! A timer is just a pair of instants; nothing is formatted, converted or
//! rounded until a report is actually drawn.
//!
//! ## Counter Kinds
//!
//! | Kind | Created by | Tracks |
//! |------|------------|--------|
//! | [`ValueCounter`](counters::value::ValueCounter) | `set` / `increment` / `decrement` | A named integer or float |
//! | [`TimerCounter`](counters::timer::TimerCounter) | `start` | Elapsed time, with optional laps |
//!
//! Both kinds record laps: a scalar lap remembers the current value, a
//! timer lap marks an instant so the report can show per-interval deltas
//! and statistics (min / average / median / max / stddev).
//!
//! ## Quick Start
//!
//! ```rust
//! use cronometri::registry::Registry;
//!
//! let mut counters = Registry::new();
//!
//! counters.increment("pages", 1).unwrap();
//! counters.increment("pages", 1).unwrap();
//!
//! counters.start("crawl").unwrap();
//! // ... the instrumented work ...
//! counters.lap("crawl").unwrap();
//! counters.stop("crawl").unwrap();
//!
//! // Sorted tables with section banners, largest value first.
//! println!("{}", counters.to_text());
//! ```
//!
//! ## Reports
//!
//! At report time counters are classified into three buckets: value
//! counters, timing counters, and (for timers that recorded laps) laps
//! counters with per-interval statistics. The same snapshot renders in any
//! of the supported encodings:
//!
//! | Surface | Output |
//! |---------|--------|
//! | [`to_text`](registry::Registry::to_text) | Section banners and rounded text grids |
//! | [`to_html`](registry::Registry::to_html) | `<h1>`/`<h2>` headings and `<table>` fragments |
//! | [`to_md`](registry::Registry::to_md) | Markdown headings and pipe tables |
//! | [`to_latex`](registry::Registry::to_latex) | `\section` headings and `tabular` fragments |
//! | [`to_json`](registry::Registry::to_json) | The serialized [`Report`](report::Report) |
//! | [`to_grepable`](registry::Registry::to_grepable) | One `[PerfCounters]`-tagged line per counter |
//!
//! Sorting is configurable through
//! [`ReportOptions`](report::ReportOptions): by value or by name, ascending
//! or descending (the default is by value, largest first).
//!
//! ## Grouping and Merging
//!
//! A prefixed registry stores every counter under `<prefix>_<name>`, which
//! makes it safe to hand sub-components their own registry and merge the
//! results later. Merging refuses to clobber: any stored-name collision
//! fails the whole merge and leaves the destination untouched.
//!
//! ```rust
//! use cronometri::registry::Registry;
//!
//! let mut main = Registry::new();
//! let mut worker = Registry::with_prefix("worker");
//! worker.set("rows", 500).unwrap();
//!
//! main.merge(&worker).unwrap();
//! assert!(main.get("worker_rows").is_some());
//! ```
//!
//! ## Logging and Publishing
//!
//! The library logs through [`tracing`]: timers started with
//! [`StartOptions::log`](counters::timer::StartOptions) emit start/stop
//! info events, a timer stopped past its configured warning deadline emits
//! a warning, and [`Registry::log`](registry::Registry::log) emits one info
//! event per report row. For external destinations, implement
//! [`Sink`](sink::Sink) and hand it to
//! [`Registry::publish`](registry::Registry::publish); sink failures are
//! logged and swallowed, never returned to the instrumented code path.
//!
//! ## Modules
//!
//! | Module | What lives there |
//! |--------|------------------|
//! | [`registry`] | The facade: both counter kinds under one namespace |
//! | [`counters`] | Counter values, time units, the standalone stores |
//! | [`report`] | Classification, sorting, lap statistics, rendering |
//! | [`format`] | The table encodings shared by stores and reports |
//! | [`sink`] | The injectable publishing seam |

pub mod counters;
pub mod format;
pub mod registry;
pub mod report;
pub mod sink;

mod error;

pub use error::{Error, Result};
