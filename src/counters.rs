//! Core module containing the counter primitives shared by both counter
//! kinds.
//!
//! Two kinds of counters live under this module:
//!
//! - [`value::ValueCounter`] - a named scalar that is set, incremented and
//!   decremented explicitly, with an optional series of recorded laps.
//! - [`timer::TimerCounter`] - a named stopwatch on the monotonic clock,
//!   started at creation, stopped on demand, with lap instants in between.
//!
//! # Value model
//!
//! Every reading is a [`CounterValue`]: either an integer or a float.
//! Arithmetic between integers stays integer (saturating at the i64
//! bounds); as soon as a float operand is involved the result is a float.
//! Rounding applies to floats only; an integer reading is returned
//! untouched regardless of the requested precision.
//!
//! ```rust
//! use cronometri::counters::CounterValue;
//!
//! let n = CounterValue::Int(2).add(CounterValue::Int(3));
//! assert_eq!(n, CounterValue::Int(5));
//!
//! let x = n.add(CounterValue::Float(0.5));
//! assert_eq!(x, CounterValue::Float(5.5));
//! assert_eq!(CounterValue::Float(1.2345).rounded(2), CounterValue::Float(1.23));
//! ```
//!
//! # Time model
//!
//! Timers are lazy: a running timer stores only its start instant, and the
//! elapsed time is computed against "now" when (and only when) the counter
//! is read. Readings are converted to a [`TimeUnit`] (minutes, seconds or
//! milliseconds) at the reading site, never at recording time.

pub mod timer;
pub mod value;

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Rounds to `digits` decimal places, half away from zero.
pub(crate) fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Joins a prefix and a name into the stored counter key (plain name when
/// the prefix is empty).
pub(crate) fn prefixed(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", prefix, name)
    }
}

/// The reading of a counter: an integer or a float.
///
/// Serializes as a bare JSON number, so a report row looks like
/// `["requests", 42]` rather than carrying a variant tag. Equality and
/// ordering are numeric: `Int(2)` equals `Float(2.0)`.
///
/// # Examples
///
/// ```rust
/// use cronometri::counters::CounterValue;
///
/// assert!(CounterValue::Int(0).is_zero());
/// assert_eq!(CounterValue::Int(2), CounterValue::Float(2.0));
/// assert!(CounterValue::Int(1) < CounterValue::Float(1.5));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CounterValue {
    /// An integer reading.
    Int(i64),
    /// A floating-point reading.
    Float(f64),
}

impl CounterValue {
    /// Returns the reading as a float, whatever the variant.
    pub fn as_f64(&self) -> f64 {
        match self {
            CounterValue::Int(v) => *v as f64,
            CounterValue::Float(v) => *v,
        }
    }

    /// Returns `true` if the reading is the float variant.
    pub fn is_float(&self) -> bool {
        matches!(self, CounterValue::Float(_))
    }

    /// Returns `true` if the reading is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            CounterValue::Int(v) => *v == 0,
            CounterValue::Float(v) => *v == 0.0,
        }
    }

    /// Adds two readings. Integer + integer stays integer (saturating);
    /// any float operand makes the result a float.
    pub fn add(self, other: CounterValue) -> CounterValue {
        match (self, other) {
            (CounterValue::Int(a), CounterValue::Int(b)) => CounterValue::Int(a.saturating_add(b)),
            (a, b) => CounterValue::Float(a.as_f64() + b.as_f64()),
        }
    }

    /// Subtracts `other` from this reading, with the same promotion rule
    /// as [`add`](Self::add).
    pub fn sub(self, other: CounterValue) -> CounterValue {
        match (self, other) {
            (CounterValue::Int(a), CounterValue::Int(b)) => CounterValue::Int(a.saturating_sub(b)),
            (a, b) => CounterValue::Float(a.as_f64() - b.as_f64()),
        }
    }

    /// Rounds a float reading to `digits` decimal places; an integer
    /// reading is returned unchanged.
    pub fn rounded(&self, digits: u32) -> CounterValue {
        match self {
            CounterValue::Int(v) => CounterValue::Int(*v),
            CounterValue::Float(v) => CounterValue::Float(round_to(*v, digits)),
        }
    }
}

impl PartialEq for CounterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CounterValue::Int(a), CounterValue::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl PartialOrd for CounterValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (CounterValue::Int(a), CounterValue::Int(b)) => Some(a.cmp(b)),
            (a, b) => Some(a.as_f64().total_cmp(&b.as_f64())),
        }
    }
}

impl Display for CounterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterValue::Int(v) => write!(f, "{}", v),
            CounterValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for CounterValue {
    fn from(v: i64) -> Self {
        CounterValue::Int(v)
    }
}

impl From<i32> for CounterValue {
    fn from(v: i32) -> Self {
        CounterValue::Int(v as i64)
    }
}

impl From<u32> for CounterValue {
    fn from(v: u32) -> Self {
        CounterValue::Int(v as i64)
    }
}

impl From<u64> for CounterValue {
    fn from(v: u64) -> Self {
        CounterValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for CounterValue {
    fn from(v: usize) -> Self {
        CounterValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for CounterValue {
    fn from(v: f64) -> Self {
        CounterValue::Float(v)
    }
}

impl From<f32> for CounterValue {
    fn from(v: f32) -> Self {
        CounterValue::Float(v as f64)
    }
}

/// Unit a timer reading is converted to.
///
/// The wire names are the ones accepted by [`FromStr`]: `m`, `s` and `ms`.
/// Anything else fails with [`Error::InvalidTimeUnit`] before a value is
/// produced.
///
/// # Examples
///
/// ```rust
/// use cronometri::counters::TimeUnit;
///
/// let unit: TimeUnit = "ms".parse().unwrap();
/// assert_eq!(unit, TimeUnit::Millis);
/// assert!("parsecs".parse::<TimeUnit>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    /// Minutes (`m`).
    Minutes,
    /// Seconds (`s`), the default.
    #[default]
    Seconds,
    /// Milliseconds (`ms`).
    Millis,
}

impl TimeUnit {
    /// The short unit name, as used in table headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Seconds => "s",
            TimeUnit::Millis => "ms",
        }
    }

    /// Converts an elapsed duration into this unit.
    pub(crate) fn convert(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        match self {
            TimeUnit::Minutes => secs / 60.0,
            TimeUnit::Seconds => secs,
            TimeUnit::Millis => secs * 1000.0,
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(TimeUnit::Minutes),
            "s" => Ok(TimeUnit::Seconds),
            "ms" => Ok(TimeUnit::Millis),
            other => Err(Error::InvalidTimeUnit(other.to_string())),
        }
    }
}

/// Converts an elapsed duration into a reading: `rounding == 0` truncates
/// to an integer, any other precision rounds the float.
pub(crate) fn time_reading(elapsed: Duration, unit: TimeUnit, rounding: u32) -> CounterValue {
    let converted = unit.convert(elapsed);
    if rounding == 0 {
        CounterValue::Int(converted as i64)
    } else {
        CounterValue::Float(round_to(converted, rounding))
    }
}
