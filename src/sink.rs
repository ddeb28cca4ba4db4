//! Injectable publishing seam for assembled reports.
//!
//! The library never talks to the network itself. Anything that should
//! receive finished [`Report`]s (a metrics gateway, a test double)
//! implements [`Sink`] and is handed to
//! [`Registry::publish`](crate::registry::Registry::publish). Publishing is
//! best-effort by contract: the registry logs a sink failure and moves on,
//! so an unreachable backend never breaks the instrumented code path.

use crate::report::Report;

/// A destination for assembled reports.
///
/// Errors are boxed so implementations can surface whatever their transport
/// produces; the registry logs and swallows them.
///
/// # Examples
///
/// ```rust
/// use cronometri::report::Report;
/// use cronometri::sink::Sink;
///
/// /// Keeps every published report in memory.
/// #[derive(Default)]
/// struct MemorySink {
///     published: Vec<Report>,
/// }
///
/// impl Sink for MemorySink {
///     fn publish(
///         &mut self,
///         report: &Report,
///     ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         self.published.push(report.clone());
///         Ok(())
///     }
/// }
/// ```
pub trait Sink {
    /// Delivers one report to the destination.
    fn publish(
        &mut self,
        report: &Report,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        published: usize,
    }

    impl Sink for CountingSink {
        fn publish(
            &mut self,
            _report: &Report,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.published += 1;
            Ok(())
        }
    }

    #[test]
    fn test_sink_works_as_a_trait_object() {
        let mut sink = CountingSink::default();
        {
            let sink: &mut dyn Sink = &mut sink;
            sink.publish(&Report::default()).unwrap();
        }
        assert_eq!(sink.published, 1);
    }
}
