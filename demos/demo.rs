//! Demo application walking through counters, timers, laps and reports.
//!
//! Run with:
//! ```bash
//! cargo run --example demo -- --help
//! ```

use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use cronometri::counters::timer::StartOptions;
use cronometri::registry::Registry;
use cronometri::report::{Report, ReportFormat, ReportOptions, SortBy};
use cronometri::sink::Sink;

/// Output format for the report.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum FormatChoice {
    /// Banners and rounded text grids
    #[default]
    Text,
    /// HTML headings and tables
    Html,
    /// Markdown headings and pipe tables
    Markdown,
    /// LaTeX sectioning and tabular fragments
    Latex,
    /// The serialized snapshot
    Json,
    /// One tagged line per counter
    Grepable,
}

/// Sort key for the report buckets.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SortChoice {
    #[default]
    Value,
    Name,
}

impl From<SortChoice> for SortBy {
    fn from(choice: SortChoice) -> Self {
        match choice {
            SortChoice::Value => SortBy::Value,
            SortChoice::Name => SortBy::Name,
        }
    }
}

/// Demo application for cronometri - in-process performance counters.
///
/// Runs a small scripted workload (scalar counters, timers with laps, a
/// deliberately slow phase that overruns its warning deadline, a prefixed
/// worker registry merged back in) and renders the report.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: FormatChoice,

    /// Sort key for the report buckets
    #[arg(short, long, value_enum, default_value = "value")]
    sort: SortChoice,

    /// Sort ascending instead of largest-first
    #[arg(long)]
    ascending: bool,

    /// Store every counter under this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Number of pipeline phases (one lap each)
    #[arg(long, default_value = "3")]
    phases: usize,

    /// Also emit the report rows as log events
    #[arg(long)]
    log_report: bool,
}

/// Prints a one-line summary for every published snapshot.
struct PrintSink;

impl Sink for PrintSink {
    fn publish(
        &mut self,
        report: &Report,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!(
            "published snapshot: {} values, {} timings, {} laps entries",
            report.values.len(),
            report.timings.len(),
            report.laps.len()
        );
        Ok(())
    }
}

/// Runs the scripted workload against the registry.
fn run_workload(counters: &mut Registry, phases: usize) -> cronometri::Result<()> {
    counters.set("batch_size", 64)?;

    counters.start_with("pipeline", StartOptions::new().log(true))?;
    for phase in 0..phases {
        for _ in 0..25 {
            counters.increment("records", 4)?;
        }
        counters.increment("queue_depth", 10)?;
        counters.decrement("queue_depth", 7)?;
        counters.lap("records")?;

        sleep(Duration::from_millis(10 + 5 * phase as u64));
        counters.lap("pipeline")?;
    }

    // Overruns its deadline on purpose; watch for the warning event.
    counters.start_with(
        "slow_phase",
        StartOptions::new()
            .warning_deadline(Duration::from_millis(10))
            .log(true),
    )?;
    sleep(Duration::from_millis(25));
    counters.stop("slow_phase")?;

    let mut worker = Registry::with_prefix("worker");
    worker.set("rows", 500)?;
    worker.start("run")?;
    sleep(Duration::from_millis(5));
    worker.stop("run")?;
    counters.merge(&worker)?;

    counters.stop_all();
    Ok(())
}

/// Renders the registry in the requested format.
fn render_output(args: &Args, counters: &Registry) -> String {
    let options = ReportOptions::new()
        .sort_by(args.sort.into())
        .reverse(!args.ascending);

    match args.format {
        FormatChoice::Text => counters.render(&options, ReportFormat::Text),
        FormatChoice::Html => counters.render(&options, ReportFormat::Html),
        FormatChoice::Markdown => counters.render(&options, ReportFormat::Markdown),
        FormatChoice::Latex => counters.render(&options, ReportFormat::Latex),
        FormatChoice::Json => counters
            .snapshot(&options)
            .to_json()
            .unwrap_or_else(|e| format!("Error: {}", e)),
        FormatChoice::Grepable => counters.to_grepable(&options),
    }
}

fn main() -> cronometri::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();

    let mut counters = match &args.prefix {
        Some(prefix) => Registry::with_prefix(prefix.clone()),
        None => Registry::new(),
    };

    run_workload(&mut counters, args.phases)?;

    println!("{}", render_output(&args, &counters));

    counters.publish(&mut PrintSink);

    if args.log_report {
        let options = ReportOptions::new()
            .sort_by(args.sort.into())
            .reverse(!args.ascending);
        counters.log(&options);
    }

    Ok(())
}
