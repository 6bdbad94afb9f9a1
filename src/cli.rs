//! Command-line runner shared by the `race_tally` binary.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, error::ErrorKind};

use crate::config::TallyConfig;
use crate::constants::{orchestrator::DEFAULT_WORKERS, progress::DEFAULT_STEP_PERCENT};
use crate::orchestrator::{RaceSummary, summarize_race};
use crate::progress::{ProgressEvent, ProgressSink, TracingSink};
use crate::source::RaceIndex;

#[derive(Debug, Parser)]
#[command(
    name = "race_tally",
    disable_help_subcommand = true,
    about = "Summarize distance, average speed, and transport per race participant",
    long_about = "Read a race directory (index.json plus one JSON file of legs per day), aggregate every participant's legs across parallel workers, and print the per-participant summary.",
    after_help = "Set RUST_LOG=race_tally=debug to see per-batch timings."
)]
/// CLI for `race_tally`.
///
/// Common usage:
/// - `race_tally sample_data/test1`
/// - `race_tally --workers 16 sample_data/test4`
/// - `race_tally --scan --json data/` (no index.json needed)
struct SummarizeCli {
    #[arg(value_name = "DATA_DIR", help = "Race directory containing index.json and day files")]
    data_dir: PathBuf,
    #[arg(
        long,
        short = 'w',
        default_value_t = DEFAULT_WORKERS,
        value_parser = parse_positive_usize,
        help = "Number of parallel workers"
    )]
    workers: usize,
    #[arg(
        long = "progress-step",
        default_value_t = DEFAULT_STEP_PERCENT,
        value_parser = clap::value_parser!(u32).range(1..=100),
        help = "Percentage step between progress lines"
    )]
    progress_step: u32,
    #[arg(long, help = "Discover day_*.json files instead of reading index.json")]
    scan: bool,
    #[arg(long, help = "Print the summaries as JSON instead of the text report")]
    json: bool,
    #[arg(long, help = "Send progress to the log instead of stdout")]
    quiet: bool,
}

/// Parse `args_iter` (without the program name) and run one summary.
pub fn run_summarize<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<SummarizeCli, _>(std::iter::once("race_tally".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = TallyConfig {
        workers: cli.workers,
        progress_step: cli.progress_step,
    };
    let index = if cli.scan {
        RaceIndex::scan(&cli.data_dir)?
    } else {
        RaceIndex::load(&cli.data_dir)?
    };
    let sink: Arc<dyn ProgressSink> = if cli.quiet {
        Arc::new(TracingSink)
    } else {
        Arc::new(|event: &ProgressEvent| println!("{}", format_progress(event)))
    };

    let summary = summarize_race(&cli.data_dir, index, &config, sink)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary.report.summaries)?);
    } else {
        print!("{}", format_report(&summary));
    }
    Ok(())
}

/// One progress line, e.g. `Completed  45% of the legs, 43.2% by distance traveled`.
pub fn format_progress(event: &ProgressEvent) -> String {
    format!(
        "Completed {:>3}% of the legs, {:.1}% by distance traveled",
        event.percent_by_legs, event.percent_by_distance
    )
}

/// Human-readable race report.
pub fn format_report(summary: &RaceSummary) -> String {
    let mut out = String::new();
    // `String` never reports a write error.
    if write_report(&mut out, summary).is_err() {
        out.clear();
    }
    out
}

fn write_report(out: &mut impl fmt::Write, summary: &RaceSummary) -> fmt::Result {
    let friends = &summary.index.friends;
    writeln!(out, "\n\n++++++++++++")?;
    writeln!(
        out,
        "In total {} friends participated in this race: {}",
        friends.len(),
        friends.join(", ")
    )?;
    writeln!(
        out,
        "Together they traveled for total distance of {:.1} km\n",
        summary.index.total_distance()
    )?;
    for (participant, stats) in &summary.report.summaries {
        writeln!(out, "{participant}\n--------")?;
        writeln!(out, "Traveled {:.2}kms", stats.distance)?;
        writeln!(out, "At an avg speed of {:.4} km/h", stats.speed)?;
        writeln!(out, "Took: {}", stats.transport_tags().join(", "))?;
        writeln!(out)?;
    }
    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --workers value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--workers must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
