//! pgspike - compare PostgreSQL activity between a normal and a spike period.
//!
//! Reads pg_activity snapshot captures, aggregates each period, and writes a
//! Markdown (or JSON) report of what changed. The `leader-replica` command runs
//! the same comparison on two servers and contrasts them.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use pgspike_core::fleet::{ServerPeriods, compare_fleet};
use pgspike_core::loader::load_snapshots;
use pgspike_core::report::{render_fleet_report, render_spike_report};
use pgspike_core::{
    ComparisonReport, Finding, MetricsSummary, compare, derive_findings, extract,
};

/// Spike analysis for pg_activity snapshot captures.
#[derive(Parser)]
#[command(
    name = "pgspike",
    about = "Compare PostgreSQL activity between normal and spike periods",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output document format.
    #[arg(long, value_enum, default_value_t = Format::Markdown, global = true)]
    format: Format,

    /// Lines of the generated report echoed to stdout (0 disables the preview).
    #[arg(long, default_value = "50", global = true)]
    preview_lines: usize,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compare a normal period against a spike period on one server.
    Spike {
        /// Snapshot file of the normal period (.json or .json.zst).
        #[arg(long, alias = "normal-json")]
        normal: PathBuf,

        /// Snapshot file of the spike period (.json or .json.zst).
        #[arg(long, alias = "spike-json")]
        spike: PathBuf,

        /// Report destination.
        #[arg(short, long, env = "PGSPIKE_OUTPUT", default_value = "report.md")]
        output: PathBuf,
    },

    /// Compare how a leader and its replica react to the same spike.
    LeaderReplica {
        #[arg(long)]
        leader_normal: PathBuf,
        #[arg(long)]
        leader_spike: PathBuf,
        #[arg(long)]
        replica_normal: PathBuf,
        #[arg(long)]
        replica_spike: PathBuf,

        /// Label used for the leader in the report.
        #[arg(long, default_value = "pg00")]
        leader_name: String,

        /// Label used for the replica in the report.
        #[arg(long, default_value = "pg01")]
        replica_name: String,

        /// Report destination.
        #[arg(
            short,
            long,
            env = "PGSPIKE_OUTPUT",
            default_value = "leader_replica_comparison.md"
        )]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Serialize)]
struct SpikeAnalysis<'a> {
    report: &'a ComparisonReport,
    findings: &'a [Finding],
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
/// Logs go to stderr so the report preview on stdout stays clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load and aggregate one period. Any failure aborts the run.
fn load_period(label: &str, path: &Path) -> Result<MetricsSummary> {
    info!("Loading {label} period: {}", path.display());
    let snapshots = load_snapshots(path)?;
    info!("  -> loaded {} snapshots", snapshots.len());
    extract(&snapshots).with_context(|| format!("invalid {label} period in {}", path.display()))
}

fn run_spike(normal: &Path, spike: &Path, format: Format) -> Result<String> {
    let normal = load_period("normal", normal)?;
    let spike = load_period("spike", spike)?;

    info!("Generating comparison report...");
    let report = compare(&normal, &spike);
    let findings = derive_findings(&report);

    Ok(match format {
        Format::Markdown => render_spike_report(&report, &findings),
        Format::Json => serde_json::to_string_pretty(&SpikeAnalysis {
            report: &report,
            findings: &findings,
        })?,
    })
}

struct FleetInputs<'a> {
    leader_name: &'a str,
    leader_normal: &'a Path,
    leader_spike: &'a Path,
    replica_name: &'a str,
    replica_normal: &'a Path,
    replica_spike: &'a Path,
}

fn run_leader_replica(inputs: &FleetInputs<'_>, format: Format) -> Result<String> {
    let leader_normal = load_period("leader normal", inputs.leader_normal)?;
    let leader_spike = load_period("leader spike", inputs.leader_spike)?;
    let replica_normal = load_period("replica normal", inputs.replica_normal)?;
    let replica_spike = load_period("replica spike", inputs.replica_spike)?;

    info!("Comparing {} and {}...", inputs.leader_name, inputs.replica_name);
    let fleet = compare_fleet(
        &ServerPeriods {
            name: inputs.leader_name,
            baseline: &leader_normal,
            variant: &leader_spike,
        },
        &ServerPeriods {
            name: inputs.replica_name,
            baseline: &replica_normal,
            variant: &replica_spike,
        },
    );

    Ok(match format {
        Format::Markdown => render_fleet_report(&fleet),
        Format::Json => serde_json::to_string_pretty(&fleet)?,
    })
}

fn run(args: Args) -> Result<()> {
    // Everything is computed before the destination is touched.
    let (document, output) = match &args.command {
        Command::Spike {
            normal,
            spike,
            output,
        } => (run_spike(normal, spike, args.format)?, output),
        Command::LeaderReplica {
            leader_normal,
            leader_spike,
            replica_normal,
            replica_spike,
            leader_name,
            replica_name,
            output,
        } => {
            let inputs = FleetInputs {
                leader_name,
                leader_normal,
                leader_spike,
                replica_name,
                replica_normal,
                replica_spike,
            };
            (run_leader_replica(&inputs, args.format)?, output)
        }
    };

    output::write_atomic(output, &document)?;
    info!("Report generated: {}", output.display());
    output::print_preview(&document, args.preview_lines);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
