//! simcpu — Simulate FCFS and Round-Robin CPU scheduling of a workload.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use simcpu::{init_tracing, parse_workload, report, Report, SimConfig, Simulator};

/// Simulate CPU scheduling of a multi-threaded workload.
///
/// The workload is read from INPUT, or from stdin when INPUT is omitted.
#[derive(Parser)]
#[command(name = "simcpu")]
struct Cli {
    /// Path to a workload description.
    input: Option<PathBuf>,

    /// Print arrival, service, I/O, turnaround and finish time of each thread.
    #[arg(short, long)]
    detailed: bool,

    /// Print every thread state transition as it happens.
    #[arg(short, long)]
    verbose: bool,

    /// Use Round-Robin with this time quantum instead of FCFS.
    #[arg(
        short = 'r',
        long,
        env = "SIMCPU_QUANTUM",
        value_name = "QUANTUM",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    quantum: Option<u64>,

    /// Print the statistics as JSON instead of text.
    #[arg(long, conflicts_with = "verbose")]
    json: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let text = read_input(cli)?;
    let workload = parse_workload(&text).context("failed to parse workload")?;

    let config = SimConfig::new(cli.quantum.unwrap_or(0))
        .verbose(cli.verbose)
        .detailed(cli.detailed);
    let outcome = Simulator::new(config).run(workload);
    let stats = Report::from_outcome(&outcome);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if config.verbose {
        outcome
            .trace
            .write_transitions(&mut out)
            .context("failed to write trace")?;
    }
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &stats).context("failed to write report")?;
        writeln!(out)?;
    } else {
        report::write_report(&mut out, &stats, config.detailed)
            .context("failed to write report")?;
    }
    Ok(())
}

fn read_input(cli: &Cli) -> Result<String> {
    match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
