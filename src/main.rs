//! fileindex: walk a directory tree once and write directory, symlink and
//! file manifests with parallel content digests.
//!
//! Thin binary entry point. All indexing logic lives in `fileindex-core`.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::CliArgs;
use fileindex_core::model::size::{format_rate, format_size};
use fileindex_core::scanner::{IndexProgress, Phase};
use fileindex_core::{start_index, IndexSummary};
use std::io::Write;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(args) {
        Ok(summary) => {
            println!(
                "Indexed {} directories, {} links, {} files ({}) in {:.2?}",
                summary.dirs_listed,
                summary.links_listed,
                summary.files_listed,
                format_size(summary.walk.bytes),
                summary.duration,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<IndexSummary> {
    let config = args.into_config()?;
    let source = config.source.clone();
    let handle = start_index(config)?;

    let mut stdout = std::io::stdout().lock();
    for msg in handle.progress_rx.iter() {
        // Status lines are best effort; a closed stdout must not stall the run.
        let _ = report(&mut stdout, msg);
    }
    drop(stdout);

    handle
        .join()
        .with_context(|| format!("indexing '{}' did not complete cleanly", source.display()))
}

fn report(out: &mut impl Write, msg: IndexProgress) -> std::io::Result<()> {
    match msg {
        IndexProgress::PhaseStarted(phase) => {
            write!(out, "{phase}...")?;
            if phase == Phase::Hashing {
                writeln!(out)?;
            }
            out.flush()
        }
        IndexProgress::PhaseFinished { phase, duration } => {
            if phase == Phase::Hashing {
                write!(out, "{phase}...")?;
            }
            writeln!(out, " Done ({duration:.2?})")
        }
        IndexProgress::PartitionAssigned {
            worker,
            files,
            bytes,
        } => writeln!(
            out,
            "  worker {worker}: {files} files, {}",
            format_size(bytes)
        ),
        IndexProgress::WorkerFinished {
            worker,
            hashed,
            failed,
            bytes,
            duration,
        } => writeln!(
            out,
            "  worker {worker}: hashed {hashed}, failed {failed}, {} at {}",
            format_size(bytes),
            format_rate(bytes, duration),
        ),
        IndexProgress::Update { .. } | IndexProgress::HashError { .. } => Ok(()),
    }
}
