// Sleuthcrab - GPL-3.0-or-later
// This file is part of Sleuthcrab.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// Sleuthcrab is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Sleuthcrab is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Sleuthcrab.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use clap::Parser;
use sleuthcrab::core::{ingest_async, FileDescriptor, IngestReport, LogEntry, Meta};
use sleuthcrab::parser::{LogLevel, LogType};
use sleuthcrab::IngestConfig;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "ram-profiling")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Parser, Debug)]
#[command(name = "sleuthcrab")]
#[command(author = "Daniel Freiermuth")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Parse and merge desktop application log bundles into one timeline", long_about = None)]
struct Args {
    /// Log files, or directories whose files are all read
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// UTC offset for stamps without one (e.g. +01:00, -0800, UTC). Defaults to the config, then local time
    #[arg(long = "tz", value_name = "HINT")]
    tz: Option<String>,

    /// Print entries as JSON lines
    #[arg(long)]
    json: bool,

    /// Which merged stream to print (browser, webapp, mobile, all, ...)
    #[arg(long = "type", value_name = "TYPE")]
    log_type: Option<LogType>,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save_config: bool,

    /// Path for the DHAT heap profiling output (only used when built with --features ram-profiling)
    #[cfg(feature = "ram-profiling")]
    #[arg(
        long = "profile-output",
        value_name = "PROFILE_FILE",
        default_value = "dhat-heap.json"
    )]
    profile_output: PathBuf,
}

/// Describe the given paths, listing directories one level deep.
fn collect_descriptors(paths: &[PathBuf]) -> Result<Vec<FileDescriptor>> {
    let mut descriptors = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut children = Vec::new();
            for entry in std::fs::read_dir(path)
                .with_context(|| format!("Cannot list {}", path.display()))?
            {
                let child = entry?.path();
                if child.is_file() {
                    children.push(child);
                }
            }
            children.sort();
            for child in children {
                descriptors.push(describe(&child)?);
            }
        } else {
            descriptors.push(describe(path)?);
        }
    }
    Ok(descriptors)
}

fn describe(path: &Path) -> Result<FileDescriptor> {
    FileDescriptor::from_path(path).with_context(|| format!("Cannot open {}", path.display()))
}

fn print_summary(out: &mut impl Write, report: &IngestReport) -> Result<()> {
    for file in &report.parsed {
        let counts = file.level_counts;
        writeln!(
            out,
            "# {} [{}] {} entries from {} lines (debug {}, info {}, warn {}, error {})",
            file.file_name,
            file.log_type,
            file.entries.len(),
            file.lines,
            counts.debug,
            counts.info,
            counts.warn,
            counts.error
        )?;
    }
    for state in &report.state_files {
        writeln!(out, "# {} [{}] not parsed", state.descriptor.file_name, state.log_type)?;
    }
    Ok(())
}

fn print_entry(out: &mut impl Write, entry: &LogEntry, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, entry)?;
        writeln!(out)?;
        return Ok(());
    }

    let level = entry.level.map_or("-", LogLevel::as_str);
    writeln!(
        out,
        "{} {:5} [{}] {}",
        entry.timestamp, level, entry.log_type, entry.message
    )?;
    if let Some(text) = entry.meta.as_ref().and_then(Meta::text) {
        for line in text.lines() {
            writeln!(out, "    {line}")?;
        }
    }
    if !entry.repeated.is_empty() {
        writeln!(out, "    (repeated {} more times)", entry.repeated.len())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG environment variable to override (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "Sleuthcrab starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();

    #[cfg(feature = "ram-profiling")]
    let _profiler = {
        tracing::info!("RAM profiling enabled, output: {:?}", args.profile_output);
        dhat::Profiler::builder()
            .file_name(args.profile_output.clone())
            .build()
    };

    #[cfg(feature = "cpu-profiling")]
    let _tracy = {
        tracing::info!("CPU profiling enabled with Tracy - run Tracy profiler to connect");
        tracy_client::Client::start()
    };

    let mut config = IngestConfig::load();
    if let Some(tz) = args.tz {
        config.tz_hint = Some(tz);
    }
    if args.save_config {
        config.save()?;
    }

    let descriptors = collect_descriptors(&args.files)?;
    let report = ingest_async(descriptors, config).await;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if !args.json {
        print_summary(&mut out, &report)?;
    }

    let stream = match args.log_type {
        Some(log_type) => report.merged.get(&log_type),
        None => report
            .merged
            .get(&LogType::All)
            .or_else(|| report.merged.values().next()),
    };
    if let Some(stream) = stream {
        for entry in stream.log_entries.iter() {
            print_entry(&mut out, entry, args.json)?;
        }
    } else {
        tracing::warn!("No matching entries found");
    }
    out.flush()?;

    for failure in &report.failures {
        tracing::warn!("{}: {}", failure.file_name, failure.error);
    }
    if let Some(summary) = report.failure_summary() {
        tracing::warn!("{summary}");
    }

    Ok(())
}
