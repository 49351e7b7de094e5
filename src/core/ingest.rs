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

//! Ingestion of a whole log bundle.
//!
//! Files are classified, log files are assembled in parallel, and the parsed
//! files are merged per dialect. The desktop process and webapp merges are
//! merged once more into the combined [`LogType::All`] view. A file that
//! fails only shows up in the report's failures.

use crate::config::IngestConfig;
use crate::core::entry::ParsedFile;
use crate::core::log_file::FileDescriptor;
use crate::core::merge::{merge, merge_async, MergeInput, MergedStream};
use crate::core::source::{LogSource, RawFile, StateFile};
use crate::error::IngestError;
use crate::parser::{LogType, TzHint};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// A file that could not be ingested.
#[derive(Debug)]
pub struct FileFailure {
    pub file_name: String,
    pub error: IngestError,
}

/// Everything ingestion produced.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Parsed files, in input order.
    pub parsed: Vec<Arc<ParsedFile>>,
    /// Files without a line grammar, if the config asks for them.
    pub state_files: Vec<StateFile>,
    pub failures: Vec<FileFailure>,
    /// One merge per dialect present, plus [`LogType::All`] when any
    /// desktop process or webapp file was parsed.
    pub merged: BTreeMap<LogType, Arc<MergedStream>>,
}

impl IngestReport {
    /// "N files could not be read", or `None` if every file was read.
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        match self.failures.len() {
            0 => None,
            1 => Some("1 file could not be read".to_string()),
            n => Some(format!("{n} files could not be read")),
        }
    }

    /// Total entries across all parsed files.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.parsed.iter().map(|p| p.entries.len()).sum()
    }
}

/// Parsed files grouped for merging, before any merge ran.
struct Loaded {
    parsed: Vec<Arc<ParsedFile>>,
    state_files: Vec<StateFile>,
    failures: Vec<FileFailure>,
}

fn load_all(descriptors: &[FileDescriptor], config: &IngestConfig, tz: Option<&TzHint>) -> Loaded {
    profiling::scope!("load_all");
    let mut raw: Vec<RawFile> = Vec::new();
    let mut state_files = Vec::new();

    for descriptor in descriptors {
        match LogSource::from_descriptor(descriptor.clone()) {
            LogSource::Raw(file) => raw.push(file),
            LogSource::State(state) if state.log_type == LogType::Unknown => {
                tracing::debug!("Skipping unrecognized file {}", state.descriptor.file_name);
            }
            LogSource::State(state) => {
                if config.include_state_files {
                    state_files.push(state);
                }
            }
            LogSource::Parsed(_) | LogSource::Merged(_) => {}
        }
    }

    let results: Vec<(String, crate::error::Result<ParsedFile>)> = raw
        .par_iter()
        .map(|file| (file.descriptor.file_name.clone(), file.load(tz)))
        .collect();

    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    for (file_name, result) in results {
        match result {
            Ok(file) => parsed.push(Arc::new(file)),
            Err(error) => {
                tracing::warn!("Could not read {file_name}: {error}");
                failures.push(FileFailure { file_name, error });
            }
        }
    }

    Loaded {
        parsed,
        state_files,
        failures,
    }
}

/// Parsed files grouped by dialect, preserving input order within each.
fn by_log_type(parsed: &[Arc<ParsedFile>]) -> BTreeMap<LogType, Vec<MergeInput>> {
    let mut groups: BTreeMap<LogType, Vec<MergeInput>> = BTreeMap::new();
    for file in parsed {
        groups
            .entry(file.log_type)
            .or_default()
            .push(MergeInput::Parsed(Arc::clone(file)));
    }
    groups
}

/// Inputs of the combined view: the merged streams of its member dialects.
fn all_view_inputs(merged: &BTreeMap<LogType, Arc<MergedStream>>) -> Vec<MergeInput> {
    LogType::ALL_VIEW_MEMBERS
        .iter()
        .filter_map(|log_type| merged.get(log_type))
        .map(|stream| MergeInput::Merged(Arc::clone(stream)))
        .collect()
}

fn report(loaded: Loaded, merged: BTreeMap<LogType, Arc<MergedStream>>, start: Instant) -> IngestReport {
    let report = IngestReport {
        parsed: loaded.parsed,
        state_files: loaded.state_files,
        failures: loaded.failures,
        merged,
    };
    tracing::info!(
        "Ingested {} files ({} entries) in {:?}, {} failed",
        report.parsed.len(),
        report.total_entries(),
        start.elapsed(),
        report.failures.len()
    );
    report
}

/// Ingest a bundle of files on the calling thread.
#[must_use]
pub fn ingest(descriptors: &[FileDescriptor], config: &IngestConfig) -> IngestReport {
    let start = Instant::now();
    let tz = config.tz_hint();
    let loaded = load_all(descriptors, config, tz.as_ref());

    let mut merged: BTreeMap<LogType, Arc<MergedStream>> = by_log_type(&loaded.parsed)
        .into_iter()
        .map(|(log_type, inputs)| (log_type, Arc::new(merge(&inputs, log_type))))
        .collect();

    let all_inputs = all_view_inputs(&merged);
    if !all_inputs.is_empty() {
        merged.insert(LogType::All, Arc::new(merge(&all_inputs, LogType::All)));
    }

    report(loaded, merged, start)
}

/// Ingest a bundle of files, loading on the blocking pool and sorting large
/// merges in the background.
pub async fn ingest_async(descriptors: Vec<FileDescriptor>, config: IngestConfig) -> IngestReport {
    let start = Instant::now();
    let threshold = config.background_sort_threshold;

    let loaded = match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let task_config = config.clone();
            let task_descriptors = descriptors.clone();
            handle
                .spawn_blocking(move || {
                    let tz = task_config.tz_hint();
                    load_all(&task_descriptors, &task_config, tz.as_ref())
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Background load failed ({e}), loading inline");
                    load_all(&descriptors, &config, config.tz_hint().as_ref())
                })
        }
        Err(_) => load_all(&descriptors, &config, config.tz_hint().as_ref()),
    };

    let mut merged = BTreeMap::new();
    for (log_type, inputs) in by_log_type(&loaded.parsed) {
        merged.insert(log_type, Arc::new(merge_async(inputs, log_type, threshold).await));
    }

    let all_inputs = all_view_inputs(&merged);
    if !all_inputs.is_empty() {
        let all = merge_async(all_inputs, LogType::All, threshold).await;
        merged.insert(LogType::All, Arc::new(all));
    }

    report(loaded, merged, start)
}
