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

//! Merging of entry streams into one time ordered stream.
//!
//! Inputs are parsed files or earlier merges, so dialect merges can be merged
//! again into a combined view. A single input is passed through without
//! copying; several inputs are concatenated and sorted by `moment_value`,
//! entries without one last.

use crate::core::entry::{LogEntry, ParsedFile};
use crate::parser::LogType;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;

/// A time ordered view over one or more parsed files.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedStream {
    /// Ids of the contributing inputs, in order, joined with `+`.
    pub id: String,
    pub log_type: LogType,
    pub log_entries: Arc<Vec<LogEntry>>,
    #[serde(skip)]
    pub log_files: Vec<Arc<ParsedFile>>,
}

/// Anything that can be merged.
#[derive(Debug, Clone)]
pub enum MergeInput {
    Parsed(Arc<ParsedFile>),
    Merged(Arc<MergedStream>),
}

impl MergeInput {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Parsed(file) => &file.id,
            Self::Merged(stream) => &stream.id,
        }
    }

    #[must_use]
    pub fn log_entries(&self) -> &Arc<Vec<LogEntry>> {
        match self {
            Self::Parsed(file) => &file.entries,
            Self::Merged(stream) => &stream.log_entries,
        }
    }

    /// The parsed files behind this input.
    #[must_use]
    pub fn log_files(&self) -> Vec<Arc<ParsedFile>> {
        match self {
            Self::Parsed(file) => vec![Arc::clone(file)],
            Self::Merged(stream) => stream.log_files.clone(),
        }
    }
}

impl From<Arc<ParsedFile>> for MergeInput {
    fn from(file: Arc<ParsedFile>) -> Self {
        Self::Parsed(file)
    }
}

impl From<Arc<MergedStream>> for MergeInput {
    fn from(stream: Arc<MergedStream>) -> Self {
        Self::Merged(stream)
    }
}

/// Id of the merge of `inputs`. Order sensitive.
#[must_use]
pub fn merge_id(inputs: &[MergeInput]) -> String {
    inputs
        .iter()
        .map(MergeInput::id)
        .collect::<Vec<_>>()
        .join("+")
}

/// Ascending by `moment_value`, entries without one after everything else.
fn by_moment(a: &LogEntry, b: &LogEntry) -> Ordering {
    match (a.moment_value, b.moment_value) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Merge `inputs` into one stream.
///
/// `inputs` must not be empty.
#[must_use]
pub fn merge(inputs: &[MergeInput], log_type: LogType) -> MergedStream {
    profiling::scope!("merge");
    debug_assert!(!inputs.is_empty(), "merge of zero inputs");

    let id = merge_id(inputs);
    let log_files = inputs.iter().flat_map(MergeInput::log_files).collect();

    if let [single] = inputs {
        return MergedStream {
            id,
            log_type,
            log_entries: Arc::clone(single.log_entries()),
            log_files,
        };
    }

    let total: usize = inputs.iter().map(|i| i.log_entries().len()).sum();
    let mut entries = Vec::with_capacity(total);
    for input in inputs {
        entries.extend(input.log_entries().iter().cloned());
    }

    // stable, so equal moments keep input order
    entries.par_sort_by(by_moment);
    tracing::debug!("Merged {} inputs into {total} {log_type} entries", inputs.len());

    MergedStream {
        id,
        log_type,
        log_entries: Arc::new(entries),
        log_files,
    }
}

/// Merge `inputs`, sorting on the blocking pool when there are at least
/// `background_threshold` entries to sort.
///
/// Without a tokio runtime, or if the blocking task fails, the sort runs
/// inline with the same ordering.
pub async fn merge_async(
    inputs: Vec<MergeInput>,
    log_type: LogType,
    background_threshold: usize,
) -> MergedStream {
    let total: usize = inputs.iter().map(|i| i.log_entries().len()).sum();
    if inputs.len() < 2 || total < background_threshold {
        return merge(&inputs, log_type);
    }

    let Ok(handle) = Handle::try_current() else {
        tracing::debug!("No runtime, sorting {total} entries inline");
        return merge(&inputs, log_type);
    };

    let background = inputs.clone();
    match handle
        .spawn_blocking(move || merge(&background, log_type))
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("Background merge failed ({e}), sorting inline");
            merge(&inputs, log_type)
        }
    }
}
