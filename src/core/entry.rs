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

//! Structured log entries and the per-file result of assembling them.

use crate::parser::{LogLevel, LogType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stamp used for entries that never got a parseable timestamp.
pub const NO_TIMESTAMP: &str = "No timestamp found";

/// Auxiliary payload attached to an entry: continuation lines, JSON blobs,
/// stack traces, or the source location Chromium reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Meta {
    Text(String),
    Source(SourceMeta),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    /// `file.cc(line)`
    pub source_file: String,
    pub pid: u32,
    /// Continuation text that followed the structured line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Meta {
    /// Attach continuation text. Text replaces text; structured meta keeps its
    /// fields and takes the text as detail.
    pub fn attach(meta: &mut Option<Self>, text: String) {
        match meta {
            Some(Self::Source(source)) => source.detail = Some(text),
            Some(Self::Text(_)) | None => *meta = Some(Self::Text(text)),
        }
    }

    /// The free-form text of this meta, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Source(source) => source.detail.as_deref(),
        }
    }
}

/// One logical log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Position within the owning file's entry list.
    pub index: usize,
    /// 1-based physical line the entry started on.
    pub line: usize,
    pub timestamp: String,
    /// Epoch milliseconds, absent when the stamp couldn't be resolved.
    pub moment_value: Option<i64>,
    pub level: Option<LogLevel>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub log_type: LogType,
    pub source_file: Arc<str>,
    /// Timestamps of consecutive duplicates folded into this entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeated: Vec<String>,
}

impl LogEntry {
    /// Whether `other` repeats this entry's content.
    #[must_use]
    pub fn is_repeat_of(&self, other: &Self) -> bool {
        self.message == other.message && self.meta == other.meta
    }
}

/// Entry counts per severity. Entries without a level are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

impl LevelCounts {
    pub const fn add(&mut self, level: LogLevel) {
        match level {
            LogLevel::Debug => self.debug += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Error => self.error += 1,
        }
    }

    #[must_use]
    pub const fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error
    }
}

/// A fully assembled log file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    /// Stable identity, the full path.
    pub id: String,
    pub file_name: String,
    pub full_path: String,
    pub size: u64,
    pub log_type: LogType,
    pub entries: Arc<Vec<LogEntry>>,
    /// Physical lines read.
    pub lines: usize,
    pub level_counts: LevelCounts,
    /// Number of folded duplicates per message, in first-seen order.
    pub repeated_counts: IndexMap<String, usize>,
}

impl ParsedFile {
    /// Matched lines the file contained: kept entries plus folded duplicates.
    #[must_use]
    pub fn matched_lines(&self) -> usize {
        self.entries.len() + self.repeated_counts.values().sum::<usize>()
    }
}
