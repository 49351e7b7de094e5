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

//! The kinds of thing a log bundle holds.
//!
//! Only parsed files and merged streams carry entries; raw files must be
//! loaded first and state files are never parsed.

use crate::core::entry::{LogEntry, ParsedFile};
use crate::core::log_file::{FileDescriptor, LogFileLoader};
use crate::core::merge::{MergeInput, MergedStream};
use crate::error::Result;
use crate::parser::{classify, LogType, MatcherKind, TzHint};
use std::sync::Arc;

/// A classified log file that hasn't been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub descriptor: FileDescriptor,
    pub log_type: LogType,
}

impl RawFile {
    /// Read and assemble this file.
    pub fn load(&self, tz: Option<&TzHint>) -> Result<ParsedFile> {
        LogFileLoader::load(&self.descriptor, self.log_type, tz)
    }
}

/// A file with no line grammar: net logs, traces, settings dumps and
/// anything unrecognized. Surfaced as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    pub descriptor: FileDescriptor,
    pub log_type: LogType,
}

#[derive(Debug, Clone)]
pub enum LogSource {
    Raw(RawFile),
    Parsed(Arc<ParsedFile>),
    Merged(Arc<MergedStream>),
    State(StateFile),
}

impl LogSource {
    /// Classify a file by name into a raw log or a state file.
    #[must_use]
    pub fn from_descriptor(descriptor: FileDescriptor) -> Self {
        let log_type = classify(&descriptor.file_name);
        if MatcherKind::resolve(log_type, &descriptor.file_name).is_some() {
            Self::Raw(RawFile {
                descriptor,
                log_type,
            })
        } else {
            Self::State(StateFile {
                descriptor,
                log_type,
            })
        }
    }

    #[must_use]
    pub fn log_type(&self) -> LogType {
        match self {
            Self::Raw(raw) => raw.log_type,
            Self::Parsed(file) => file.log_type,
            Self::Merged(stream) => stream.log_type,
            Self::State(state) => state.log_type,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Raw(RawFile { descriptor, .. }) | Self::State(StateFile { descriptor, .. }) => {
                &descriptor.full_path
            }
            Self::Parsed(file) => &file.id,
            Self::Merged(stream) => &stream.id,
        }
    }

    /// Entries, for the sources that have them.
    #[must_use]
    pub fn log_entries(&self) -> Option<&Arc<Vec<LogEntry>>> {
        match self {
            Self::Parsed(file) => Some(&file.entries),
            Self::Merged(stream) => Some(&stream.log_entries),
            Self::Raw(_) | Self::State(_) => None,
        }
    }

    #[must_use]
    pub fn as_merge_input(&self) -> Option<MergeInput> {
        match self {
            Self::Parsed(file) => Some(MergeInput::Parsed(Arc::clone(file))),
            Self::Merged(stream) => Some(MergeInput::Merged(Arc::clone(stream))),
            Self::Raw(_) | Self::State(_) => None,
        }
    }

    /// Load a raw source. Other sources are returned unchanged.
    pub fn load(self, tz: Option<&TzHint>) -> Result<Self> {
        match self {
            Self::Raw(raw) => Ok(Self::Parsed(Arc::new(raw.load(tz)?))),
            other @ (Self::Parsed(_) | Self::Merged(_) | Self::State(_)) => Ok(other),
        }
    }
}
