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

//! Error types for log ingestion.

use crate::parser::LogType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that fail a single file's ingestion, or a config write.
///
/// Nothing here is fatal for a whole ingestion run; sibling files keep going.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file's dialect has no line grammar.
    #[error("{file_name} is a {log_type} file, not a line based log")]
    NotALogFile { file_name: String, log_type: LogType },

    /// Configuration could not be persisted.
    #[error("config error: {0}")]
    Config(String),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::io(
            "/tmp/browser.log",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "cannot read /tmp/browser.log: gone");

        let err = IngestError::NotALogFile {
            file_name: "net.log".to_string(),
            log_type: LogType::Netlog,
        };
        assert_eq!(err.to_string(), "net.log is a netlog file, not a line based log");

        let err = IngestError::Config("no config directory".to_string());
        assert_eq!(err.to_string(), "config error: no config directory");
    }
}
