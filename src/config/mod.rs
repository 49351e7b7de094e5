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

use crate::error::{IngestError, Result};
use crate::parser::TzHint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Multi-file merges with at least this many entries sort in the background
pub const DEFAULT_BACKGROUND_SORT_THRESHOLD: usize = 10_000;

/// User configuration stored in the config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// UTC offset for stamps that don't carry one (`+01:00`, `-0800`, `UTC`).
    /// `None` uses the local zone.
    pub tz_hint: Option<String>,

    pub background_sort_threshold: usize,

    /// Whether files without a line grammar are listed in ingestion reports
    pub include_state_files: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tz_hint: None,
            background_sort_threshold: DEFAULT_BACKGROUND_SORT_THRESHOLD,
            include_state_files: true,
        }
    }
}

impl IngestConfig {
    /// Get the path to the config file
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sleuthcrab").join("config.json"))
    }

    /// Load config from disk, returning defaults if not found
    #[must_use]
    pub fn load() -> Self {
        Self::config_path().map_or_else(Self::default, |path| Self::load_from(&path))
    }

    /// Load config from `path`, returning defaults if it is missing or unreadable
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No config found, using defaults");
            return Self::default();
        }

        tracing::info!("Loading config from {path:?}");
        match std::fs::read_to_string(path).map(|contents| serde_json::from_str::<Self>(&contents)) {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                tracing::warn!("Ignoring malformed config {path:?}: {e}");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Cannot read config {path:?}: {e}");
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| IngestError::Config("Could not determine config directory".to_string()))?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IngestError::Config(format!("Failed to create config directory: {e}")))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IngestError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, json)
            .map_err(|e| IngestError::Config(format!("Failed to write config file: {e}")))?;

        tracing::info!("Saved config to {path:?}");
        Ok(())
    }

    /// The parsed timezone hint. An invalid hint is ignored with a warning.
    #[must_use]
    pub fn tz_hint(&self) -> Option<TzHint> {
        let hint = self.tz_hint.as_deref()?;
        let parsed = TzHint::parse(hint);
        if parsed.is_none() {
            tracing::warn!("Ignoring invalid timezone hint {hint:?}, using local time");
        }
        parsed
    }
}
