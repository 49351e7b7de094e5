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

use crate::core::assembler;
use crate::core::entry::ParsedFile;
use crate::error::{IngestError, Result};
use crate::parser::{LogType, TzHint};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Name, location and size of a file handed to ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub file_name: String,
    pub full_path: String,
    pub size: u64,
}

impl FileDescriptor {
    /// Describe an on-disk file. Fails if its metadata can't be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| IngestError::io(path, e))?;
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            file_name,
            full_path: path.display().to_string(),
            size: metadata.len(),
        })
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.full_path)
    }
}

/// Messages sent during background file loading
#[derive(Debug)]
pub enum LoadMessage {
    Progress(f32, String),
    Complete(Arc<ParsedFile>),
    Error(IngestError),
}

/// Handles loading and assembling of log files
pub struct LogFileLoader;

impl LogFileLoader {
    /// Read and assemble a file on the calling thread
    pub fn load(desc: &FileDescriptor, log_type: LogType, tz: Option<&TzHint>) -> Result<ParsedFile> {
        Self::load_with_progress(desc, log_type, tz, |_, _| {})
    }

    fn load_with_progress<F>(
        desc: &FileDescriptor,
        log_type: LogType,
        tz: Option<&TzHint>,
        on_progress: F,
    ) -> Result<ParsedFile>
    where
        F: FnMut(u64, usize),
    {
        let start_time = Instant::now();
        tracing::debug!("Loading {} as {log_type}", desc.full_path);

        let file = File::open(&desc.full_path).map_err(|e| IngestError::io(desc.path(), e))?;
        let parsed =
            assembler::assemble_with_progress(BufReader::new(file), desc, log_type, tz, on_progress)?;

        tracing::info!(
            "Loaded {} entries from {} in {:?}",
            parsed.entries.len(),
            desc.file_name,
            start_time.elapsed()
        );
        Ok(parsed)
    }

    /// Start loading a file in the background
    /// Returns a receiver for progress updates and completion
    #[must_use]
    pub fn load_async(
        desc: FileDescriptor,
        log_type: LogType,
        tz: Option<TzHint>,
    ) -> Receiver<LoadMessage> {
        let (tx, rx) = channel();

        thread::spawn(move || {
            Self::process_file_background(&desc, log_type, tz.as_ref(), &tx);
        });

        rx
    }

    fn process_file_background(
        desc: &FileDescriptor,
        log_type: LogType,
        tz: Option<&TzHint>,
        tx: &Sender<LoadMessage>,
    ) {
        let file_size = desc.size.max(1) as f32;
        let result = Self::load_with_progress(desc, log_type, tz, |bytes_read, entries| {
            let progress = (bytes_read as f32 / file_size).min(1.0);
            let _ = tx.send(LoadMessage::Progress(
                progress,
                format!("Loading {}... ({entries} entries)", desc.file_name),
            ));
        });

        let message = match result {
            Ok(parsed) => LoadMessage::Complete(Arc::new(parsed)),
            Err(e) => {
                tracing::error!("Failed to load {}: {e}", desc.full_path);
                LoadMessage::Error(e)
            }
        };
        let _ = tx.send(message);
    }
}
