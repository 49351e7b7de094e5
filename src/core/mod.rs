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

pub mod assembler;
pub mod entry;
pub mod ingest;
pub mod log_file;
pub mod merge;
pub mod merge_worker;
pub mod meta;
pub mod source;

pub use assembler::{assemble, Assembler};
pub use entry::{LevelCounts, LogEntry, Meta, ParsedFile, SourceMeta};
pub use ingest::{ingest, ingest_async, FileFailure, IngestReport};
pub use log_file::{FileDescriptor, LoadMessage, LogFileLoader};
pub use merge::{merge, merge_async, MergeInput, MergedStream};
pub use merge_worker::{MergeCache, MergeKey, MergeWorker, MergeWorkerHandle};
pub use source::{LogSource, RawFile, StateFile};
