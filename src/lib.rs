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

//! Ingestion of desktop application log bundles.
//!
//! Files are classified by name into dialects ([`parser::classify`]), read
//! line by line into structured entries ([`core::assembler`]) and merged into
//! time ordered streams ([`core::merge`]). [`core::ingest`] runs the whole
//! pipeline over a bundle.

pub mod config;
pub mod core;
pub mod error;
pub mod parser;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
