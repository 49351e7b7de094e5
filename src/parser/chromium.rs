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

//! Chromium's own logging, as found in `electron_debug.log`.
//!
//! `[pid:MMDD/HHmmss.ffffff:LEVEL:file.cc(line)] message`, optionally with a
//! thread id after the pid. The stamp has no year.

use super::timestamp::{self, TzHint};
use super::{LogLevel, MatchResult};
use crate::core::entry::{Meta, SourceMeta};
use chrono::NaiveDateTime;
use fancy_regex::Regex;
use std::sync::LazyLock;

static CHROMIUM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(\d+):(?:\d+:)?((\d{2})(\d{2})/(\d{2})(\d{2})(\d{2})\.(\d{1,6})):([A-Z0-9_]+):([^()\]]+)\((\d+)\)\]\s?(.*)$",
    )
    .expect("valid regex literal")
});

fn chromium_level(level: &str) -> Option<LogLevel> {
    match level {
        "INFO" => Some(LogLevel::Info),
        "WARNING" => Some(LogLevel::Warn),
        "ERROR" | "FATAL" => Some(LogLevel::Error),
        l if l.starts_with("VERBOSE") => Some(LogLevel::Debug),
        _ => None,
    }
}

fn chromium_moment(
    caps: &fancy_regex::Captures<'_>,
    tz: Option<&TzHint>,
    now: NaiveDateTime,
) -> Option<i64> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let millis = caps
        .get(8)
        .map_or(0, |m| timestamp::fraction_millis(m.as_str()));
    let time = timestamp::time_of_day(num(5)?, num(6)?, num(7)?, millis)?;
    let naive = timestamp::resolve_yearless(num(3)?, num(4)?, time, now)?;
    timestamp::to_moment(naive, tz)
}

/// Match one Chromium log line, with an explicit "now" for the year-less stamp.
#[must_use]
pub fn match_chromium_line_at(
    line: &str,
    tz: Option<&TzHint>,
    now: NaiveDateTime,
) -> Option<MatchResult> {
    let caps = CHROMIUM_LINE.captures(line).ok()??;
    let pid = caps.get(1)?.as_str().parse::<u32>().ok()?;

    Some(MatchResult {
        timestamp: Some(caps.get(2)?.as_str().to_string()),
        moment_value: chromium_moment(&caps, tz, now),
        level: chromium_level(caps.get(9)?.as_str()),
        message: caps.get(12).map_or_else(String::new, |m| m.as_str().to_string()),
        meta: Some(Meta::Source(SourceMeta {
            source_file: format!("{}({})", caps.get(10)?.as_str(), caps.get(11)?.as_str()),
            pid,
            detail: None,
        })),
        ..MatchResult::default()
    })
}

/// Match one Chromium log line.
#[must_use]
pub fn match_chromium_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    match_chromium_line_at(line, tz, timestamp::now_naive(tz))
}
