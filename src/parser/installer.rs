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

//! Updater logs: Squirrel on Windows, ShipIt on macOS.

use super::timestamp::{self, TzHint};
use super::MatchResult;
use chrono::NaiveDateTime;
use fancy_regex::Regex;
use std::sync::LazyLock;

// 2019-02-22 15:30:48> Program: Starting Squirrel Updater
static SQUIRREL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})>\s?(.*)$").expect("valid regex literal")
});

static STACK_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+at\b").expect("valid regex literal"));

// 2019-02-22 15:30:48.017 ShipIt[479:5003] Beginning installation
static SHIPIT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3})\s+(.*)$")
        .expect("valid regex literal")
});

fn moment(stamp: &str, format: &str, tz: Option<&TzHint>) -> Option<i64> {
    NaiveDateTime::parse_from_str(stamp, format)
        .ok()
        .and_then(|naive| timestamp::to_moment(naive, tz))
}

/// Match one Squirrel log line. Indented `at ...` frames continue the previous entry.
#[must_use]
pub fn match_squirrel_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    if STACK_FRAME.is_match(line).unwrap_or(false) {
        return None;
    }

    let caps = SQUIRREL_LINE.captures(line).ok()??;
    let stamp = caps.get(1)?.as_str();
    Some(MatchResult {
        timestamp: Some(stamp.to_string()),
        moment_value: moment(stamp, "%Y-%m-%d %H:%M:%S", tz),
        message: caps.get(2).map_or_else(String::new, |m| m.as_str().to_string()),
        ..MatchResult::default()
    })
}

/// Match one ShipIt log line.
///
/// Everything after the first `, ` of the message opens the entry's meta.
#[must_use]
pub fn match_shipit_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    let caps = SHIPIT_LINE.captures(line).ok()??;
    let stamp = caps.get(1)?.as_str();
    let message = caps.get(2).map_or("", |m| m.as_str());

    let (message, continuation_head) = match message.split_once(", ") {
        Some((head, rest)) => (head, Some(rest.to_string())),
        None => (message, None),
    };

    Some(MatchResult {
        timestamp: Some(stamp.to_string()),
        moment_value: moment(stamp, "%Y-%m-%d %H:%M:%S%.3f", tz),
        message: message.to_string(),
        continuation_head,
        ..MatchResult::default()
    })
}
