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

//! Desktop (Electron main, renderer, preload, calls) log lines.
//!
//! Format: `[02/22/19, 15:30:48:017] info: message`

use super::timestamp::{self, TzHint};
use super::{LogLevel, MatchResult};
use chrono::NaiveDate;
use fancy_regex::Regex;
use std::sync::LazyLock;

static DESKTOP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[([\d/,:.\s]{14,26})\]\s+(.*)$").expect("valid regex literal")
});

static LEVEL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{1,20}):\s?(.*)$").expect("valid regex literal"));

// MM/DD/YY(YY), HH:mm:ss(:SSS)
static DESKTOP_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4}),\s+(\d{1,2}):(\d{2}):(\d{2})(?:[:.](\d{1,3}))?$")
        .expect("valid regex literal")
});

/// Convert a bracketed desktop stamp to epoch milliseconds.
///
/// Hour `24` is a known logger quirk and is read as `00`.
#[must_use]
pub fn parse_desktop_stamp(stamp: &str, tz: Option<&TzHint>) -> Option<i64> {
    let caps = DESKTOP_STAMP.captures(stamp.trim()).ok()??;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = timestamp::full_year(caps.get(3)?.as_str().parse::<i32>().ok()?);
    let date = NaiveDate::from_ymd_opt(year, num(1)?, num(2)?)?;
    let millis = caps
        .get(7)
        .map_or(0, |m| timestamp::fraction_millis(m.as_str()));
    let time = timestamp::time_of_day(num(4)?, num(5)?, num(6)?, millis)?;
    timestamp::to_moment(date.and_time(time), tz)
}

/// Match one desktop log line.
#[must_use]
pub fn match_desktop_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    // A line opening with `{` is a dumped object belonging to the previous entry
    if line.trim_start().starts_with('{') {
        return None;
    }

    let caps = DESKTOP_LINE.captures(line).ok()??;
    let stamp = caps.get(1)?.as_str();
    let (level, message) = split_level(caps.get(2).map_or("", |m| m.as_str()));

    Some(MatchResult {
        timestamp: Some(stamp.to_string()),
        moment_value: parse_desktop_stamp(stamp, tz),
        level,
        message: message.to_string(),
        ..MatchResult::default()
    })
}

/// Split `info: message` into level and message. A word that isn't a level
/// stays part of the message.
fn split_level(rest: &str) -> (Option<LogLevel>, &str) {
    LEVEL_WORD
        .captures(rest)
        .ok()
        .flatten()
        .and_then(|caps| {
            let level = LogLevel::parse(caps.get(1)?.as_str())?;
            Some((Some(level), caps.get(2).map_or("", |m| m.as_str())))
        })
        .unwrap_or((None, rest))
}
