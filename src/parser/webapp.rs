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

//! Web app log lines.
//!
//! Three grammars, tried in order:
//! - `[02/22/19, 15:30:48:017] info [TAG] message` (current logger)
//! - `info: Feb-22 15:30:48.017 message` (year-less)
//! - `info: 2019/2/22 15:30:48.017 message`

use super::desktop::parse_desktop_stamp;
use super::timestamp::{self, TzHint};
use super::{LogLevel, MatchResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fancy_regex::Regex;
use std::sync::LazyLock;

static WEBAPP_BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[([\d/,:.\s]{14,26})\]\s+([A-Za-z]{1,20}):?(?:\s+(.*))?$")
        .expect("valid regex literal")
});

static WEBAPP_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+): (([A-Za-z]{3})-(\d{1,2}) (\d{1,2}):(\d{2}):(\d{2})\.(\d{1,3})) ?(.*)$")
        .expect("valid regex literal")
});

static WEBAPP_YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\w+): ((\d{4})/(\d{1,2})/(\d{1,2}) (\d{1,2}):(\d{2}):(\d{2})\.(\d{1,3})) ?(.*)$",
    )
    .expect("valid regex literal")
});

// Messages relayed through another logger repeat their own stamp
static EMBEDDED_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\w+: )?(?:[A-Za-z]{3}-\d{1,2}|\d{4}/\d{1,2}/\d{1,2}) \d{1,2}:\d{2}:\d{2}\.\d{1,3} ?")
        .expect("valid regex literal")
});

fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = abbrev.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|idx| idx as u32 + 1)
}

fn hms(caps: &fancy_regex::Captures<'_>, first: usize) -> Option<NaiveTime> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let millis = caps
        .get(first + 3)
        .map_or(0, |m| timestamp::fraction_millis(m.as_str()));
    timestamp::time_of_day(num(first)?, num(first + 1)?, num(first + 2)?, millis)
}

fn month_day_moment(
    caps: &fancy_regex::Captures<'_>,
    tz: Option<&TzHint>,
    now: NaiveDateTime,
) -> Option<i64> {
    let month = month_from_abbrev(caps.get(3)?.as_str())?;
    let day = caps.get(4)?.as_str().parse::<u32>().ok()?;
    let time = hms(caps, 5)?;
    timestamp::to_moment(timestamp::resolve_yearless(month, day, time, now)?, tz)
}

fn year_first_moment(caps: &fancy_regex::Captures<'_>, tz: Option<&TzHint>) -> Option<i64> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = caps.get(3)?.as_str().parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(4)?, num(5)?)?;
    timestamp::to_moment(date.and_time(hms(caps, 6)?), tz)
}

/// Drop a second stamp the message repeats, then split off a trailing JSON blob.
fn finish_message(result: &mut MatchResult, raw_message: &str) {
    let message = EMBEDDED_STAMP
        .find(raw_message)
        .ok()
        .flatten()
        .map_or(raw_message, |m| &raw_message[m.end()..]);

    if let Some(brace) = message.find('{') {
        result.message = message[..brace].trim_end().to_string();
        result.continuation_head = Some(message[brace..].to_string());
    } else {
        result.message = message.to_string();
    }
}

/// Match one web app log line, with an explicit "now" for year-less stamps.
#[must_use]
pub fn match_webapp_line_at(
    line: &str,
    tz: Option<&TzHint>,
    now: NaiveDateTime,
) -> Option<MatchResult> {
    if let Ok(Some(caps)) = WEBAPP_BRACKETED.captures(line) {
        let stamp = caps.get(1)?.as_str();
        let mut result = MatchResult {
            timestamp: Some(stamp.to_string()),
            moment_value: parse_desktop_stamp(stamp, tz),
            level: LogLevel::parse(caps.get(2)?.as_str()),
            ..MatchResult::default()
        };
        finish_message(&mut result, caps.get(3).map_or("", |m| m.as_str()));
        return Some(result);
    }

    if let Ok(Some(caps)) = WEBAPP_MONTH_DAY.captures(line) {
        let mut result = MatchResult {
            timestamp: Some(caps.get(2)?.as_str().to_string()),
            moment_value: month_day_moment(&caps, tz, now),
            level: LogLevel::parse(caps.get(1)?.as_str()),
            ..MatchResult::default()
        };
        finish_message(&mut result, caps.get(9).map_or("", |m| m.as_str()));
        return Some(result);
    }

    if let Ok(Some(caps)) = WEBAPP_YEAR_FIRST.captures(line) {
        let mut result = MatchResult {
            timestamp: Some(caps.get(2)?.as_str().to_string()),
            moment_value: year_first_moment(&caps, tz),
            level: LogLevel::parse(caps.get(1)?.as_str()),
            ..MatchResult::default()
        };
        finish_message(&mut result, caps.get(10).map_or("", |m| m.as_str()));
        return Some(result);
    }

    None
}

/// Match one web app log line.
#[must_use]
pub fn match_webapp_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    match_webapp_line_at(line, tz, timestamp::now_naive(tz))
}
