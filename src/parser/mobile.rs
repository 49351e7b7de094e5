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

//! iOS and Android app logs.
//!
//! iOS stamps follow the device locale: `[2/22/19, 3:30:48 PM]`,
//! `[22.02.19, 15.30.48]`, `[2019/02/22 午後3:30:48]` and so on. Android
//! stamps carry no year at all: `02-22 15:30:48.017`.

use super::timestamp::{self, TzHint};
use super::{LogLevel, MatchResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fancy_regex::Regex;
use std::sync::LazyLock;

static IOS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\[(\d{1,4}[./\-]\s?\d{1,2}[./\-]\s?\d{1,4})\.?,?\s+([^\]]{5,24})\]\s*(?:-\s*)?(?:\[([A-Za-z]+)\]\s*)?(.*)$",
    )
    .expect("valid regex literal")
});

static MOBILE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(AM|PM)?\s*(\d{1,2})[:.](\d{2})[:.](\d{2})(?:[.,](\d{1,3}))?\s*(?i:(AM|PM))?$")
        .expect("valid regex literal")
});

static ANDROID_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((\d{1,2})-(\d{1,2})\s+(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d{1,3}))?)\s+(.*)$")
        .expect("valid regex literal")
});

static ANDROID_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[?(VERBOSE|DEBUG|INFO|WARN(?:ING)?|ERR(?:OR)?|FATAL)\]?:?\s+(.*)$")
        .expect("valid regex literal")
});

/// Map a severity marker. `WARN` and `DEBUG` are only honored on Android.
fn severity(marker: &str, android: bool) -> LogLevel {
    if marker.contains("ERR") {
        LogLevel::Error
    } else if android && marker.contains("WARN") {
        LogLevel::Warn
    } else if android && marker.contains("DEBUG") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Parse a locale dependent date.
///
/// Dot separated dates are read day first, others month first; if that
/// doesn't give a valid date the two components are swapped.
fn parse_mobile_date(date: &str) -> Option<NaiveDate> {
    let is_separator = |c: char| matches!(c, '.' | '/' | '-');
    let separator = date.chars().find(|c| is_separator(*c))?;
    let parts: Vec<&str> = date
        .split(is_separator)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };

    if a.len() == 4 {
        return NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);
    }

    let year = timestamp::full_year(c.parse().ok()?);
    let first = a.parse::<u32>().ok()?;
    let second = b.parse::<u32>().ok()?;
    let (month, day) = if separator == '.' {
        (second, first)
    } else {
        (first, second)
    };
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| NaiveDate::from_ymd_opt(year, day, month))
}

/// Parse a locale dependent time of day, 12 or 24 hour.
fn parse_mobile_time(time: &str) -> Option<NaiveTime> {
    let normalized = timestamp::normalize_meridiem(time.trim());
    let caps = MOBILE_TIME.captures(&normalized).ok()??;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let hour = num(2)?;
    let hour = match caps.get(1).or_else(|| caps.get(6)) {
        Some(marker) => timestamp::to_24_hour(hour, marker.as_str().eq_ignore_ascii_case("pm")),
        None => hour,
    };
    let millis = caps
        .get(5)
        .map_or(0, |m| timestamp::fraction_millis(m.as_str()));
    timestamp::time_of_day(hour, num(3)?, num(4)?, millis)
}

fn match_ios_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    let caps = IOS_LINE.captures(line).ok()??;
    let date = caps.get(1)?.as_str();
    let time = caps.get(2)?.as_str();

    let moment_value = parse_mobile_date(date)
        .zip(parse_mobile_time(time))
        .and_then(|(d, t)| timestamp::to_moment(d.and_time(t), tz));

    Some(MatchResult {
        timestamp: Some(format!("{date}, {}", time.trim())),
        moment_value,
        level: Some(caps.get(3).map_or(LogLevel::Info, |m| severity(m.as_str(), false))),
        message: caps.get(4).map_or_else(String::new, |m| m.as_str().to_string()),
        ..MatchResult::default()
    })
}

fn android_moment(
    caps: &fancy_regex::Captures<'_>,
    tz: Option<&TzHint>,
    now: NaiveDateTime,
) -> Option<i64> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let millis = caps
        .get(7)
        .map_or(0, |m| timestamp::fraction_millis(m.as_str()));
    let time = timestamp::time_of_day(num(4)?, num(5)?, num(6)?, millis)?;
    let naive = timestamp::resolve_yearless(num(2)?, num(3)?, time, now)?;
    timestamp::to_moment(naive, tz)
}

fn match_android_line(line: &str, tz: Option<&TzHint>, now: NaiveDateTime) -> Option<MatchResult> {
    let caps = ANDROID_LINE.captures(line).ok()??;
    let moment_value = android_moment(&caps, tz, now);

    let rest = caps.get(8).map_or("", |m| m.as_str());
    let (level, message) = ANDROID_LEVEL.captures(rest).ok().flatten().map_or(
        (LogLevel::Info, rest),
        |level_caps| {
            (
                level_caps
                    .get(1)
                    .map_or(LogLevel::Info, |m| severity(m.as_str(), true)),
                level_caps.get(2).map_or("", |m| m.as_str()),
            )
        },
    );

    Some(MatchResult {
        timestamp: Some(caps.get(1)?.as_str().to_string()),
        moment_value,
        level: Some(level),
        message: message.to_string(),
        ..MatchResult::default()
    })
}

/// Match one mobile log line, with an explicit "now" for Android's year-less stamps.
#[must_use]
pub fn match_mobile_line_at(
    line: &str,
    tz: Option<&TzHint>,
    now: NaiveDateTime,
) -> Option<MatchResult> {
    match_ios_line(line, tz).or_else(|| match_android_line(line, tz, now))
}

/// Match one mobile log line.
#[must_use]
pub fn match_mobile_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    match_mobile_line_at(line, tz, timestamp::now_naive(tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date")
    }

    fn matched(line: &str) -> MatchResult {
        match_mobile_line_at(line, Some(&TzHint::utc()), now()).expect("should match")
    }

    const FEB_22_1530: i64 = 1_550_849_448_000;

    #[test]
    fn test_ios_us_locale() {
        let m = matched("[2/22/19, 3:30:48 PM] -[ERR] Failed to load channel");
        assert_eq!(m.moment_value, Some(FEB_22_1530));
        assert_eq!(m.level, Some(LogLevel::Error));
        assert_eq!(m.message, "Failed to load channel");
        assert_eq!(m.timestamp.as_deref(), Some("2/22/19, 3:30:48 PM"));
    }

    #[test]
    fn test_ios_dotted_european_locale() {
        let m = matched("[22.02.19, 15.30.48] Connected");
        assert_eq!(m.moment_value, Some(FEB_22_1530));
        assert_eq!(m.level, Some(LogLevel::Info));
        assert_eq!(m.message, "Connected");
    }

    #[test]
    fn test_ios_swaps_day_and_month_on_failure() {
        // 22 can't be a month, so the slash date is retried day first
        let m = matched("[22/02/2019, 15:30:48] Connected");
        assert_eq!(m.moment_value, Some(FEB_22_1530));
    }

    #[test]
    fn test_ios_japanese_meridiem() {
        let m = matched("[2019/02/22 午後3:30:48] 接続しました");
        assert_eq!(m.moment_value, Some(FEB_22_1530));
        assert_eq!(m.message, "接続しました");
    }

    #[test]
    fn test_ios_korean_meridiem() {
        let m = matched("[2019. 2. 22. 오후 3:30:48] [WARN] 연결됨");
        assert_eq!(m.moment_value, Some(FEB_22_1530));
        // WARN is only honored for Android
        assert_eq!(m.level, Some(LogLevel::Info));
    }

    #[test]
    fn test_ios_twelve_am() {
        let m = matched("[2/22/19, 12:00:00 AM] midnight");
        assert_eq!(m.moment_value, Some(1_550_793_600_000));
    }

    #[test]
    fn test_android_yearless() {
        let m = matched("02-22 15:30:48.017 WARN Reconnecting");
        assert_eq!(m.moment_value, Some(FEB_22_1530 + 17));
        assert_eq!(m.level, Some(LogLevel::Warn));
        assert_eq!(m.message, "Reconnecting");
        assert_eq!(m.timestamp.as_deref(), Some("02-22 15:30:48.017"));
    }

    #[test]
    fn test_android_rolls_back_future_date() {
        // December seen in March 2019 is December 2018
        let m = matched("12-30 08:00:00.000 [DEBUG] Old entry");
        let expected = NaiveDate::from_ymd_opt(2018, 12, 30)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis());
        assert_eq!(m.moment_value, expected);
        assert_eq!(m.level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_android_without_level() {
        let m = matched("02-22 15:30:48.017 Starting activity");
        assert_eq!(m.level, Some(LogLevel::Info));
        assert_eq!(m.message, "Starting activity");
    }

    #[test]
    fn test_android_error() {
        let m = matched("02-22 15:30:48.017 ERROR: crash");
        assert_eq!(m.level, Some(LogLevel::Error));
        assert_eq!(m.message, "crash");
    }

    #[test]
    fn test_unparseable_date_keeps_entry() {
        let m = matched("[99/99/19, 3:30:48 PM] odd");
        assert_eq!(m.moment_value, None);
        assert_eq!(m.message, "odd");
    }

    #[test]
    fn test_wrapped_line_is_not_an_entry() {
        assert!(match_mobile_line_at("which continues here", None, now()).is_none());
    }
}
