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

//! Date math shared by the line matchers.
//!
//! Every matcher ends up with a naive wall-clock time that has to be turned
//! into epoch milliseconds. The helpers here do that conversion under an
//! optional timezone hint and cover the quirks several dialects share:
//! year-less stamps, the hour-24 rollover and localized AM/PM markers.
//!
//! Nothing in here panics or errors; invalid dates come back as `None`.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};

/// A fixed UTC offset applied to naive timestamps instead of the local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TzHint(FixedOffset);

impl TzHint {
    /// The zero offset.
    #[must_use]
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    /// Parse `Z`, `UTC`, `GMT`, `+01:00`, `-0800` or `+05` style offsets.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("gmt")
        {
            return Some(Self::utc());
        }

        let (sign, rest) = match s.as_bytes().first()? {
            b'+' => (1, &s[1..]),
            b'-' => (-1, &s[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let (hours, minutes) = match digits.len() {
            1 | 2 => (digits.parse::<i32>().ok()?, 0),
            4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
            _ => return None,
        };
        if minutes >= 60 {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Self)
    }

    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.0
    }
}

/// Convert a naive wall-clock time to epoch milliseconds.
///
/// Uses the hint's offset when present, otherwise the local zone. Ambiguous
/// local times (DST fall-back) resolve to the earlier instant.
#[must_use]
pub fn to_moment(naive: NaiveDateTime, tz: Option<&TzHint>) -> Option<i64> {
    match tz {
        Some(hint) => hint
            .offset()
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.timestamp_millis()),
        None => naive
            .and_local_timezone(Local)
            .earliest()
            .map(|dt| dt.timestamp_millis()),
    }
}

/// Current wall-clock time in the zone the hint describes.
#[must_use]
pub fn now_naive(tz: Option<&TzHint>) -> NaiveDateTime {
    let now: DateTime<Utc> = Utc::now();
    match tz {
        Some(hint) => now.with_timezone(&hint.offset()).naive_local(),
        None => now.with_timezone(&Local).naive_local(),
    }
}

/// Place a year-less stamp in the most recent year that doesn't lie in the future.
///
/// The current year is tried first; if that yields a date after `now` (or no
/// valid date at all, e.g. Feb 29) the previous year is used.
#[must_use]
pub fn resolve_yearless(
    month: u32,
    day: u32,
    time: NaiveTime,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let at_year = |year: i32| NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time));
    at_year(now.year())
        .filter(|candidate| *candidate <= now)
        .or_else(|| at_year(now.year() - 1))
}

/// Build a time of day. Hour 24 is read as 00 of the same day.
#[must_use]
pub fn time_of_day(hour: u32, minute: u32, second: u32, millis: u32) -> Option<NaiveTime> {
    let hour = if hour == 24 { 0 } else { hour };
    NaiveTime::from_hms_milli_opt(hour, minute, second, millis)
}

/// Expand a two-digit year into the 2000s.
#[must_use]
pub const fn full_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// Read a fractional-seconds string as milliseconds.
///
/// `"5"` is 500ms, `"017123"` is 17ms. Digits past the third are dropped.
#[must_use]
pub fn fraction_millis(fraction: &str) -> u32 {
    let mut millis = 0;
    let mut digits = fraction.chars().filter(char::is_ascii_digit);
    for _ in 0..3 {
        millis = millis * 10 + digits.next().and_then(|c| c.to_digit(10)).unwrap_or(0);
    }
    millis
}

/// Convert a 12-hour clock reading to 24-hour.
#[must_use]
pub const fn to_24_hour(hour: u32, pm: bool) -> u32 {
    match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    }
}

/// Replace Japanese and Korean meridiem markers with `AM`/`PM`.
#[must_use]
pub fn normalize_meridiem(s: &str) -> String {
    s.replace("午前", "AM")
        .replace("午後", "PM")
        .replace("오전", "AM")
        .replace("오후", "PM")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .expect("valid test date")
    }

    #[test]
    fn test_parse_tz_hint() {
        assert_eq!(TzHint::parse("UTC"), Some(TzHint::utc()));
        assert_eq!(TzHint::parse("Z"), Some(TzHint::utc()));
        assert_eq!(
            TzHint::parse("+01:00").map(|h| h.offset().local_minus_utc()),
            Some(3600)
        );
        assert_eq!(
            TzHint::parse("-0830").map(|h| h.offset().local_minus_utc()),
            Some(-(8 * 3600 + 30 * 60))
        );
        assert_eq!(
            TzHint::parse("+05").map(|h| h.offset().local_minus_utc()),
            Some(5 * 3600)
        );
        assert_eq!(TzHint::parse("Europe/Berlin"), None);
        assert_eq!(TzHint::parse(""), None);
        assert_eq!(TzHint::parse("+01:75"), None);
    }

    #[test]
    fn test_to_moment_with_hint() {
        let utc = TzHint::utc();
        assert_eq!(to_moment(naive(1970, 1, 1, 0, 0, 1), Some(&utc)), Some(1000));

        let plus_one = TzHint::parse("+01:00").expect("valid offset");
        assert_eq!(to_moment(naive(1970, 1, 1, 1, 0, 0), Some(&plus_one)), Some(0));
    }

    #[test]
    fn test_resolve_yearless_keeps_current_year() {
        let now = naive(2024, 6, 15, 12, 0, 0);
        let time = NaiveTime::from_hms_opt(8, 0, 0).expect("valid time");
        let resolved = resolve_yearless(3, 1, time, now).expect("valid date");
        assert_eq!(resolved.year(), 2024);
    }

    #[test]
    fn test_resolve_yearless_rolls_back_future_dates() {
        // A December stamp read in January belongs to last year
        let now = naive(2025, 1, 2, 9, 0, 0);
        let time = NaiveTime::from_hms_opt(23, 59, 0).expect("valid time");
        let resolved = resolve_yearless(12, 31, time, now).expect("valid date");
        assert_eq!(resolved.year(), 2024);
        assert_eq!(resolved.month(), 12);
    }

    #[test]
    fn test_resolve_yearless_invalid_day() {
        let now = naive(2025, 6, 1, 0, 0, 0);
        let time = NaiveTime::from_hms_opt(0, 0, 0).expect("valid time");
        assert!(resolve_yearless(2, 30, time, now).is_none());
    }

    #[test]
    fn test_hour_24_is_midnight() {
        let t = time_of_day(24, 5, 1, 123).expect("hour 24 accepted");
        assert_eq!(t, NaiveTime::from_hms_milli_opt(0, 5, 1, 123).expect("valid time"));
        assert!(time_of_day(25, 0, 0, 0).is_none());
    }

    #[test]
    fn test_fraction_millis() {
        assert_eq!(fraction_millis("017123"), 17);
        assert_eq!(fraction_millis("5"), 500);
        assert_eq!(fraction_millis("05"), 50);
        assert_eq!(fraction_millis("393"), 393);
        assert_eq!(fraction_millis(""), 0);
    }

    #[test]
    fn test_meridiem() {
        assert_eq!(to_24_hour(12, false), 0);
        assert_eq!(to_24_hour(12, true), 12);
        assert_eq!(to_24_hour(3, true), 15);
        assert_eq!(normalize_meridiem("午後3:04:05"), "PM3:04:05");
        assert_eq!(normalize_meridiem("오전 9:00:00"), "AM 9:00:00");
    }
}
