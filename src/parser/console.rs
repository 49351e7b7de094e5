//! Browser devtools console exports.
//!
//! Three shapes of line start an entry:
//! - full stamp: `Fri Feb 22 2019 15:30:48.017 message  app.js:12`
//! - source only: `app.js:12 message` (no stamp, inherits the previous one)
//! - time only: `15:30:48.017 message` (inherits the previous date)
//!
//! Stack frames (`@`, `(async)`, `Show N more frames`) never start an entry.

use super::timestamp::{self, TzHint};
use super::{LogLevel, MatchResult, TimestampKind};
use chrono::NaiveDateTime;
use fancy_regex::Regex;
use std::sync::LazyLock;

static HIDDEN_FRAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Show \d+ more frames?").expect("valid regex literal"));

static CONSOLE_FULL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:Mon|Tue|Wed|Thu|Fri|Sat|Sun) [A-Z][a-z]{2} \d{1,2} \d{4} \d{2}:\d{2}:\d{2}(?:\.\d{1,3})?(?: GMT[+-]\d{4})?(?: \([^)]*\))?)\s+(.*?)(?:\s+((?:VM\d+|[\w.\-/]+\.\w+):\d+))?\s*$",
    )
    .expect("valid regex literal")
});

static CONSOLE_SOURCE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:VM\d+|[\w.\-/]+\.\w+):\d+)\s+(.*)$").expect("valid regex literal")
});

static CONSOLE_TIME_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2}\.\d{3})\s+(.*?)(?:\s+((?:VM\d+|[\w.\-/]+\.\w+):\d+))?\s*$")
        .expect("valid regex literal")
});

static LEVEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(debug|verbose|info|warn(?:ing)?|error)\b:?\s*").expect("valid regex literal")
});

/// Whether a console line is a stack frame of the entry above it.
#[must_use]
pub fn is_stack_trace_line(line: &str) -> bool {
    line.contains('@') || line.contains("(async)") || HIDDEN_FRAMES.is_match(line).unwrap_or(false)
}

/// Parse a console stamp such as `Fri Feb 22 2019 15:30:48.017 GMT+0100 (CET)`.
///
/// An embedded GMT offset wins over the hint.
#[must_use]
pub fn parse_console_stamp(stamp: &str, tz: Option<&TzHint>) -> Option<i64> {
    let without_zone_name = stamp.split(" (").next().unwrap_or(stamp).trim();
    let (local, offset) = match without_zone_name.split_once(" GMT") {
        Some((local, offset)) => (local, TzHint::parse(offset)),
        None => (without_zone_name, None),
    };

    let naive = NaiveDateTime::parse_from_str(local, "%a %b %d %Y %H:%M:%S%.f").ok()?;
    timestamp::to_moment(naive, offset.as_ref().or(tz))
}

/// Split a leading level word off a console message.
fn split_level(message: &str) -> (Option<LogLevel>, String) {
    if let Ok(Some(caps)) = LEVEL_PREFIX.captures(message) {
        if let (Some(word), Some(whole)) = (caps.get(1), caps.get(0)) {
            return (
                LogLevel::parse(word.as_str()),
                message[whole.end()..].to_string(),
            );
        }
    }
    (None, message.to_string())
}

/// Match one console export line.
#[must_use]
pub fn match_console_line(line: &str, tz: Option<&TzHint>) -> Option<MatchResult> {
    if is_stack_trace_line(line) {
        return None;
    }

    if let Ok(Some(caps)) = CONSOLE_FULL.captures(line) {
        let stamp = caps.get(1)?.as_str();
        let (level, message) = split_level(caps.get(2).map_or("", |m| m.as_str()));
        return Some(MatchResult {
            timestamp: Some(stamp.to_string()),
            moment_value: parse_console_stamp(stamp, tz),
            level,
            message,
            continuation_head: caps.get(3).map(|m| m.as_str().to_string()),
            ..MatchResult::default()
        });
    }

    if let Ok(Some(caps)) = CONSOLE_TIME_ONLY.captures(line) {
        let (level, message) = split_level(caps.get(2).map_or("", |m| m.as_str()));
        return Some(MatchResult {
            timestamp: Some(caps.get(1)?.as_str().to_string()),
            level,
            message,
            continuation_head: caps.get(3).map(|m| m.as_str().to_string()),
            timestamp_kind: TimestampKind::TimeOnly,
            ..MatchResult::default()
        });
    }

    if let Ok(Some(caps)) = CONSOLE_SOURCE_ONLY.captures(line) {
        let (level, message) = split_level(caps.get(2).map_or("", |m| m.as_str()));
        return Some(MatchResult {
            level,
            message,
            continuation_head: caps.get(1).map(|m| m.as_str().to_string()),
            timestamp_kind: TimestampKind::Dateless,
            ..MatchResult::default()
        });
    }

    None
}
