pub mod chromium;
pub mod classify;
pub mod console;
pub mod desktop;
pub mod installer;
pub mod mobile;
pub mod timestamp;
pub mod webapp;

pub use classify::{classify, content_style, ContentStyle, LogType, MatcherKind};
pub use timestamp::TzHint;

use crate::core::entry::Meta;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level word as written by the desktop and web app loggers.
    ///
    /// Case-insensitive. Returns `None` for words that aren't a level.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "verbose" | "silly" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "err" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of timestamp a matched line carried
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampKind {
    /// Date and time present
    #[default]
    Full,
    /// No timestamp at all, inherit the previous entry's
    Dateless,
    /// Time of day only, inherit the previous entry's date
    TimeOnly,
}

/// Partial entry extracted from a single raw line.
///
/// Fields a dialect can't determine stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub timestamp: Option<String>,
    pub moment_value: Option<i64>,
    pub level: Option<LogLevel>,
    pub message: String,
    pub meta: Option<Meta>,
    /// Text that opens this entry's meta; later continuation lines append to it
    pub continuation_head: Option<String>,
    pub timestamp_kind: TimestampKind,
}

/// A line grammar: `None` means the line doesn't start a new entry.
///
/// `now` anchors year-less stamps and is read once per file.
pub type Matcher = fn(&str, Option<&TzHint>, NaiveDateTime) -> Option<MatchResult>;

impl MatcherKind {
    /// The matching function for this grammar.
    #[must_use]
    pub fn matcher(self) -> Matcher {
        match self {
            Self::Desktop => |line, tz, _| desktop::match_desktop_line(line, tz),
            Self::WebApp => webapp::match_webapp_line_at,
            Self::Console => |line, tz, _| console::match_console_line(line, tz),
            Self::Mobile => mobile::match_mobile_line_at,
            Self::Squirrel => |line, tz, _| installer::match_squirrel_line(line, tz),
            Self::ShipIt => |line, tz, _| installer::match_shipit_line(line, tz),
            Self::Chromium => chromium::match_chromium_line_at,
        }
    }
}
