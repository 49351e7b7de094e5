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

//! File name based dialect detection.
//!
//! Classification never opens a file. Rules are checked in a fixed order
//! because several name patterns overlap (`slack-*.json` is state, not a
//! mobile or webapp log, and `net-log-window-console*` is a console export,
//! not a net log).

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// TEAMID_USERID_<epoch micros>.txt, as written by the mobile share sheet
static MOBILE_EXPORT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{9,}_[A-Z0-9]{9,}_\d{13,}\.txt$").expect("valid regex literal")
});

const CONSOLE_NETLOG_EXCEPTION: &str = "net-log-window-console";

/// Log dialect of a file, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// Main (browser) process of the desktop app
    Browser,
    /// Renderer processes of the desktop app
    Renderer,
    /// Preload scripts of the desktop app
    Preload,
    /// Calls window of the desktop app
    Calls,
    /// Web app logs and console exports
    Webapp,
    /// Chromium net-log JSON
    Netlog,
    /// Squirrel (Windows) and ShipIt (macOS) updater logs
    Installer,
    /// iOS and Android app logs
    Mobile,
    /// Chromium's own `electron_debug` output
    Chromium,
    /// Performance traces
    Trace,
    /// Non-log side files (settings dumps, html, installation marker)
    State,
    /// A merged view across several dialects
    All,
    /// Anything else
    Unknown,
}

impl LogType {
    /// Dialects that render as one combined desktop + webapp timeline.
    pub const ALL_VIEW_MEMBERS: [Self; 5] = [
        Self::Browser,
        Self::Renderer,
        Self::Preload,
        Self::Calls,
        Self::Webapp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Renderer => "renderer",
            Self::Preload => "preload",
            Self::Calls => "calls",
            Self::Webapp => "webapp",
            Self::Netlog => "netlog",
            Self::Installer => "installer",
            Self::Mobile => "mobile",
            Self::Chromium => "chromium",
            Self::Trace => "trace",
            Self::State => "state",
            Self::All => "all",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Browser,
            Self::Renderer,
            Self::Preload,
            Self::Calls,
            Self::Webapp,
            Self::Netlog,
            Self::Installer,
            Self::Mobile,
            Self::Chromium,
            Self::Trace,
            Self::State,
            Self::All,
            Self::Unknown,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown log type: {s}"))
    }
}

/// How continuation lines of a file are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStyle {
    /// Unmatched lines are attached as meta
    Plain,
    /// Browser console export: stack frames become meta, other lines extend the message
    ConsoleLike,
}

/// Line grammar used for a file, resolved once before reading it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Desktop,
    WebApp,
    Console,
    Mobile,
    Squirrel,
    ShipIt,
    Chromium,
}

impl MatcherKind {
    /// Pick the grammar for a file of the given dialect.
    ///
    /// Returns `None` for dialects that aren't line oriented text logs.
    #[must_use]
    pub fn resolve(log_type: LogType, file_name: &str) -> Option<Self> {
        match log_type {
            LogType::Browser | LogType::Renderer | LogType::Preload | LogType::Calls => {
                Some(Self::Desktop)
            }
            LogType::Webapp => match content_style(file_name) {
                ContentStyle::ConsoleLike => Some(Self::Console),
                ContentStyle::Plain => Some(Self::WebApp),
            },
            LogType::Installer => {
                if base_name(file_name).starts_with("ShipIt") {
                    Some(Self::ShipIt)
                } else {
                    Some(Self::Squirrel)
                }
            }
            LogType::Mobile => Some(Self::Mobile),
            LogType::Chromium => Some(Self::Chromium),
            LogType::Netlog
            | LogType::Trace
            | LogType::State
            | LogType::All
            | LogType::Unknown => None,
        }
    }
}

/// Strip any directory part, accepting both separator styles.
fn base_name(file_name: &str) -> &str {
    file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name)
}

fn is_console_export(name: &str) -> bool {
    name.starts_with("app.slack")
        || name.starts_with("console-export")
        || name.contains(CONSOLE_NETLOG_EXCEPTION)
}

/// Classify a file by its name.
///
/// Total: every input maps to exactly one [`LogType`], `Unknown` by default.
#[must_use]
pub fn classify(file_name: &str) -> LogType {
    let name = base_name(file_name);

    if name.ends_with(".trace") {
        LogType::Trace
    } else if name.starts_with("browser") {
        LogType::Browser
    } else if name.starts_with("renderer") {
        LogType::Renderer
    } else if name.starts_with("preload") {
        LogType::Preload
    } else if name.starts_with("calls") {
        LogType::Calls
    } else if name.starts_with("webapp") || is_console_export(name) {
        LogType::Webapp
    } else if name.starts_with("net") && !name.contains(CONSOLE_NETLOG_EXCEPTION) {
        LogType::Netlog
    } else if name.starts_with("ShipIt") || name.contains("SquirrelSetup") {
        LogType::Installer
    } else if name.starts_with("Default_")
        || name.starts_with("attachment")
        || MOBILE_EXPORT_NAME.is_match(name).unwrap_or(false)
    {
        LogType::Mobile
    } else if name.starts_with("electron_debug") {
        LogType::Chromium
    } else if name.ends_with(".html")
        || name.ends_with(".json")
        || name == "installation"
        || name.starts_with("slack-")
    {
        LogType::State
    } else {
        LogType::Unknown
    }
}

/// Secondary classification that decides continuation routing.
#[must_use]
pub fn content_style(file_name: &str) -> ContentStyle {
    if is_console_export(base_name(file_name)) {
        ContentStyle::ConsoleLike
    } else {
        ContentStyle::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_fixture_names() {
        assert_eq!(classify("browser.log"), LogType::Browser);
        assert_eq!(classify("webapp-3.log"), LogType::Webapp);
        assert_eq!(classify("ShipIt.log"), LogType::Installer);
        assert_eq!(classify("Default_x.txt"), LogType::Mobile);
        assert_eq!(classify("electron_debug.log"), LogType::Chromium);
        assert_eq!(classify("slack-foo.json"), LogType::State);
    }

    #[test]
    fn test_desktop_processes() {
        assert_eq!(classify("renderer-12.log"), LogType::Renderer);
        assert_eq!(classify("preload.log"), LogType::Preload);
        assert_eq!(classify("calls-2.log"), LogType::Calls);
    }

    #[test]
    fn test_console_exports_are_webapp() {
        assert_eq!(classify("app.slack.com-1550000000.log"), LogType::Webapp);
        assert_eq!(classify("console-export-2019-2-22.log"), LogType::Webapp);
        assert_eq!(classify("net-log-window-console.log"), LogType::Webapp);
        assert_eq!(content_style("app.slack.com-1550000000.log"), ContentStyle::ConsoleLike);
        assert_eq!(content_style("webapp-1.log"), ContentStyle::Plain);
    }

    #[test]
    fn test_netlog() {
        assert_eq!(classify("net.log"), LogType::Netlog);
        assert_eq!(classify("netlog-2019.json"), LogType::Netlog);
    }

    #[test]
    fn test_installer_variants() {
        assert_eq!(classify("SquirrelSetup.log"), LogType::Installer);
        assert_eq!(classify("ShipIt_stderr.log"), LogType::Installer);
        assert_eq!(
            MatcherKind::resolve(LogType::Installer, "ShipIt_stderr.log"),
            Some(MatcherKind::ShipIt)
        );
        assert_eq!(
            MatcherKind::resolve(LogType::Installer, "SquirrelSetup.log"),
            Some(MatcherKind::Squirrel)
        );
    }

    #[test]
    fn test_mobile_schemes() {
        assert_eq!(classify("attachment-1.txt"), LogType::Mobile);
        assert_eq!(
            classify("T0123ABCDE_U0123ABCDE_1550000000000000.txt"),
            LogType::Mobile
        );
    }

    #[test]
    fn test_state_files() {
        assert_eq!(classify("root-state.json"), LogType::State);
        assert_eq!(classify("gpu-log.html"), LogType::State);
        assert_eq!(classify("installation"), LogType::State);
        assert_eq!(classify("slack-teams"), LogType::State);
    }

    #[test]
    fn test_priority_order() {
        // trace suffix wins over browser prefix
        assert_eq!(classify("browser.trace"), LogType::Trace);
        // webapp prefix wins over the json state suffix
        assert_eq!(classify("webapp-console.json"), LogType::Webapp);
        // mobile prefix wins over the state suffix
        assert_eq!(classify("Default_settings.json"), LogType::Mobile);
    }

    #[test]
    fn test_uses_base_name() {
        assert_eq!(classify("logs/browser.log"), LogType::Browser);
        assert_eq!(classify(r"C:\Users\me\logs\webapp-1.log"), LogType::Webapp);
        assert_eq!(classify("browser/notes.txt"), LogType::Unknown);
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(classify(""), LogType::Unknown);
        assert_eq!(classify("README.md"), LogType::Unknown);
    }

    #[test]
    fn test_matcher_resolution() {
        assert_eq!(
            MatcherKind::resolve(LogType::Webapp, "app.slack.com.log"),
            Some(MatcherKind::Console)
        );
        assert_eq!(
            MatcherKind::resolve(LogType::Webapp, "webapp-1.log"),
            Some(MatcherKind::WebApp)
        );
        assert_eq!(
            MatcherKind::resolve(LogType::Renderer, "renderer-1.log"),
            Some(MatcherKind::Desktop)
        );
        assert_eq!(MatcherKind::resolve(LogType::State, "x.json"), None);
        assert_eq!(MatcherKind::resolve(LogType::Unknown, "x"), None);
    }

    #[test]
    fn test_log_type_round_trips_through_str() {
        for t in LogType::ALL_VIEW_MEMBERS {
            assert_eq!(t.as_str().parse::<LogType>(), Ok(t));
        }
        assert!("nope".parse::<LogType>().is_err());
    }

    proptest! {
        #[test]
        fn classify_is_total(name in ".*") {
            let _ = classify(&name);
            let _ = content_style(&name);
        }
    }
}
