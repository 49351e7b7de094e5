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

//! Turns the raw lines of one file into structured entries.
//!
//! A line either starts a new entry (its dialect's matcher accepts it) or
//! continues the entry above it. Continuations go to the entry's meta or
//! message depending on the dialect and [`ContentStyle`]. Entries are
//! finalized when the next one starts: dateless stamps are backfilled from
//! the previous entry and consecutive duplicates are folded into it.

use crate::core::entry::{LevelCounts, LogEntry, Meta, ParsedFile, NO_TIMESTAMP};
use crate::core::log_file::FileDescriptor;
use crate::error::{IngestError, Result};
use crate::parser::console::{is_stack_trace_line, parse_console_stamp};
use crate::parser::timestamp;
use crate::parser::{
    content_style, ContentStyle, LogType, MatchResult, Matcher, MatcherKind, TimestampKind, TzHint,
};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::io::BufRead;
use std::sync::Arc;

/// Length of `Fri Feb 22 2019 `, the date part of a console stamp.
const CONSOLE_DATE_PREFIX: usize = 16;

/// How often, in lines, progress is reported.
const PROGRESS_INTERVAL: usize = 500;

/// The entry being built, with the stamp shape its matcher reported.
struct Pending {
    entry: LogEntry,
    kind: TimestampKind,
}

/// Per-file assembly state machine.
pub struct Assembler<'a> {
    matcher: Matcher,
    kind: MatcherKind,
    style: ContentStyle,
    log_type: LogType,
    tz: Option<&'a TzHint>,
    /// Anchor for year-less stamps, fixed when the file is opened
    now: NaiveDateTime,
    source_file: Arc<str>,
    current: Option<Pending>,
    pending_meta: Option<String>,
    entries: Vec<LogEntry>,
    lines: usize,
    level_counts: LevelCounts,
    repeated_counts: IndexMap<String, usize>,
}

impl<'a> Assembler<'a> {
    /// Set up assembly of `desc`. Fails for dialects without a line grammar.
    pub fn new(desc: &FileDescriptor, log_type: LogType, tz: Option<&'a TzHint>) -> Result<Self> {
        Self::with_now(desc, log_type, tz, timestamp::now_naive(tz))
    }

    /// Like [`Assembler::new`], resolving year-less stamps against `now`.
    pub fn with_now(
        desc: &FileDescriptor,
        log_type: LogType,
        tz: Option<&'a TzHint>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let kind = MatcherKind::resolve(log_type, &desc.file_name).ok_or_else(|| {
            IngestError::NotALogFile {
                file_name: desc.file_name.clone(),
                log_type,
            }
        })?;

        Ok(Self {
            matcher: kind.matcher(),
            kind,
            style: content_style(&desc.file_name),
            log_type,
            tz,
            now,
            source_file: Arc::from(desc.full_path.as_str()),
            current: None,
            pending_meta: None,
            entries: Vec::new(),
            lines: 0,
            level_counts: LevelCounts::default(),
            repeated_counts: IndexMap::new(),
        })
    }

    /// Feed one raw line, without its line terminator.
    pub fn push_line(&mut self, line: &str) {
        self.lines += 1;
        if line.trim().is_empty() {
            return;
        }

        match (self.matcher)(line, self.tz, self.now) {
            Some(matched) => self.start_entry(matched),
            None => self.continue_entry(line),
        }
    }

    fn start_entry(&mut self, matched: MatchResult) {
        let orphan = self.current.is_none().then(|| self.pending_meta.take()).flatten();
        self.flush_current();

        self.pending_meta = match (orphan, matched.continuation_head) {
            (Some(orphan), Some(head)) => Some(format!("{orphan}\n{head}")),
            (orphan, head) => orphan.or(head),
        };

        self.current = Some(Pending {
            entry: LogEntry {
                index: 0,
                line: self.lines,
                timestamp: matched.timestamp.unwrap_or_else(|| NO_TIMESTAMP.to_string()),
                moment_value: matched.moment_value,
                level: matched.level,
                message: matched.message,
                meta: matched.meta,
                log_type: self.log_type,
                source_file: Arc::clone(&self.source_file),
                repeated: Vec::new(),
            },
            kind: matched.timestamp_kind,
        });
    }

    fn continue_entry(&mut self, line: &str) {
        let to_message = match self.kind {
            MatcherKind::Mobile => true,
            MatcherKind::Desktop
            | MatcherKind::WebApp
            | MatcherKind::Console
            | MatcherKind::Squirrel
            | MatcherKind::ShipIt
            | MatcherKind::Chromium => {
                self.style == ContentStyle::ConsoleLike && !is_stack_trace_line(line)
            }
        };

        if to_message {
            if let Some(current) = self.current.as_mut() {
                current.entry.message.push('\n');
                current.entry.message.push_str(line);
                return;
            }
        }

        if let Some(meta) = self.pending_meta.as_mut() {
            meta.push('\n');
            meta.push_str(line);
        } else {
            self.pending_meta = Some(line.to_string());
        }
    }

    /// Attach pending meta to the current entry and finalize it.
    fn flush_current(&mut self) {
        let Some(mut current) = self.current.take() else {
            return;
        };
        if let Some(text) = self.pending_meta.take() {
            Meta::attach(&mut current.entry.meta, text);
        }
        self.finalize(current);
    }

    fn finalize(&mut self, pending: Pending) {
        let Pending { mut entry, kind } = pending;

        if let Some(previous) = self.entries.last() {
            backfill(&mut entry, kind, previous, self.tz);
        }

        if let Some(previous) = self.entries.last_mut() {
            if previous.is_repeat_of(&entry) {
                previous.repeated.push(entry.timestamp);
                *self.repeated_counts.entry(entry.message).or_insert(0) += 1;
                return;
            }
        }

        entry.index = self.entries.len();
        if let Some(level) = entry.level {
            self.level_counts.add(level);
        }
        self.entries.push(entry);
    }

    /// Entries finalized so far.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Flush the last entry and produce the parsed file.
    #[must_use]
    pub fn finish(mut self, desc: &FileDescriptor) -> ParsedFile {
        self.flush_current();

        ParsedFile {
            id: desc.full_path.clone(),
            file_name: desc.file_name.clone(),
            full_path: desc.full_path.clone(),
            size: desc.size,
            log_type: self.log_type,
            entries: Arc::new(self.entries),
            lines: self.lines,
            level_counts: self.level_counts,
            repeated_counts: self.repeated_counts,
        }
    }
}

/// Fill in a stamp the dialect left out, from the entry before it.
fn backfill(entry: &mut LogEntry, kind: TimestampKind, previous: &LogEntry, tz: Option<&TzHint>) {
    if previous.timestamp == NO_TIMESTAMP {
        return;
    }

    match kind {
        TimestampKind::Full => {}
        TimestampKind::Dateless => {
            entry.timestamp.clone_from(&previous.timestamp);
            entry.moment_value = previous.moment_value;
        }
        TimestampKind::TimeOnly => match previous.timestamp.get(..CONSOLE_DATE_PREFIX) {
            Some(date) => {
                entry.timestamp = format!("{date}{}", entry.timestamp);
                entry.moment_value = parse_console_stamp(&entry.timestamp, tz);
            }
            None => entry.moment_value = previous.moment_value,
        },
    }
}

/// Assemble a whole file from `reader`.
pub fn assemble<R: BufRead>(
    reader: R,
    desc: &FileDescriptor,
    log_type: LogType,
    tz: Option<&TzHint>,
) -> Result<ParsedFile> {
    assemble_with_progress(reader, desc, log_type, tz, |_, _| {})
}

/// Assemble a whole file, reporting `(bytes read, entries so far)` every few hundred lines.
///
/// Invalid UTF-8 is replaced, not rejected. An I/O error fails the whole file.
pub fn assemble_with_progress<R, F>(
    mut reader: R,
    desc: &FileDescriptor,
    log_type: LogType,
    tz: Option<&TzHint>,
    mut on_progress: F,
) -> Result<ParsedFile>
where
    R: BufRead,
    F: FnMut(u64, usize),
{
    profiling::scope!("assemble");
    let mut assembler = Assembler::new(desc, log_type, tz)?;

    let mut buffer = Vec::new();
    let mut bytes_read: u64 = 0;
    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| IngestError::io(&desc.full_path, e))?;
        if read == 0 {
            break;
        }
        bytes_read += read as u64;

        let line = String::from_utf8_lossy(&buffer);
        assembler.push_line(line.trim_end_matches(['\n', '\r']));

        if assembler.lines % PROGRESS_INTERVAL == 0 {
            on_progress(bytes_read, assembler.entry_count());
        }
    }

    let parsed = assembler.finish(desc);
    tracing::debug!(
        "Assembled {} entries from {} lines of {}",
        parsed.entries.len(),
        parsed.lines,
        parsed.file_name
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::SourceMeta;
    use crate::parser::LogLevel;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn desc(name: &str) -> FileDescriptor {
        FileDescriptor {
            file_name: name.to_string(),
            full_path: format!("/logs/{name}"),
            size: 0,
        }
    }

    fn assemble_str(name: &str, content: &str) -> ParsedFile {
        let utc = TzHint::utc();
        assemble(
            Cursor::new(content.as_bytes()),
            &desc(name),
            crate::parser::classify(name),
            Some(&utc),
        )
        .expect("assembles")
    }

    #[test]
    fn test_continuations_become_meta() {
        let parsed = assemble_str(
            "browser.log",
            "[02/22/19, 15:30:48:017] info: Settings\n{ isDevMode: true,\n  channel: 'prod' }\n[02/22/19, 15:30:49:000] warn: Next\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(
            parsed.entries[0].meta,
            Some(Meta::Text("{ isDevMode: true,\n  channel: 'prod' }".to_string()))
        );
        assert_eq!(parsed.entries[0].message, "Settings");
        assert_eq!(parsed.entries[1].meta, None);
        assert_eq!(parsed.entries[1].line, 4);
        assert_eq!(parsed.lines, 4);
    }

    #[test]
    fn test_dedup_collapses_repeats() {
        let parsed = assemble_str(
            "browser.log",
            "[02/22/19, 15:30:48:017] info: Start\n[02/22/19, 15:30:49:000] info: Ping\n[02/22/19, 15:30:50:000] info: Ping\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].repeated, vec!["02/22/19, 15:30:50:000"]);
        assert_eq!(parsed.entries[1].index, 1);
        assert_eq!(parsed.repeated_counts.get("Ping"), Some(&1));
        assert_eq!(parsed.level_counts.info, 2);
    }

    #[test]
    fn test_repeat_with_different_meta_is_kept() {
        let parsed = assemble_str(
            "browser.log",
            "[02/22/19, 15:30:49:000] info: Ping\n{a: 1}\n[02/22/19, 15:30:50:000] info: Ping\n{a: 2}\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert!(parsed.repeated_counts.is_empty());
    }

    #[test]
    fn test_blank_lines_counted_not_parsed() {
        let parsed = assemble_str(
            "browser.log",
            "\n[02/22/19, 15:30:48:017] info: One\n   \n\r\n[02/22/19, 15:30:49:000] info: Two\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].meta, None);
        assert_eq!(parsed.lines, 5);
    }

    #[test]
    fn test_dateless_backfill() {
        let parsed = assemble_str(
            "console-export-2019.log",
            "Fri Feb 22 2019 15:30:48.017 info: Booted\nVM12:1 Uncaught TypeError\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].timestamp, parsed.entries[0].timestamp);
        assert_eq!(parsed.entries[1].moment_value, Some(1_550_849_448_017));
    }

    #[test]
    fn test_time_only_backfill_takes_date() {
        let parsed = assemble_str(
            "console-export-2019.log",
            "Fri Feb 22 2019 15:30:48.017 info: Booted\n15:30:49.100 warn: slow frame\n",
        );
        assert_eq!(parsed.entries[1].timestamp, "Fri Feb 22 2019 15:30:49.100");
        assert_eq!(parsed.entries[1].moment_value, Some(1_550_849_449_100));
        assert_eq!(parsed.entries[1].level, Some(LogLevel::Warn));
    }

    #[test]
    fn test_dateless_first_entry_keeps_sentinel() {
        let parsed = assemble_str("console-export-2019.log", "VM12:1 Uncaught TypeError\n");
        assert_eq!(parsed.entries[0].timestamp, NO_TIMESTAMP);
        assert_eq!(parsed.entries[0].moment_value, None);
    }

    #[test]
    fn test_console_routing() {
        let parsed = assemble_str(
            "console-export-2019.log",
            "Fri Feb 22 2019 15:30:48.017 error: Boom   main.js:12\nwrapped message text\ndispatch@main.js:1:2\n(async) setTimeout\n",
        );
        assert_eq!(parsed.entries.len(), 1);
        let entry = &parsed.entries[0];
        assert_eq!(entry.message, "Boom\nwrapped message text");
        assert_eq!(
            entry.meta.as_ref().and_then(Meta::text),
            Some("main.js:12\ndispatch@main.js:1:2\n(async) setTimeout")
        );
    }

    #[test]
    fn test_mobile_wraps_into_message() {
        let parsed = assemble_str(
            "Default_2019.txt",
            "[2/22/19, 3:30:48 PM] Request failed\nwith status 500\n[2/22/19, 3:30:49 PM] Retry\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].message, "Request failed\nwith status 500");
        assert_eq!(parsed.entries[0].meta, None);
    }

    #[test]
    fn test_orphan_lines_attach_to_first_entry() {
        let parsed = assemble_str(
            "browser.log",
            "tail of a rotated record\n[02/22/19, 15:30:48:017] info: First\n",
        );
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(
            parsed.entries[0].meta,
            Some(Meta::Text("tail of a rotated record".to_string()))
        );
    }

    #[test]
    fn test_chromium_detail_keeps_source_meta() {
        let parsed = assemble_str(
            "electron_debug.log",
            "[4711:0222/153048.017:ERROR:gpu_init.cc(9)] GPU failed\n  extra detail\n",
        );
        assert_eq!(parsed.entries[0].meta.as_ref().and_then(Meta::text), Some("  extra detail"));
        assert!(matches!(
            &parsed.entries[0].meta,
            Some(Meta::Source(SourceMeta { pid: 4711, .. }))
        ));
    }

    #[test]
    fn test_yearless_stamps_use_file_clock() {
        let utc = TzHint::utc();
        let now = chrono::NaiveDate::from_ymd_opt(2019, 2, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        let desc = desc("electron_debug.log");
        let mut assembler = Assembler::with_now(&desc, LogType::Chromium, Some(&utc), now)
            .expect("chromium has a grammar");
        assembler.push_line("[1:1231/235959.000:INFO:a.cc(1)] late december");
        assembler.push_line("[1:0131/120000.000:INFO:a.cc(2)] end of january");
        let parsed = assembler.finish(&desc);

        let moment = |y, m, d, h, min, s| {
            chrono::NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, min, s))
                .map(|dt| dt.and_utc().timestamp_millis())
        };
        assert_eq!(parsed.entries[0].moment_value, moment(2018, 12, 31, 23, 59, 59));
        assert_eq!(parsed.entries[1].moment_value, moment(2019, 1, 31, 12, 0, 0));
    }

    #[test]
    fn test_shipit_suffix_becomes_meta() {
        let parsed = assemble_str(
            "ShipIt_stderr.log",
            "2019-02-22 15:30:48.017 ShipIt[1:2] Install failed, code 4\nmore\n",
        );
        assert_eq!(parsed.entries[0].message, "ShipIt[1:2] Install failed");
        assert_eq!(
            parsed.entries[0].meta.as_ref().and_then(Meta::text),
            Some("code 4\nmore")
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut bytes = b"[02/22/19, 15:30:48:017] info: caf".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.push(b'\n');
        let parsed = assemble(Cursor::new(bytes), &desc("browser.log"), LogType::Browser, None)
            .expect("assembles");
        assert!(parsed.entries[0].message.starts_with("caf"));
        assert!(parsed.entries[0].message.contains('\u{fffd}'));
    }

    #[test]
    fn test_not_a_log_file() {
        let result = assemble(Cursor::new(b"{}"), &desc("net.json"), LogType::Netlog, None);
        assert!(matches!(result, Err(IngestError::NotALogFile { .. })));
    }

    #[test]
    fn test_progress_reported() {
        let content = "[02/22/19, 15:30:48:017] info: line\n".repeat(1200);
        let mut calls = Vec::new();
        let parsed = assemble_with_progress(
            Cursor::new(content.as_bytes()),
            &desc("browser.log"),
            LogType::Browser,
            None,
            |bytes, _| calls.push(bytes),
        )
        .expect("assembles");
        assert_eq!(calls.len(), 2);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.repeated_counts.get("line"), Some(&1199));
    }

    proptest! {
        #[test]
        fn entries_plus_repeats_equal_matched_lines(
            messages in proptest::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..40)
        ) {
            let content: String = messages
                .iter()
                .enumerate()
                .map(|(i, m)| format!("[02/22/19, 15:{:02}:{:02}:000] info: {m}\n", i / 60, i % 60))
                .collect();
            let parsed = assemble_str("browser.log", &content);
            prop_assert_eq!(parsed.matched_lines(), messages.len());
            prop_assert_eq!(parsed.level_counts.total(), parsed.entries.len());
            for (i, entry) in parsed.entries.iter().enumerate() {
                prop_assert_eq!(entry.index, i);
            }
            let repeated: usize = parsed.entries.iter().map(|e| e.repeated.len()).sum();
            prop_assert_eq!(repeated + parsed.entries.len(), messages.len());
        }
    }
}
