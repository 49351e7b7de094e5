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

//! Reading of the JSON-ish blobs found in entry meta.
//!
//! Loggers dump objects with `util.inspect`-style syntax: bare keys, single
//! quoted strings, `undefined` and trailing commas. These are normalized to
//! strict JSON before handing them to `serde_json`.

use serde_json::Value;

/// Parse strict JSON, or the loose object syntax loggers print.
#[must_use]
pub fn parse_loose_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    serde_json::from_str(&normalize(text)).ok()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Rewrite loose object syntax to JSON, leaving string contents alone.
fn normalize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            ',' => {
                // drop trailing commas before a closing bracket
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let is_key = chars[i..]
                    .iter()
                    .find(|c| !c.is_whitespace())
                    .is_some_and(|c| *c == ':');
                if is_key {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else if word == "undefined" {
                    out.push_str("null");
                } else {
                    out.push_str(&word);
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Copy a quoted string starting at `start` as a double quoted JSON string.
/// Returns the index after its closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                if escaped == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(escaped);
                }
                i += 2;
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out.push('"');
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_json() {
        assert_eq!(parse_loose_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_inspect_style_object() {
        let value = parse_loose_json(
            "{ isDevMode: true,\n  releaseChannel: 'prod',\n  zoom: undefined,\n  teams: [ 'T1', 'T2', ],\n}",
        )
        .expect("parses");
        assert_eq!(value["isDevMode"], json!(true));
        assert_eq!(value["releaseChannel"], json!("prod"));
        assert_eq!(value["zoom"], Value::Null);
        assert_eq!(value["teams"], json!(["T1", "T2"]));
    }

    #[test]
    fn test_quotes_inside_strings() {
        let value = parse_loose_json(r#"{ msg: 'say "hi"', other: 'it\'s' }"#).expect("parses");
        assert_eq!(value["msg"], json!("say \"hi\""));
        assert_eq!(value["other"], json!("it's"));
    }

    #[test]
    fn test_string_contents_untouched() {
        let value = parse_loose_json("{ url: 'https://a.b/c?x=1,y' }").expect("parses");
        assert_eq!(value["url"], json!("https://a.b/c?x=1,y"));
    }

    #[test]
    fn test_not_json() {
        assert_eq!(parse_loose_json("main.js:12\ndispatch@main.js:1"), None);
        assert_eq!(parse_loose_json(""), None);
    }
}
