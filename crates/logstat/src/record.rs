// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line parsing: one raw text line in, one classified outcome out.
//!
//! Parsing is a pure function with no side effects. Candidate matchers are
//! tried in priority order: the primary grammar first, then a looser
//! positional heuristic for the malformed-but-salvageable lines real-world
//! logs are full of. A line that defeats both matchers becomes a
//! [`ParseFailure`] with the most specific applicable reason.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use ustr::Ustr;

use crate::constants::{MAX_STATUS_CODE, MIN_STATUS_CODE, TIMESTAMP_FORMAT};
use crate::errors::ParseError;

// Recognized line grammar: TIMESTAMP ADDRESS METHOD PATH STATUS. Matching is
// anchored at the start only; trailing content after the status is tolerated.
static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) (?P<address>\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}) (?P<method>GET|POST|PUT|DELETE|HEAD|OPTIONS|PATCH) (?P<path>\S+) (?P<status>\d{3})(?:\s|$)",
    )
    .expect("invalid line pattern")
});

static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("invalid address pattern")
});

/// One successfully parsed log entry. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    /// Originating network address in string form; interned because the same
    /// handful of addresses repeats across hundreds of thousands of lines.
    pub source_address: Ustr,
    pub method: Ustr,
    pub path: String,
    pub status_code: u16,
}

/// A line that did not yield a [`LogRecord`]. Counted, never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseFailure {
    pub raw_line: String,
    pub reason: ParseError,
}

/// Outcome of parsing a single line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Record(LogRecord),
    Failure(ParseFailure),
}

type Matcher = fn(&str) -> Option<Result<LogRecord, ParseError>>;

// Candidate matchers in priority order. Each either declines (`None`, the
// next matcher is tried) or decides the line (`Some`), successfully or not.
const MATCHERS: [Matcher; 2] = [match_primary, match_fallback];

/// Parses one line of text into a [`LogRecord`].
///
/// Never panics for any input, including empty or truncated lines.
pub fn parse(line: &str) -> Result<LogRecord, ParseError> {
    let line = line.trim();
    for matcher in MATCHERS {
        if let Some(outcome) = matcher(line) {
            return outcome;
        }
    }
    Err(ParseError::UnrecognizedFormat)
}

/// Parses one line, packaging a failure together with the offending text.
pub fn parse_line(line: &str) -> LineOutcome {
    match parse(line) {
        Ok(record) => LineOutcome::Record(record),
        Err(reason) => LineOutcome::Failure(ParseFailure {
            raw_line: line.to_string(),
            reason,
        }),
    }
}

// Primary strategy: the full recognized grammar.
fn match_primary(line: &str) -> Option<Result<LogRecord, ParseError>> {
    let captures = LINE_PATTERN.captures(line)?;

    // The pattern guarantees the shape of each field but not its validity:
    // "2024-13-01" matches \d{4}-\d{2}-\d{2} and "999" matches \d{3}.
    let timestamp =
        match NaiveDateTime::parse_from_str(&captures["timestamp"], TIMESTAMP_FORMAT) {
            Ok(timestamp) => timestamp,
            Err(_) => return Some(Err(ParseError::MalformedStructure)),
        };

    let status_code = match captures["status"].parse::<u16>() {
        Ok(code) if (MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&code) => code,
        _ => return Some(Err(ParseError::InvalidStatusCode)),
    };

    Some(Ok(LogRecord {
        timestamp,
        source_address: Ustr::from(&captures["address"]),
        method: Ustr::from(&captures["method"]),
        path: captures["path"].to_string(),
        status_code,
    }))
}

// Fallback strategy: positional extraction for lines that deviate from the
// nominal grammar (unknown methods, shifted fields). With more than five
// tokens the timestamp spans tokens 0-1; with exactly five it is a bare date.
// The status is always the final token, the path the token before it.
fn match_fallback(line: &str) -> Option<Result<LogRecord, ParseError>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    let status_token = parts[parts.len() - 1];
    if !status_token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if status_token.len() != 3 {
        return Some(Err(ParseError::InvalidStatusCode));
    }
    let status_code = match status_token.parse::<u16>() {
        Ok(code) if (MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&code) => code,
        _ => return Some(Err(ParseError::InvalidStatusCode)),
    };

    let (timestamp_text, address, method) = if parts.len() > 5 {
        (format!("{} {}", parts[0], parts[1]), parts[2], parts[3])
    } else {
        (parts[0].to_string(), parts[1], parts[2])
    };

    if !ADDRESS_PATTERN.is_match(address) {
        return None;
    }

    let timestamp = match parse_timestamp(&timestamp_text) {
        Some(timestamp) => timestamp,
        None => return Some(Err(ParseError::MalformedStructure)),
    };

    Some(Ok(LogRecord {
        timestamp,
        source_address: Ustr::from(address),
        method: Ustr::from(method),
        path: parts[parts.len() - 2].to_string(),
        status_code,
    }))
}

// Best-effort timestamp recovery: full grammar layout first, then a bare
// date with midnight assumed.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(timestamp);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
