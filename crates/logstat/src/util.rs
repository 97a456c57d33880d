// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Utility functions for engine configuration values.

use fnv::FnvHashSet;

use crate::constants::{MAX_STATUS_CODE, MIN_STATUS_CODE};

/// Parses a comma-separated list of status codes into an error-code set.
///
/// Entries are trimmed; each must be an integer in the 100-599 range.
///
/// # Returns
///
/// * `Some(set)` - at least one valid code was found
/// * `None` - the input is empty or contains no valid code
///
/// # Examples
///
/// ```
/// use logstat::util::parse_error_codes;
///
/// let codes = parse_error_codes("404, 500,503").unwrap();
/// assert!(codes.contains(&404));
/// assert!(codes.contains(&503));
/// assert_eq!(parse_error_codes(""), None);
/// assert_eq!(parse_error_codes("abc"), None);
/// ```
pub fn parse_error_codes(raw: &str) -> Option<FnvHashSet<u16>> {
    let mut codes = FnvHashSet::default();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.parse::<u16>() {
            Ok(code) if (MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&code) => {
                codes.insert(code);
            }
            _ => {
                tracing::error!(
                    "Invalid status code '{}' in error-code list. Ignoring entry.",
                    entry
                );
            }
        }
    }

    if codes.is_empty() {
        None
    } else {
        Some(codes)
    }
}
