// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Plain-text report rendering for a finished analysis.

use std::fmt::Write as _;
use std::path::Path;

use chrono::Utc;

use crate::analysis::AnalysisResult;
use crate::constants::TIMESTAMP_FORMAT;

const RULE_WIDE: &str =
    "======================================================================";
const RULE_NARROW: &str = "----------------------------------------";

/// Renders the full text report, stamped with the generation time.
/// Writing is separate.
#[must_use]
pub fn render_text_report(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE_WIDE}");
    let _ = writeln!(out, "SERVER LOG ANALYSIS REPORT");
    let _ = writeln!(out, "{RULE_WIDE}");
    let _ = writeln!(out, "Generated: {}", Utc::now().format(TIMESTAMP_FORMAT));
    let _ = writeln!(out);

    let _ = writeln!(out, "SUMMARY STATISTICS");
    let _ = writeln!(out, "{RULE_NARROW}");
    let _ = writeln!(out, "Total Lines Seen: {}", result.total_lines_seen);
    let _ = writeln!(out, "Total Requests: {}", result.total_requests);
    let _ = writeln!(out, "Total Errors: {}", result.total_errors);
    let _ = writeln!(out, "Parse Failures: {}", result.total_parse_failures);
    let _ = writeln!(out, "Error Rate: {:.2}%", result.error_rate * 100.0);
    let _ = writeln!(out);

    let _ = writeln!(out, "ERROR CODE DISTRIBUTION");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (code, count) in &result.top_error_codes {
        let _ = writeln!(out, "HTTP {code}: {count} occurrences");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "TOP SOURCES WITH ERRORS");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (address, count) in &result.top_error_sources {
        let _ = writeln!(out, "{address}: {count} errors");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "TOP ERROR PATHS");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (path, count) in &result.top_error_paths {
        let _ = writeln!(out, "{path}: {count} errors");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "TOP REQUEST SOURCES");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (address, count) in &result.top_request_sources {
        let _ = writeln!(out, "{address}: {count} requests");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "REQUEST METHOD DISTRIBUTION");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (method, count) in &result.method_counts {
        let percentage = if result.total_requests > 0 {
            *count as f64 / result.total_requests as f64 * 100.0
        } else {
            0.0
        };
        let _ = writeln!(out, "{method}: {count} ({percentage:.1}%)");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "REQUEST TREND");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (bucket, count) in &result.trend_series {
        let _ = writeln!(out, "{}: {count} requests", bucket.format(TIMESTAMP_FORMAT));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "ERROR TREND");
    let _ = writeln!(out, "{RULE_NARROW}");
    for (bucket, count) in &result.error_trend_series {
        let _ = writeln!(out, "{}: {count} errors", bucket.format(TIMESTAMP_FORMAT));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{RULE_WIDE}");
    let _ = writeln!(out, "END OF REPORT");
    let _ = writeln!(out, "{RULE_WIDE}");

    out
}

/// Writes the rendered report to `path`.
pub async fn write_text_report(
    result: &AnalysisResult,
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    tokio::fs::write(path, render_text_report(result)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            total_lines_seen: 10,
            total_requests: 8,
            total_errors: 4,
            total_parse_failures: 2,
            error_rate: 0.5,
            error_code_counts: vec![(404, 3), (500, 1)],
            top_error_codes: vec![(404, 3), (500, 1)],
            top_error_sources: vec![("10.0.0.1".to_string(), 4)],
            top_error_paths: vec![("/admin".to_string(), 4)],
            top_request_sources: vec![("10.0.0.1".to_string(), 5), ("10.0.0.2".to_string(), 3)],
            method_counts: vec![("GET".to_string(), 6), ("POST".to_string(), 2)],
            trend_series: Vec::new(),
            error_trend_series: Vec::new(),
            execution_time: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_report_contains_all_sections() {
        let report = render_text_report(&sample_result());
        for section in [
            "SERVER LOG ANALYSIS REPORT",
            "SUMMARY STATISTICS",
            "ERROR CODE DISTRIBUTION",
            "TOP SOURCES WITH ERRORS",
            "TOP ERROR PATHS",
            "TOP REQUEST SOURCES",
            "REQUEST METHOD DISTRIBUTION",
            "REQUEST TREND",
            "ERROR TREND",
            "END OF REPORT",
        ] {
            assert!(report.contains(section), "missing section: {section}");
        }
        assert!(report.contains("Error Rate: 50.00%"));
        assert!(report.contains("HTTP 404: 3 occurrences"));
        assert!(report.contains("10.0.0.1: 5 requests"));
        assert!(report.contains("GET: 6 (75.0%)"));
    }

    #[test]
    fn test_report_renders_for_empty_run() {
        let result = AnalysisResult {
            total_lines_seen: 0,
            total_requests: 0,
            total_errors: 0,
            total_parse_failures: 0,
            error_rate: 0.0,
            error_code_counts: Vec::new(),
            top_error_codes: Vec::new(),
            top_error_sources: Vec::new(),
            top_error_paths: Vec::new(),
            top_request_sources: Vec::new(),
            method_counts: Vec::new(),
            ..sample_result()
        };
        let report = render_text_report(&result);
        assert!(report.contains("Total Requests: 0"));
        assert!(report.contains("Error Rate: 0.00%"));
    }

    #[tokio::test]
    async fn test_write_text_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        write_text_report(&sample_result(), &path).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("END OF REPORT"));
    }
}
