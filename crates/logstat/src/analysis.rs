// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_ERROR_CODES, DEFAULT_TOP_N, MAX_STATUS_CODE, MIN_STATUS_CODE,
};
use crate::errors::Creation;

/// Width of the fixed time intervals used to group request counts for the
/// trend series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendBucket {
    Minute,
    Hour,
}

impl TrendBucket {
    /// Truncates a timestamp to the start of its bucket.
    pub fn truncate(self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let truncated = match self {
            TrendBucket::Minute => timestamp.with_second(0),
            TrendBucket::Hour => timestamp.with_second(0).and_then(|t| t.with_minute(0)),
        };
        truncated
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(timestamp)
    }
}

/// Configuration for one analysis run, supplied by the caller up front.
/// There is no ambient or discovered configuration inside the engine.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Lines read per chunk. Affects memory and throughput only, never the
    /// analysis output.
    pub chunk_size: usize,
    /// Status codes classified as errors.
    pub error_codes: FnvHashSet<u16>,
    /// Cutoff for the top-N rankings.
    pub top_n: usize,
    /// Width of the trend-series buckets.
    pub trend_bucket: TrendBucket,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            error_codes: DEFAULT_ERROR_CODES.iter().copied().collect(),
            top_n: DEFAULT_TOP_N,
            trend_bucket: TrendBucket::Hour,
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration. Invalid configuration is a run-level,
    /// fatal error: it aborts before any line is read.
    pub fn validate(&self) -> Result<(), Creation> {
        if self.chunk_size == 0 {
            return Err(Creation::InvalidChunkSize);
        }
        if self.top_n == 0 {
            return Err(Creation::InvalidTopN);
        }
        if let Some(&code) = self
            .error_codes
            .iter()
            .find(|&&code| !(MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&code))
        {
            return Err(Creation::InvalidErrorCode(code));
        }
        Ok(())
    }
}

/// Immutable snapshot produced once per run; the engine's sole output.
///
/// Fully deterministic for a given input and configuration except for
/// `execution_time`; run timestamping belongs to the persistence layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_lines_seen: u64,
    /// Successfully parsed records. Parse failures are excluded.
    pub total_requests: u64,
    pub total_errors: u64,
    pub total_parse_failures: u64,
    /// `total_errors / total_requests`, 0 when there were no requests.
    pub error_rate: f64,
    /// Every error code seen with its count, ascending by code. Untruncated.
    pub error_code_counts: Vec<(u16, u64)>,
    /// (status code, count), descending by count, ties by ascending code.
    pub top_error_codes: Vec<(u16, u64)>,
    /// (address, error count), descending by count, ties lexicographic.
    pub top_error_sources: Vec<(String, u64)>,
    /// (path, error count), descending by count, ties lexicographic.
    pub top_error_paths: Vec<(String, u64)>,
    /// (address, request count) over all records, descending by count,
    /// ties lexicographic.
    pub top_request_sources: Vec<(String, u64)>,
    /// (method, request count), descending by count, ties lexicographic.
    pub method_counts: Vec<(String, u64)>,
    /// (bucket start, request count), strictly ascending by bucket.
    pub trend_series: Vec<(NaiveDateTime, u64)>,
    /// (bucket start, error count), strictly ascending by bucket. Buckets
    /// without errors are absent.
    pub error_trend_series: Vec<(NaiveDateTime, u64)>,
    pub execution_time: Duration,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::constants::TIMESTAMP_FORMAT;

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let config = AnalysisConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Creation::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_validate_zero_top_n() {
        let config = AnalysisConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Creation::InvalidTopN)));
    }

    #[test]
    fn test_validate_out_of_range_error_code() {
        let config = AnalysisConfig {
            error_codes: [200, 777].into_iter().collect(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Creation::InvalidErrorCode(777))
        ));
    }

    #[test]
    fn test_trend_bucket_truncation() {
        let timestamp = ts("2024-03-01 12:34:56");
        assert_eq!(
            TrendBucket::Minute.truncate(timestamp),
            ts("2024-03-01 12:34:00")
        );
        assert_eq!(
            TrendBucket::Hour.truncate(timestamp),
            ts("2024-03-01 12:00:00")
        );
    }

    #[test]
    fn test_analysis_result_round_trips_through_json() {
        let result = AnalysisResult {
            total_lines_seen: 3,
            total_requests: 2,
            total_errors: 1,
            total_parse_failures: 1,
            error_rate: 0.5,
            error_code_counts: vec![(404, 1)],
            top_error_codes: vec![(404, 1)],
            top_error_sources: vec![("10.0.0.1".to_string(), 1)],
            top_error_paths: vec![("/x".to_string(), 1)],
            top_request_sources: vec![("10.0.0.1".to_string(), 2)],
            method_counts: vec![("GET".to_string(), 2)],
            trend_series: vec![(ts("2024-03-01 12:00:00"), 2)],
            error_trend_series: vec![(ts("2024-03-01 12:00:00"), 1)],
            execution_time: Duration::from_millis(5),
        };

        let json = serde_json::to_string(&result).unwrap();
        let decoded: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.total_requests, 2);
        assert_eq!(decoded.top_error_codes, vec![(404, 1)]);
        assert_eq!(decoded.error_code_counts, vec![(404, 1)]);
        assert_eq!(decoded.trend_series, result.trend_series);
        assert_eq!(decoded.error_trend_series, result.error_trend_series);
    }
}
