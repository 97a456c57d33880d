// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Running statistics for one analysis run.
//!
//! The aggregator owns every counter for the duration of a run. Folding is
//! strictly sequential; raw lines and intermediate records are dropped as
//! soon as they are folded, so only the counters persist across chunks.

use std::time::Duration;

use chrono::NaiveDateTime;
use fnv::FnvHashMap;
use hashbrown::HashMap;
use tracing::trace;
use ustr::Ustr;

use crate::analysis::{AnalysisConfig, AnalysisResult};
use crate::errors::Creation;
use crate::record::{LineOutcome, LogRecord};

pub struct Aggregator {
    config: AnalysisConfig,
    total_lines_seen: u64,
    total_records_parsed: u64,
    total_parse_failures: u64,
    status_code_counts: FnvHashMap<u16, u64>,
    source_error_counts: HashMap<Ustr, u64>,
    source_request_counts: HashMap<Ustr, u64>,
    path_error_counts: HashMap<String, u64>,
    method_counts: HashMap<Ustr, u64>,
    time_bucket_counts: HashMap<NaiveDateTime, u64>,
    error_bucket_counts: HashMap<NaiveDateTime, u64>,
}

impl Aggregator {
    pub fn new(config: AnalysisConfig) -> Result<Self, Creation> {
        config.validate()?;
        Ok(Self {
            config,
            total_lines_seen: 0,
            total_records_parsed: 0,
            total_parse_failures: 0,
            status_code_counts: FnvHashMap::default(),
            source_error_counts: HashMap::new(),
            source_request_counts: HashMap::new(),
            path_error_counts: HashMap::new(),
            method_counts: HashMap::new(),
            time_bucket_counts: HashMap::new(),
            error_bucket_counts: HashMap::new(),
        })
    }

    /// Folds one line outcome into the running counters.
    pub fn insert(&mut self, outcome: LineOutcome) {
        self.total_lines_seen += 1;
        match outcome {
            LineOutcome::Record(record) => self.fold_record(record),
            LineOutcome::Failure(failure) => {
                self.total_parse_failures += 1;
                trace!(
                    reason = %failure.reason,
                    line = failure.raw_line.as_str(),
                    "skipping unparseable line"
                );
            }
        }
        debug_assert_eq!(
            self.total_lines_seen,
            self.total_records_parsed + self.total_parse_failures
        );
    }

    fn fold_record(&mut self, record: LogRecord) {
        self.total_records_parsed += 1;
        *self
            .status_code_counts
            .entry(record.status_code)
            .or_insert(0) += 1;
        *self.method_counts.entry(record.method).or_insert(0) += 1;
        *self
            .source_request_counts
            .entry(record.source_address)
            .or_insert(0) += 1;

        let bucket = self.config.trend_bucket.truncate(record.timestamp);
        *self.time_bucket_counts.entry(bucket).or_insert(0) += 1;

        if self.config.error_codes.contains(&record.status_code) {
            *self
                .source_error_counts
                .entry(record.source_address)
                .or_insert(0) += 1;
            *self.path_error_counts.entry(record.path).or_insert(0) += 1;
            *self.error_bucket_counts.entry(bucket).or_insert(0) += 1;
        }
    }

    pub fn lines_seen(&self) -> u64 {
        self.total_lines_seen
    }

    /// Derives the final snapshot from the counters, draining them.
    ///
    /// Output is deterministic: every sequence is fully ordered with the
    /// documented tie-breaks, so map iteration order never leaks through.
    pub fn finalize(&mut self, execution_time: Duration) -> AnalysisResult {
        let total_requests = self.total_records_parsed;
        let status_code_counts = std::mem::take(&mut self.status_code_counts);

        let total_errors: u64 = status_code_counts
            .iter()
            .filter(|(code, _)| self.config.error_codes.contains(code))
            .map(|(_, count)| *count)
            .sum();
        let error_rate = if total_requests > 0 {
            total_errors as f64 / total_requests as f64
        } else {
            0.0
        };

        // Full distribution first; the top-N ranking is derived from it.
        let mut error_code_counts: Vec<(u16, u64)> = status_code_counts
            .into_iter()
            .filter(|(code, _)| self.config.error_codes.contains(code))
            .collect();
        error_code_counts.sort_unstable_by_key(|(code, _)| *code);

        let mut top_error_codes = error_code_counts.clone();
        top_error_codes.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_error_codes.truncate(self.config.top_n);

        let mut top_error_sources: Vec<(String, u64)> =
            std::mem::take(&mut self.source_error_counts)
                .into_iter()
                .map(|(address, count)| (address.to_string(), count))
                .collect();
        sort_ranking(&mut top_error_sources);
        top_error_sources.truncate(self.config.top_n);

        let mut top_error_paths: Vec<(String, u64)> = std::mem::take(&mut self.path_error_counts)
            .into_iter()
            .collect();
        sort_ranking(&mut top_error_paths);
        top_error_paths.truncate(self.config.top_n);

        let mut top_request_sources: Vec<(String, u64)> =
            std::mem::take(&mut self.source_request_counts)
                .into_iter()
                .map(|(address, count)| (address.to_string(), count))
                .collect();
        sort_ranking(&mut top_request_sources);
        top_request_sources.truncate(self.config.top_n);

        let mut method_counts: Vec<(String, u64)> = std::mem::take(&mut self.method_counts)
            .into_iter()
            .map(|(method, count)| (method.to_string(), count))
            .collect();
        sort_ranking(&mut method_counts);

        let mut trend_series: Vec<(NaiveDateTime, u64)> =
            std::mem::take(&mut self.time_bucket_counts)
                .into_iter()
                .collect();
        trend_series.sort_unstable_by_key(|(bucket, _)| *bucket);

        let mut error_trend_series: Vec<(NaiveDateTime, u64)> =
            std::mem::take(&mut self.error_bucket_counts)
                .into_iter()
                .collect();
        error_trend_series.sort_unstable_by_key(|(bucket, _)| *bucket);

        AnalysisResult {
            total_lines_seen: self.total_lines_seen,
            total_requests,
            total_errors,
            total_parse_failures: self.total_parse_failures,
            error_rate,
            error_code_counts,
            top_error_codes,
            top_error_sources,
            top_error_paths,
            top_request_sources,
            method_counts,
            trend_series,
            error_trend_series,
            execution_time,
        }
    }
}

// Descending by count, ties broken lexicographically ascending.
fn sort_ranking(entries: &mut [(String, u64)]) {
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}
