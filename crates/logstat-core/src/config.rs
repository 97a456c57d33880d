// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

use fnv::FnvHashSet;
use logstat::analysis::{AnalysisConfig, TrendBucket};
use logstat::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_ERROR_CODES, DEFAULT_TOP_N};
use logstat::util::parse_error_codes;

use crate::error::AnalyzerError;

const DEFAULT_HISTORY_PATH: &str = "logstat_history.jsonl";

/// Configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Path to the log file to analyze
    pub input: Option<PathBuf>,
    /// Maximum number of lines read per chunk
    pub chunk_size: usize,
    /// Status codes counted as errors
    pub error_codes: FnvHashSet<u16>,
    /// Number of entries kept in each ranking
    pub top_n: usize,
    /// Granularity of the request trend series
    pub trend_bucket: TrendBucket,
    /// Where run history rows are appended
    pub history_path: PathBuf,
    /// Optional path for the rendered text report
    pub report_path: Option<PathBuf>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            input: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            error_codes: DEFAULT_ERROR_CODES.iter().copied().collect(),
            top_n: DEFAULT_TOP_N,
            trend_bucket: TrendBucket::Hour,
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            report_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, AnalyzerError> {
        let defaults = Self::default();

        let input = env::var("LOGSTAT_INPUT").ok().map(PathBuf::from);
        let chunk_size = env::var("LOGSTAT_CHUNK_SIZE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let error_codes = env::var("LOGSTAT_ERROR_CODES")
            .ok()
            .and_then(|val| parse_error_codes(&val))
            .unwrap_or(defaults.error_codes);
        let top_n = env::var("LOGSTAT_TOP_N")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_TOP_N);
        let trend_bucket = env::var("LOGSTAT_TREND_BUCKET")
            .map(|val| val.to_lowercase())
            .ok()
            .and_then(|val| match val.as_str() {
                "minute" => Some(TrendBucket::Minute),
                "hour" => Some(TrendBucket::Hour),
                _ => None,
            })
            .unwrap_or(defaults.trend_bucket);
        let history_path = env::var("LOGSTAT_HISTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.history_path);
        let report_path = env::var("LOGSTAT_REPORT_PATH").ok().map(PathBuf::from);
        let log_level = env::var("LOGSTAT_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            input,
            chunk_size,
            error_codes,
            top_n,
            trend_bucket,
            history_path,
            report_path,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        self.analysis().validate()?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(AnalyzerError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// The engine-level view of this configuration.
    #[must_use]
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            chunk_size: self.chunk_size,
            error_codes: self.error_codes.clone(),
            top_n: self.top_n,
            trend_bucket: self.trend_bucket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_chunk_size() {
        let config = AnalyzerConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_top_n() {
        let config = AnalyzerConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = AnalyzerConfig {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        for level in valid_levels {
            let config = AnalyzerConfig {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Log level '{}' should be valid",
                level
            );
        }
    }

    #[test]
    fn test_analysis_view_carries_engine_fields() {
        let config = AnalyzerConfig {
            chunk_size: 42,
            top_n: 3,
            trend_bucket: TrendBucket::Minute,
            ..Default::default()
        };
        let analysis = config.analysis();
        assert_eq!(analysis.chunk_size, 42);
        assert_eq!(analysis.top_n, 3);
        assert_eq!(analysis.trend_bucket, TrendBucket::Minute);
        assert_eq!(analysis.error_codes, config.error_codes);
    }
}
