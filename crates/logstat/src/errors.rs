// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Classification of a line that did not yield a [`crate::record::LogRecord`].
///
/// Line-level failures are always recoverable: they are counted by the
/// aggregator and never abort a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseError {
    /// The line resembles a log entry but a required field is broken
    /// (unparseable timestamp, too few fields for the layout).
    #[error("malformed structure")]
    MalformedStructure,

    /// A status-like token was found but it is not a 3-digit code in the
    /// 100-599 range.
    #[error("invalid status code")]
    InvalidStatusCode,

    /// Neither the primary grammar nor the fallback heuristic applied.
    #[error("unrecognized format")]
    UnrecognizedFormat,
}

/// Errors constructing an aggregator from an [`crate::analysis::AnalysisConfig`].
#[derive(Debug, thiserror::Error)]
pub enum Creation {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("top-N cutoff must be greater than zero")]
    InvalidTopN,

    #[error("error code {0} is outside the 100-599 range")]
    InvalidErrorCode(u16),
}

/// Run-level, fatal errors. A run either completes with a fully populated
/// result or fails with one of these; it never returns a truncated result.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    Config(#[from] Creation),

    #[error("failed to read input source: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis run cancelled")]
    Cancelled,

    #[error("aggregator service unavailable")]
    ServiceUnavailable,
}

/// Errors persisting or loading analysis history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize history record: {0}")]
    Serialize(#[from] serde_json::Error),
}
