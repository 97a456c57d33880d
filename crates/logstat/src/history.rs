// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Persisted history of past analyses.
//!
//! The engine only ever sees the [`HistoryStore`] trait: one row in per run,
//! recent rows out. The bundled implementation appends JSON lines to a local
//! file; nothing in the engine depends on any particular storage technology.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::analysis::AnalysisResult;
use crate::errors::HistoryError;

/// One stored row per analysis run. The row is stamped here, when the run
/// is persisted; the analysis result itself carries no wall-clock time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub run_at: DateTime<Utc>,
    pub total_requests: u64,
    pub total_errors: u64,
    pub error_rate: f64,
    /// Full per-code error counts, not the top-N ranking.
    pub error_distribution: Vec<(u16, u64)>,
    pub top_error_sources: Vec<(String, u64)>,
    pub execution_time: Duration,
}

impl From<&AnalysisResult> for HistoryRecord {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            run_at: Utc::now(),
            total_requests: result.total_requests,
            total_errors: result.total_errors,
            error_rate: result.error_rate,
            error_distribution: result.error_code_counts.clone(),
            top_error_sources: result.top_error_sources.clone(),
            execution_time: result.execution_time,
        }
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Stores one finished analysis.
    async fn store(&self, result: &AnalysisResult) -> Result<(), HistoryError>;

    /// Returns up to `limit` past analyses, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError>;
}

/// Append-only JSON-lines file, one serialized [`HistoryRecord`] per row.
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoryStore for JsonlHistory {
    async fn store(&self, result: &AnalysisResult) -> Result<(), HistoryError> {
        let row = serde_json::to_string(&HistoryRecord::from(result))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(row.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            // No file yet means no history, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HistoryError::Io(e)),
        };

        let mut records: Vec<HistoryRecord> = Vec::new();
        for line in contents.lines().rev() {
            if records.len() == limit {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable history row: {e}"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_result(total_requests: u64) -> AnalysisResult {
        AnalysisResult {
            total_lines_seen: total_requests,
            total_requests,
            total_errors: 1,
            total_parse_failures: 0,
            error_rate: if total_requests > 0 {
                1.0 / total_requests as f64
            } else {
                0.0
            },
            error_code_counts: vec![(404, 1), (500, 1), (503, 1)],
            top_error_codes: vec![(404, 1)],
            top_error_sources: vec![("10.0.0.1".to_string(), 1)],
            top_error_paths: vec![("/a".to_string(), 1)],
            top_request_sources: vec![("10.0.0.1".to_string(), total_requests)],
            method_counts: vec![("GET".to_string(), total_requests)],
            trend_series: Vec::new(),
            error_trend_series: Vec::new(),
            execution_time: Duration::from_millis(3),
        }
    }

    #[tokio::test]
    async fn test_store_and_recent_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistory::new(dir.path().join("history.jsonl"));

        store.store(&sample_result(5)).await.unwrap();
        store.store(&sample_result(9)).await.unwrap();

        let records = store.recent(10).await.unwrap();
        assert_eq!(records.len(), 2);
        // Newest first.
        assert_eq!(records[0].total_requests, 9);
        assert_eq!(records[1].total_requests, 5);
        // Rows keep the full distribution, beyond the top-N ranking.
        assert_eq!(
            records[0].error_distribution,
            vec![(404, 1), (500, 1), (503, 1)]
        );
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistory::new(dir.path().join("history.jsonl"));
        for i in 0..5 {
            store.store(&sample_result(i)).await.unwrap();
        }

        let records = store.recent(2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_requests, 4);
    }

    #[tokio::test]
    async fn test_recent_with_no_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistory::new(dir.path().join("missing.jsonl"));
        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_skips_corrupt_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = JsonlHistory::new(&path);
        store.store(&sample_result(5)).await.unwrap();
        tokio::fs::write(
            &path,
            format!(
                "{}\nnot json\n",
                tokio::fs::read_to_string(&path).await.unwrap().trim_end()
            ),
        )
        .await
        .unwrap();

        let records = store.recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_requests, 5);
    }
}
