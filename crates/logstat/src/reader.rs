// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Chunked ingestion: drives one analysis run over a line-oriented source.
//!
//! The input is consumed incrementally, at most `chunk_size` lines at a
//! time, so peak memory is bounded regardless of file size. Cancellation is
//! checked at chunk boundaries only; the counters are always consistent
//! there, so an aborted run is simply discarded.

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::aggregator_service::AggregatorHandle;
use crate::analysis::{AnalysisConfig, AnalysisResult};
use crate::errors::AnalysisError;
use crate::record::{parse_line, LineOutcome};

// LineSource abstracts where the raw lines come from.
pub enum LineSource {
    /// Log file on disk, read incrementally.
    File(BufReader<File>),
    /// Replays a fixed buffer - used in tests.
    Memory(BufReader<Cursor<Vec<u8>>>),
    /// Replays a fixed buffer, then fails the next read - used in tests to
    /// exercise mid-read transport failures.
    Faulty(BufReader<Cursor<Vec<u8>>>),
}

impl LineSource {
    /// Opens a log file. An unreadable path is a run-level, fatal error.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let file = File::open(path).await?;
        Ok(Self::File(BufReader::new(file)))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::Memory(BufReader::new(Cursor::new(data)))
    }

    /// Yields the lines in `data`, then errors instead of signalling
    /// end-of-input.
    pub fn failing_after(data: Vec<u8>) -> Self {
        Self::Faulty(BufReader::new(Cursor::new(data)))
    }

    // Reads raw bytes up to and including the next newline. Invalid UTF-8 is
    // tolerated here and replaced lossily by the caller; only transport-level
    // read errors propagate.
    async fn read_until_newline(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        match self {
            Self::File(reader) => reader.read_until(b'\n', buf).await,
            Self::Memory(reader) => reader.read_until(b'\n', buf).await,
            Self::Faulty(reader) => match reader.read_until(b'\n', buf).await? {
                0 => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "source failed mid-read",
                )),
                read => Ok(read),
            },
        }
    }
}

/// Drives a full analysis run: read a chunk, parse it, hand the outcomes to
/// the aggregator task, repeat until the source is exhausted.
pub struct Ingestor {
    source: LineSource,
    chunk_size: usize,
    handle: AggregatorHandle,
    cancel_token: CancellationToken,
}

impl Ingestor {
    #[must_use]
    pub fn new(
        source: LineSource,
        config: &AnalysisConfig,
        handle: AggregatorHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            source,
            chunk_size: config.chunk_size,
            handle,
            cancel_token,
        }
    }

    /// Consumes the source to exhaustion and returns the finalized result.
    ///
    /// No partial results are returned: the run either completes, fails with
    /// an I/O error, or is cancelled between chunks.
    pub async fn run(mut self) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();

        loop {
            if self.cancel_token.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let chunk = self.read_chunk().await?;
            if chunk.is_empty() {
                break;
            }

            let outcomes: Vec<LineOutcome> =
                chunk.iter().map(|line| parse_line(line)).collect();
            debug!("Ingested chunk of {} lines", outcomes.len());
            self.handle
                .insert_batch(outcomes)
                .await
                .map_err(|_| AnalysisError::ServiceUnavailable)?;
            // chunk dropped here; only the aggregate counters persist
        }

        self.handle.finalize(start.elapsed()).await
    }

    async fn read_chunk(&mut self) -> Result<Vec<String>, AnalysisError> {
        let mut lines = Vec::with_capacity(self.chunk_size.min(1024));
        let mut buf = Vec::new();

        while lines.len() < self.chunk_size {
            buf.clear();
            let read = self.source.read_until_newline(&mut buf).await?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        }

        Ok(lines)
    }
}
