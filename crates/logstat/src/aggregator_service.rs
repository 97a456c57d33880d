// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::aggregator::Aggregator;
use crate::analysis::{AnalysisConfig, AnalysisResult};
use crate::constants::COMMAND_QUEUE_DEPTH;
use crate::errors::{AnalysisError, Creation};
use crate::record::LineOutcome;

/// Commands accepted by the aggregator task. Folding happens on a single
/// owner, so chunk producers never contend on the counters.
#[derive(Debug)]
pub enum AggregatorCommand {
    InsertBatch(Vec<LineOutcome>),
    Finalize {
        execution_time: Duration,
        response_tx: oneshot::Sender<AnalysisResult>,
    },
    Shutdown,
}

#[derive(Clone)]
pub struct AggregatorHandle {
    tx: mpsc::Sender<AggregatorCommand>,
}

impl AggregatorHandle {
    /// Queues one parsed chunk for folding. The channel is bounded, so this
    /// blocks once [`COMMAND_QUEUE_DEPTH`] chunks are in flight; peak memory
    /// stays proportional to the chunk size, never the input size.
    pub async fn insert_batch(
        &self,
        outcomes: Vec<LineOutcome>,
    ) -> Result<(), mpsc::error::SendError<AggregatorCommand>> {
        self.tx.send(AggregatorCommand::InsertBatch(outcomes)).await
    }

    /// Derives the final result and ends the run. The service stops after
    /// responding; one service instance serves exactly one analysis run.
    pub async fn finalize(
        &self,
        execution_time: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(AggregatorCommand::Finalize {
                execution_time,
                response_tx,
            })
            .await
            .map_err(|_| AnalysisError::ServiceUnavailable)?;

        response_rx
            .await
            .map_err(|_| AnalysisError::ServiceUnavailable)
    }

    /// Stops the service without producing a result, discarding the
    /// partially aggregated counters. Used on the abort paths.
    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<AggregatorCommand>> {
        self.tx.send(AggregatorCommand::Shutdown).await
    }
}

pub struct AggregatorService {
    aggregator: Aggregator,
    rx: mpsc::Receiver<AggregatorCommand>,
}

impl AggregatorService {
    pub fn new(config: AnalysisConfig) -> Result<(Self, AggregatorHandle), Creation> {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let aggregator = Aggregator::new(config)?;

        let service = Self { aggregator, rx };
        let handle = AggregatorHandle { tx };

        Ok((service, handle))
    }

    pub async fn run(mut self) {
        debug!("Aggregator service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                AggregatorCommand::InsertBatch(outcomes) => {
                    for outcome in outcomes {
                        self.aggregator.insert(outcome);
                    }
                }

                AggregatorCommand::Finalize {
                    execution_time,
                    response_tx,
                } => {
                    debug!(
                        lines_seen = self.aggregator.lines_seen(),
                        "Finalizing analysis run"
                    );
                    let result = self.aggregator.finalize(execution_time);
                    if response_tx.send(result).is_err() {
                        error!("Failed to send analysis result - receiver dropped");
                    }
                    break;
                }

                AggregatorCommand::Shutdown => {
                    debug!("Aggregator service shutting down");
                    break;
                }
            }
        }

        debug!("Aggregator service stopped");
    }
}
