// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use logstat::aggregator_service::AggregatorService;
use logstat::analysis::AnalysisResult;
use logstat::history::{HistoryStore, JsonlHistory};
use logstat::reader::{Ingestor, LineSource};
use logstat::report::write_text_report;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{config::AnalyzerConfig, error::AnalyzerError};

/// One-shot analyzer: reads a log file, aggregates it, persists the outcome.
///
/// The run either completes with a full [`AnalysisResult`] or fails; there are
/// no partial results. History and report writing happen after the result is
/// final and never fail the run.
#[derive(Debug)]
pub struct AnalyzerService {
    config: AnalyzerConfig,
}

impl AnalyzerService {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs a single analysis over `input`.
    ///
    /// Cancelling `cancel_token` aborts the run at the next chunk boundary.
    pub async fn run(
        &self,
        input: impl AsRef<Path>,
        cancel_token: CancellationToken,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let analysis_config = self.config.analysis();

        let (service, handle) = AggregatorService::new(analysis_config.clone())?;
        tokio::spawn(service.run());

        debug!("Analyzing {}", input.as_ref().display());
        let source = LineSource::open(input.as_ref()).await?;
        let ingestor = Ingestor::new(source, &analysis_config, handle.clone(), cancel_token);
        let result = match ingestor.run().await {
            Ok(result) => result,
            Err(e) => {
                // The aggregator task may still be waiting on commands.
                let _ = handle.shutdown().await;
                return Err(e.into());
            }
        };

        info!(
            "Analyzed {} lines in {:?}: {} requests, {} errors, {} parse failures",
            result.total_lines_seen,
            result.execution_time,
            result.total_requests,
            result.total_errors,
            result.total_parse_failures
        );

        // Persistence failures are logged, never fatal: the result is already
        // complete and still gets returned to the caller.
        let history = JsonlHistory::new(&self.config.history_path);
        if let Err(e) = history.store(&result).await {
            error!("Failed to store analysis history: {e}");
        }

        if let Some(report_path) = &self.config.report_path {
            match write_text_report(&result, report_path).await {
                Ok(()) => info!("Report written to {}", report_path.display()),
                Err(e) => error!("Failed to write report to {}: {e}", report_path.display()),
            }
        }

        Ok(result)
    }
}
