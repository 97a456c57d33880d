// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use logstat::analysis::AnalysisResult;
use logstat_core::{config::AnalyzerConfig, error::AnalyzerError, services::AnalyzerService};

const SUMMARY_RULE: &str = "============================================================";

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match AnalyzerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log_level);
    debug!("Logging subsystem enabled");

    let input = match resolve_input(&config) {
        Ok(input) => input,
        Err(e) => {
            error!("{e}");
            eprintln!("Usage: logstat-cli <LOG_FILE>  (or set LOGSTAT_INPUT)");
            return ExitCode::FAILURE;
        }
    };

    let service = match AnalyzerService::new(config) {
        Ok(service) => service,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current chunk");
            signal_token.cancel();
        }
    });

    match service.run(&input, cancel_token).await {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Analysis of {} failed: {e}", input.display());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log_level: &str) {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::new(log_level))
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    // Config validation already vetted the level string.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// The positional argument wins over LOGSTAT_INPUT.
fn resolve_input(config: &AnalyzerConfig) -> Result<PathBuf, AnalyzerError> {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.input.clone())
        .ok_or(AnalyzerError::MissingInput)
}

fn print_summary(result: &AnalysisResult) {
    println!("{SUMMARY_RULE}");
    println!("LOG ANALYSIS SUMMARY");
    println!("{SUMMARY_RULE}");
    println!("Total requests: {}", result.total_requests);
    println!("Total errors: {}", result.total_errors);
    println!("Parse failures: {}", result.total_parse_failures);
    println!("Error rate: {:.2}%", result.error_rate * 100.0);
    println!("Execution time: {:.2?}", result.execution_time);

    if !result.top_error_codes.is_empty() {
        println!();
        println!("Top error codes:");
        for (code, count) in &result.top_error_codes {
            println!("  HTTP {code}: {count}");
        }
    }
    println!("{SUMMARY_RULE}");
}
