// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use logstat::errors::{AnalysisError, Creation};

/// Errors that can occur when running the analyzer service
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No input file given")]
    MissingInput,

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

impl From<Creation> for AnalyzerError {
    fn from(err: Creation) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
