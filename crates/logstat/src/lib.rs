// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Access-log ingestion and aggregation engine.
//!
//! The engine turns an unbounded stream of raw log lines into a bounded,
//! structured metrics summary. Lines are read in fixed-size chunks
//! ([`reader::Ingestor`]), classified one at a time ([`record::parse_line`]),
//! and folded into running counters owned by a single aggregator task
//! ([`aggregator_service::AggregatorService`]). Finalizing a run produces one
//! immutable [`analysis::AnalysisResult`], which downstream collaborators
//! persist ([`history::HistoryStore`]) or render ([`report`]).
//!
//! Malformed lines never abort a run; they are counted per failure reason.
//! Only an unreadable input source or an invalid configuration is fatal.

pub mod aggregator;
pub mod aggregator_service;
pub mod analysis;
pub mod constants;
pub mod errors;
pub mod history;
pub mod reader;
pub mod record;
pub mod report;
pub mod util;
