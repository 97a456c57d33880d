// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Service layer for the log analysis engine.
//!
//! Owns configuration (environment-driven) and the orchestration of a single
//! analysis run: reader, aggregator task, history store, optional report.

pub mod config;
pub mod error;
pub mod services;
