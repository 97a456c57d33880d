// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Default number of lines read per chunk. Chunking bounds peak memory
/// regardless of input size; it never affects the analysis output.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default cutoff for the top-N rankings (error codes, sources, paths).
pub const DEFAULT_TOP_N: usize = 5;

/// Depth of the aggregator command queue. The sender blocks once this many
/// chunks are in flight, so queued raw lines stay bounded no matter how
/// large the input is or how slow the folding task runs.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

/// Status codes treated as errors unless the caller overrides the set.
pub const DEFAULT_ERROR_CODES: &[u16] = &[
    400, 401, 403, 404, 405, 408, 429, 500, 502, 503, 504,
];

/// Lowest status code accepted by the parser.
pub const MIN_STATUS_CODE: u16 = 100;

/// Highest status code accepted by the parser.
pub const MAX_STATUS_CODE: u16 = 599;

/// Timestamp layout of the recognized line grammar.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
