// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Fatal error taxonomy.
//!
//! Everything that is recoverable is reported as a
//! [`Diagnostic`](crate::diagnostic::Diagnostic) instead.

use crate::record::SourceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort ingestion of a single source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source could not be read or is not structurally parseable
    #[error("Input error in {source_id}: {message}")]
    Input {
        /// Source that failed
        source_id: SourceId,
        /// Underlying reason
        message: String,
    },

    /// Mandatory columns are missing from the header
    #[error("Schema error in {source_id}: missing required column(s): {}", .missing.join(", "))]
    Schema {
        /// Source that failed
        source_id: SourceId,
        /// Missing column names, in canonical order
        missing: Vec<String>,
    },
}

impl IngestError {
    /// Source the error refers to.
    pub fn source_id(&self) -> &SourceId {
        match self {
            IngestError::Input { source_id, .. } | IngestError::Schema { source_id, .. } => source_id,
        }
    }

    /// Build an input error from anything printable.
    pub fn input(source: &SourceId, err: impl std::fmt::Display) -> Self {
        IngestError::Input {
            source_id: source.clone(),
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// A source that was skipped, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSource {
    /// Source that failed
    pub source: SourceId,
    /// Rendered error
    pub reason: String,
}

impl From<&IngestError> for FailedSource {
    fn from(err: &IngestError) -> Self {
        Self {
            source: err.source_id().clone(),
            reason: err.to_string(),
        }
    }
}

/// Errors raised by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// A group was formed but holds no samples
    #[error("Empty aggregation group: allocator={allocator}, scenario={}", .scenario.as_deref().unwrap_or("*"))]
    EmptyGroup {
        /// Allocator of the group
        allocator: String,
        /// Scenario of the group, `None` for per-allocator groups
        scenario: Option<String>,
    },
}

/// Result type for aggregation.
pub type AggregationResult<T> = std::result::Result<T, AggregationError>;
