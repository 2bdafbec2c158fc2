// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for allocscope.
//!
//! This crate holds the data model shared by ingestion, analysis and
//! reporting:
//!
//! - [`record`] - benchmark records, result sets and combined datasets
//! - [`diagnostic`] - advisory warnings emitted alongside the data
//! - [`error`] - fatal errors for ingestion and aggregation
//! - [`config`] - thresholds and the layered configuration loader
//! - [`summary`] - aggregated statistics and pivot tables

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod record;
pub mod summary;

pub use config::AnalysisConfig;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{AggregationError, FailedSource, IngestError};
pub use record::{
    BenchmarkRecord, CombinedDataset, Phase, ResultSet, RunCounters, SourceId, TaggedRecord,
};
pub use summary::{Metric, PivotTable, SummaryStatistic};
