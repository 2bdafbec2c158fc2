// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Validation and aggregation of allocator benchmark results.
//!
//! The stages run in this order:
//!
//! - [`reconcile`] - recompute throughput from raw counters and compare
//! - [`anomaly`] - flag scenarios where allocators did unequal work
//! - [`ordering`] - stable display order for scenario names
//! - [`aggregate`] - combine result sets and compute mean statistics
//! - [`pivot`] - dense tables for renderers
//!
//! [`pipeline`] wires them together.
//!
//! # Example
//!
//! ```
//! use allocscope_analysis::Pipeline;
//! use allocscope_core::{AnalysisConfig, BenchmarkRecord, ResultSet, SourceId};
//!
//! let record = BenchmarkRecord::builder()
//!     .allocator("Buddy")
//!     .scenario("Sequential")
//!     .alloc_ops_per_sec(1_000_000.0)
//!     .free_ops_per_sec(2_000_000.0)
//!     .peak_utilization(0.5)
//!     .build()
//!     .unwrap();
//! let set = ResultSet::new(SourceId::new("run.csv"), vec![record]);
//!
//! let report = Pipeline::new(AnalysisConfig::default())
//!     .run(&[set], Vec::new())
//!     .unwrap();
//! assert_eq!(report.by_allocator.len(), 1);
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod anomaly;
pub mod ordering;
pub mod pipeline;
pub mod pivot;
pub mod reconcile;

pub use aggregate::{
    allocators_in_encounter_order, combine, summarize_by_allocator,
    summarize_by_allocator_and_scenario, summarize_group,
};
pub use anomaly::{AllocatorOps, ScenarioWorkload, WorkloadDetector};
pub use ordering::ScenarioOrdering;
pub use pipeline::{AnalysisReport, Pipeline};
pub use pivot::{throughput_pivot, utilization_pivot};
pub use reconcile::{calculated_throughput, reldiff, Reconciler};
