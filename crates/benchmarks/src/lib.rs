//! Benchmark result ingestion and report writers for allocscope.
//!
//! This crate reads the CSV files produced by the allocator benchmark
//! harness and writes analysis reports back out.
//!
//! # Quick Start
//!
//! ```no_run
//! use allocscope_benchmarks::io::read_results_file;
//!
//! let ingested = read_results_file("benchmark_results.csv")?;
//! for record in ingested.result_set.records() {
//!     println!("{} {}: {}", record.allocator(), record.scenario(), record.alloc_ops_per_sec());
//! }
//! for warning in &ingested.diagnostics {
//!     eprintln!("{}", warning);
//! }
//! # Ok::<(), allocscope_core::IngestError>(())
//! ```
//!
//! # Modules
//!
//! - [`schema`] - Column names and header validation
//! - [`io`] - Reading result files and writing reports
//! - [`result`] - Per-source ingestion outcomes
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod io;
pub mod markdown;
pub mod result;
pub mod schema;

pub use io::{ingest_sources, read_results, read_results_file, read_results_str};
pub use markdown::{generate_report, summary_block, MarkdownReport, ReportView};
pub use result::{partition, Ingested, PartitionedOutcomes, SourceOutcome};
pub use schema::{validate_header, Column, ColumnMap};
