// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark record model.
//!
//! A [`BenchmarkRecord`] is one validated row of allocator benchmark output.
//! Records are built once by ingestion and never modified afterwards; every
//! later stage derives new values from them.
//!
//! # Invariants
//!
//! - `allocator` and `scenario` are non-empty.
//! - Operation counts are unsigned and elapsed times are finite and `>= 0`.
//! - The reconciliation counters are either all present or all absent.
//! - The allocation count is known whenever the counters are.
//!
//! Deserialized records go through the same validation as built ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of the input a result set was read from (usually a file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a new source ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Benchmark phase a measurement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Allocation loop.
    Alloc,
    /// Deallocation loop.
    Free,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Alloc => write!(f, "alloc"),
            Phase::Free => write!(f, "free"),
        }
    }
}

/// Raw counters a benchmark harness reports alongside its throughput.
///
/// Only these values allow throughput to be recomputed independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Completed allocation operations.
    pub alloc_ops: u64,
    /// Completed free operations.
    pub free_ops: u64,
    /// Elapsed allocation time in microseconds.
    pub alloc_time_us: f64,
    /// Elapsed free time in microseconds.
    pub free_time_us: f64,
}

impl RunCounters {
    /// Operation count for a phase.
    pub fn ops(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Alloc => self.alloc_ops,
            Phase::Free => self.free_ops,
        }
    }

    /// Elapsed time for a phase, in microseconds.
    pub fn elapsed_micros(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Alloc => self.alloc_time_us,
            Phase::Free => self.free_time_us,
        }
    }

    fn is_valid(&self) -> bool {
        [self.alloc_time_us, self.free_time_us]
            .iter()
            .all(|t| t.is_finite() && *t >= 0.0)
    }
}

/// Reasons a record cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Allocator name was empty
    #[error("allocator name is empty")]
    EmptyAllocator,

    /// Scenario name was empty
    #[error("benchmark name is empty")]
    EmptyScenario,

    /// An elapsed time was negative or not finite
    #[error("elapsed times must be finite and non-negative")]
    InvalidCounters,
}

/// One validated benchmark measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct BenchmarkRecord {
    allocator: String,
    scenario: String,
    alloc_ops_per_sec: f64,
    free_ops_per_sec: f64,
    peak_utilization: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    alloc_ops: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counters: Option<RunCounters>,
}

/// Unvalidated wire form of [`BenchmarkRecord`].
#[derive(Deserialize)]
struct RecordFields {
    allocator: String,
    scenario: String,
    alloc_ops_per_sec: f64,
    free_ops_per_sec: f64,
    peak_utilization: f64,
    #[serde(default)]
    alloc_ops: Option<u64>,
    #[serde(default)]
    counters: Option<RunCounters>,
}

impl TryFrom<RecordFields> for BenchmarkRecord {
    type Error = RecordError;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        BenchmarkRecord::builder()
            .allocator(fields.allocator)
            .scenario(fields.scenario)
            .alloc_ops_per_sec(fields.alloc_ops_per_sec)
            .free_ops_per_sec(fields.free_ops_per_sec)
            .peak_utilization(fields.peak_utilization)
            .maybe_alloc_ops(fields.alloc_ops)
            .maybe_counters(fields.counters)
            .build()
    }
}

impl BenchmarkRecord {
    /// Create a new builder.
    pub fn builder() -> BenchmarkRecordBuilder {
        BenchmarkRecordBuilder::default()
    }

    /// Allocator under test.
    pub fn allocator(&self) -> &str {
        &self.allocator
    }

    /// Benchmark scenario name (the `Benchmark` column).
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Reported allocation throughput.
    pub fn alloc_ops_per_sec(&self) -> f64 {
        self.alloc_ops_per_sec
    }

    /// Reported free throughput.
    pub fn free_ops_per_sec(&self) -> f64 {
        self.free_ops_per_sec
    }

    /// Reported throughput for a phase.
    pub fn ops_per_sec(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Alloc => self.alloc_ops_per_sec,
            Phase::Free => self.free_ops_per_sec,
        }
    }

    /// Peak requested bytes divided by heap size.
    pub fn peak_utilization(&self) -> f64 {
        self.peak_utilization
    }

    /// Completed allocation operations, when the source reported them.
    ///
    /// Available even if the remaining counters are not.
    pub fn alloc_ops(&self) -> Option<u64> {
        self.alloc_ops
    }

    /// Raw counters, when the source provided all of them.
    pub fn counters(&self) -> Option<&RunCounters> {
        self.counters.as_ref()
    }
}

/// Builder for [`BenchmarkRecord`].
#[derive(Debug, Default, Clone)]
pub struct BenchmarkRecordBuilder {
    allocator: String,
    scenario: String,
    alloc_ops_per_sec: f64,
    free_ops_per_sec: f64,
    peak_utilization: f64,
    alloc_ops: Option<u64>,
    counters: Option<RunCounters>,
}

impl BenchmarkRecordBuilder {
    /// Set the allocator name.
    pub fn allocator(mut self, allocator: impl Into<String>) -> Self {
        self.allocator = allocator.into();
        self
    }

    /// Set the scenario name.
    pub fn scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Set the reported allocation throughput.
    pub fn alloc_ops_per_sec(mut self, value: f64) -> Self {
        self.alloc_ops_per_sec = value;
        self
    }

    /// Set the reported free throughput.
    pub fn free_ops_per_sec(mut self, value: f64) -> Self {
        self.free_ops_per_sec = value;
        self
    }

    /// Set the peak utilization ratio.
    pub fn peak_utilization(mut self, value: f64) -> Self {
        self.peak_utilization = value;
        self
    }

    /// Set the allocation count without the other counters.
    pub fn alloc_ops(mut self, count: u64) -> Self {
        self.alloc_ops = Some(count);
        self
    }

    /// Set the allocation count if known.
    pub fn maybe_alloc_ops(mut self, count: Option<u64>) -> Self {
        self.alloc_ops = count;
        self
    }

    /// Attach raw counters.
    pub fn counters(mut self, counters: RunCounters) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Attach raw counters if present.
    pub fn maybe_counters(mut self, counters: Option<RunCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Validate and build the record.
    ///
    /// The allocation count inside the counters wins over one set on its own.
    pub fn build(self) -> Result<BenchmarkRecord, RecordError> {
        if self.allocator.is_empty() {
            return Err(RecordError::EmptyAllocator);
        }
        if self.scenario.is_empty() {
            return Err(RecordError::EmptyScenario);
        }
        if let Some(counters) = &self.counters {
            if !counters.is_valid() {
                return Err(RecordError::InvalidCounters);
            }
        }

        Ok(BenchmarkRecord {
            allocator: self.allocator,
            scenario: self.scenario,
            alloc_ops_per_sec: self.alloc_ops_per_sec,
            free_ops_per_sec: self.free_ops_per_sec,
            peak_utilization: self.peak_utilization,
            alloc_ops: self.counters.map(|c| c.alloc_ops).or(self.alloc_ops),
            counters: self.counters,
        })
    }
}

/// All records read from a single source, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    source: SourceId,
    records: Vec<BenchmarkRecord>,
}

impl ResultSet {
    /// Create a result set.
    pub fn new(source: SourceId, records: Vec<BenchmarkRecord>) -> Self {
        Self { source, records }
    }

    /// Source the records came from.
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Records in input order.
    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A record tagged with the source it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRecord {
    /// Originating source.
    pub source: SourceId,
    /// The record itself.
    #[serde(flatten)]
    pub record: BenchmarkRecord,
}

/// Union of several result sets, kept for cross-run comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedDataset {
    sources: Vec<SourceId>,
    records: Vec<TaggedRecord>,
}

impl CombinedDataset {
    /// Concatenate result sets. Records are neither merged nor deduplicated.
    pub fn from_result_sets<'a>(sets: impl IntoIterator<Item = &'a ResultSet>) -> Self {
        let mut dataset = Self::default();
        for set in sets {
            dataset.sources.push(set.source().clone());
            dataset
                .records
                .extend(set.records().iter().map(|record| TaggedRecord {
                    source: set.source().clone(),
                    record: record.clone(),
                }));
        }
        dataset
    }

    /// Sources in the order they were combined.
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Tagged records in combination order.
    pub fn records(&self) -> &[TaggedRecord] {
        &self.records
    }

    /// Iterate the underlying records without their tags.
    pub fn iter_records(&self) -> impl Iterator<Item = &BenchmarkRecord> {
        self.records.iter().map(|tagged| &tagged.record)
    }

    /// Number of records across all sources.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(allocator: &str, scenario: &str) -> BenchmarkRecord {
        BenchmarkRecord::builder()
            .allocator(allocator)
            .scenario(scenario)
            .alloc_ops_per_sec(1_000_000.0)
            .free_ops_per_sec(2_000_000.0)
            .peak_utilization(0.25)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_rejects_empty_names() {
        let err = BenchmarkRecord::builder().scenario("Sequential").build();
        assert_eq!(err.unwrap_err(), RecordError::EmptyAllocator);

        let err = BenchmarkRecord::builder().allocator("Buddy").build();
        assert_eq!(err.unwrap_err(), RecordError::EmptyScenario);
    }

    #[test]
    fn test_builder_rejects_negative_times() {
        let err = BenchmarkRecord::builder()
            .allocator("Buddy")
            .scenario("Random")
            .counters(RunCounters {
                alloc_ops: 10,
                free_ops: 10,
                alloc_time_us: -1.0,
                free_time_us: 5.0,
            })
            .build();
        assert_eq!(err.unwrap_err(), RecordError::InvalidCounters);
    }

    #[test]
    fn test_phase_accessors() {
        let counters = RunCounters {
            alloc_ops: 7,
            free_ops: 5,
            alloc_time_us: 1.5,
            free_time_us: 2.5,
        };
        assert_eq!(counters.ops(Phase::Alloc), 7);
        assert_eq!(counters.ops(Phase::Free), 5);
        assert_eq!(counters.elapsed_micros(Phase::Free), 2.5);

        let rec = record("Buddy", "Mixed");
        assert_eq!(rec.ops_per_sec(Phase::Free), 2_000_000.0);
        assert!(rec.counters().is_none());
    }

    #[test]
    fn test_alloc_ops_without_counters() {
        let rec = BenchmarkRecord::builder()
            .allocator("Buddy")
            .scenario("Random")
            .alloc_ops(480_000)
            .build()
            .unwrap();
        assert_eq!(rec.alloc_ops(), Some(480_000));
        assert!(rec.counters().is_none());

        let rec = BenchmarkRecord::builder()
            .allocator("Buddy")
            .scenario("Random")
            .alloc_ops(1)
            .counters(RunCounters {
                alloc_ops: 7,
                free_ops: 5,
                alloc_time_us: 1.0,
                free_time_us: 1.0,
            })
            .build()
            .unwrap();
        assert_eq!(rec.alloc_ops(), Some(7));
    }

    #[test]
    fn test_deserialize_validates_like_builder() {
        let rec: BenchmarkRecord = serde_json::from_str(
            r#"{"allocator":"Buddy","scenario":"Random","alloc_ops_per_sec":1.0,"free_ops_per_sec":2.0,"peak_utilization":0.5,"alloc_ops":10}"#,
        )
        .unwrap();
        assert_eq!(rec.alloc_ops(), Some(10));

        let empty = serde_json::from_str::<BenchmarkRecord>(
            r#"{"allocator":"","scenario":"Random","alloc_ops_per_sec":1.0,"free_ops_per_sec":2.0,"peak_utilization":0.5}"#,
        );
        assert!(empty.unwrap_err().to_string().contains("allocator name is empty"));

        let negative = serde_json::from_str::<TaggedRecord>(
            r#"{"source":"a.csv","allocator":"Buddy","scenario":"Random","alloc_ops_per_sec":1.0,"free_ops_per_sec":2.0,"peak_utilization":0.5,"counters":{"alloc_ops":1,"free_ops":1,"alloc_time_us":-3.0,"free_time_us":1.0}}"#,
        );
        assert!(negative.is_err());
    }

    #[test]
    fn test_combined_dataset_keeps_every_record() {
        let a = ResultSet::new(SourceId::new("a.csv"), vec![record("Buddy", "Sequential")]);
        let b = ResultSet::new(SourceId::new("b.csv"), vec![record("Buddy", "Sequential")]);

        let combined = CombinedDataset::from_result_sets([&a, &b]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.sources(), &[SourceId::new("a.csv"), SourceId::new("b.csv")]);
        assert_eq!(combined.records()[1].source.as_str(), "b.csv");
        assert_eq!(a.len(), 1);
    }
}
