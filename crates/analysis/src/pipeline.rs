// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end analysis of ingested result sets.
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Pipeline::new(config);
//! let report = pipeline.run(&result_sets, ingest_diagnostics)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

use crate::aggregate::{
    allocators_in_encounter_order, combine, summarize_by_allocator,
    summarize_by_allocator_and_scenario,
};
use crate::anomaly::WorkloadDetector;
use crate::ordering::ScenarioOrdering;
use crate::pivot::{throughput_pivot, utilization_pivot};
use crate::reconcile::Reconciler;
use allocscope_core::diagnostic::count_kind;
use allocscope_core::error::AggregationResult;
use allocscope_core::{
    AnalysisConfig, BenchmarkRecord, CombinedDataset, Diagnostic, DiagnosticKind, FailedSource,
    Metric, PivotTable, ResultSet, SourceId, SummaryStatistic,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Sources that contributed records, in input order
    pub sources: Vec<SourceId>,
    /// Sources skipped after a fatal error
    pub failed_sources: Vec<FailedSource>,
    /// Total records across sources
    pub record_count: usize,
    /// Scenario display order
    pub scenario_order: Vec<String>,
    /// Per-(allocator, scenario) means, scenario-major
    pub by_scenario: Vec<SummaryStatistic>,
    /// Per-allocator means
    pub by_allocator: Vec<SummaryStatistic>,
    /// Allocation throughput, free throughput and utilization tables
    pub pivots: Vec<PivotTable>,
    /// Ingestion warnings followed by check results
    pub diagnostics: Vec<Diagnostic>,
    /// Combined records
    #[serde(skip)]
    pub dataset: CombinedDataset,
}

impl AnalysisReport {
    /// Number of diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        count_kind(&self.diagnostics, kind)
    }

    /// Record sources that were skipped.
    pub fn with_failures(mut self, failures: Vec<FailedSource>) -> Self {
        self.failed_sources = failures;
        self
    }
}

/// Runs the checks and aggregation over a batch of result sets.
#[derive(Debug, Clone)]
pub struct Pipeline {
    reconciler: Reconciler,
    ordering: ScenarioOrdering,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl Pipeline {
    /// Create a pipeline with the given thresholds.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            reconciler: Reconciler::new(&config),
            ordering: ScenarioOrdering::from_config(&config),
        }
    }

    /// Scenario ordering in use.
    pub fn ordering(&self) -> &ScenarioOrdering {
        &self.ordering
    }

    /// Reconcile each result set on its own.
    ///
    /// Diagnostics are tagged with their source and returned in source order.
    pub fn reconcile(&self, result_sets: &[ResultSet]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for set in result_sets {
            let before = diagnostics.len();
            diagnostics.extend(
                self.reconciler
                    .reconcile(set.records())
                    .into_iter()
                    .map(|d| d.or_source(set.source())),
            );
            debug!(
                source = %set.source(),
                records = set.len(),
                diagnostics = diagnostics.len() - before,
                "Reconciled result set"
            );
        }
        diagnostics
    }

    /// Compare allocation counts across every result set at once.
    ///
    /// Warnings span sources and carry no source tag.
    pub fn check_workloads(&self, result_sets: &[ResultSet]) -> Vec<Diagnostic> {
        WorkloadDetector::detect(result_sets.iter().flat_map(|set| set.records()))
    }

    /// Reconciliation followed by the workload check.
    pub fn check(&self, result_sets: &[ResultSet]) -> Vec<Diagnostic> {
        let mut diagnostics = self.reconcile(result_sets);
        diagnostics.extend(self.check_workloads(result_sets));
        diagnostics
    }

    /// Run every stage.
    ///
    /// `ingest_diagnostics` are placed ahead of the check results.
    pub fn run(
        &self,
        result_sets: &[ResultSet],
        ingest_diagnostics: Vec<Diagnostic>,
    ) -> AggregationResult<AnalysisReport> {
        let dataset = combine(result_sets);

        let mut diagnostics = ingest_diagnostics;
        diagnostics.extend(self.reconcile(result_sets));
        diagnostics.extend(WorkloadDetector::detect(dataset.iter_records()));

        let scenario_order = self
            .ordering
            .order(dataset.iter_records().map(BenchmarkRecord::scenario));
        let by_scenario = summarize_by_allocator_and_scenario(&dataset, &self.ordering)?;
        let by_allocator = summarize_by_allocator(&dataset)?;

        let allocators = allocators_in_encounter_order(&dataset);
        let pivots = vec![
            throughput_pivot(&by_scenario, &scenario_order, &allocators, Metric::AllocOpsPerSec),
            throughput_pivot(&by_scenario, &scenario_order, &allocators, Metric::FreeOpsPerSec),
            utilization_pivot(&by_scenario, &scenario_order, &allocators),
        ];

        info!(
            sources = dataset.sources().len(),
            records = dataset.len(),
            groups = by_scenario.len(),
            diagnostics = diagnostics.len(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            sources: dataset.sources().to_vec(),
            failed_sources: Vec::new(),
            record_count: dataset.len(),
            scenario_order,
            by_scenario,
            by_allocator,
            pivots,
            diagnostics,
            dataset,
        })
    }
}
