// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-allocator workload checks.
//!
//! Throughput comparisons only make sense when every allocator completed the
//! same number of allocations for a scenario. When the counts differ, one
//! [`DiagnosticKind::UnevenWorkloadWarning`] is raised for that scenario.
//!
//! The check spans every record given to it, so results from one file per
//! allocator are compared with each other.

use allocscope_core::{BenchmarkRecord, Diagnostic, DiagnosticKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Allocation counts one allocator reported for a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorOps {
    /// Allocator name
    pub allocator: String,
    /// Distinct `AllocOps` values, in encounter order
    pub alloc_ops: Vec<u64>,
}

/// Allocation counts of every allocator for one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioWorkload {
    /// Scenario name
    pub scenario: String,
    /// Allocators in encounter order
    pub allocators: Vec<AllocatorOps>,
}

impl ScenarioWorkload {
    /// Distinct counts across all allocators, in encounter order.
    pub fn distinct_counts(&self) -> Vec<u64> {
        let mut counts = Vec::new();
        for ops in self.allocators.iter().flat_map(|a| &a.alloc_ops) {
            if !counts.contains(ops) {
                counts.push(*ops);
            }
        }
        counts
    }

    /// Whether allocators disagree on the amount of work.
    pub fn is_uneven(&self) -> bool {
        self.distinct_counts().len() > 1
    }

    fn describe(&self) -> String {
        self.allocators
            .iter()
            .map(|a| {
                let counts: Vec<String> = a.alloc_ops.iter().map(u64::to_string).collect();
                format!("{}={}", a.allocator, counts.join("/"))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Detects scenarios where allocators did unequal work.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadDetector;

impl WorkloadDetector {
    /// Group allocation counts by scenario and allocator.
    ///
    /// Records without an allocation count are ignored.
    pub fn operation_counts<'a>(
        records: impl IntoIterator<Item = &'a BenchmarkRecord>,
    ) -> Vec<ScenarioWorkload> {
        let mut workloads: Vec<ScenarioWorkload> = Vec::new();

        for record in records {
            let Some(alloc_ops) = record.alloc_ops() else {
                continue;
            };

            let workload = match workloads.iter().position(|w| w.scenario == record.scenario()) {
                Some(i) => &mut workloads[i],
                None => {
                    workloads.push(ScenarioWorkload {
                        scenario: record.scenario().to_string(),
                        allocators: Vec::new(),
                    });
                    let last = workloads.len() - 1;
                    &mut workloads[last]
                }
            };

            let entry = match workload
                .allocators
                .iter()
                .position(|a| a.allocator == record.allocator())
            {
                Some(i) => &mut workload.allocators[i],
                None => {
                    workload.allocators.push(AllocatorOps {
                        allocator: record.allocator().to_string(),
                        alloc_ops: Vec::new(),
                    });
                    let last = workload.allocators.len() - 1;
                    &mut workload.allocators[last]
                }
            };

            if !entry.alloc_ops.contains(&alloc_ops) {
                entry.alloc_ops.push(alloc_ops);
            }
        }

        workloads
    }

    /// One warning per scenario whose allocation counts disagree.
    pub fn detect<'a>(records: impl IntoIterator<Item = &'a BenchmarkRecord>) -> Vec<Diagnostic> {
        let workloads = Self::operation_counts(records);
        let diagnostics: Vec<Diagnostic> = workloads
            .iter()
            .filter(|w| w.is_uneven())
            .map(|w| {
                Diagnostic::new(
                    DiagnosticKind::UnevenWorkloadWarning,
                    format!("allocators completed different operation counts: {}", w.describe()),
                )
                .with_scenario(w.scenario.clone())
            })
            .collect();

        debug!(
            scenarios = workloads.len(),
            uneven = diagnostics.len(),
            "Checked cross-allocator workloads"
        );
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocscope_core::RunCounters;

    fn record(allocator: &str, scenario: &str, alloc_ops: u64) -> BenchmarkRecord {
        BenchmarkRecord::builder()
            .allocator(allocator)
            .scenario(scenario)
            .alloc_ops_per_sec(1.0)
            .free_ops_per_sec(1.0)
            .peak_utilization(0.1)
            .counters(RunCounters {
                alloc_ops,
                free_ops: alloc_ops,
                alloc_time_us: 1000.0,
                free_time_us: 1000.0,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_uneven_counts_raise_one_warning() {
        let records = vec![
            record("SegregatedFreeList", "Random", 500_000),
            record("Buddy", "Random", 480_000),
        ];
        let diags = WorkloadDetector::detect(&records);

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnevenWorkloadWarning);
        assert_eq!(diags[0].scenario.as_deref(), Some("Random"));
        assert!(diags[0].allocator.is_none());
        assert!(diags[0].detail.contains("SegregatedFreeList=500000"));
        assert!(diags[0].detail.contains("Buddy=480000"));
    }

    #[test]
    fn test_even_counts_are_clean() {
        let records = vec![
            record("SegregatedFreeList", "Sequential", 100_000),
            record("Buddy", "Sequential", 100_000),
            record("SegregatedFreeList", "Stress", 7),
            record("Buddy", "Stress", 7),
        ];
        assert!(WorkloadDetector::detect(&records).is_empty());
    }

    #[test]
    fn test_one_warning_per_scenario_in_encounter_order() {
        let records = vec![
            record("A", "Stress", 1),
            record("A", "Mixed", 1),
            record("B", "Mixed", 2),
            record("B", "Stress", 2),
            record("C", "Stress", 3),
        ];
        let diags = WorkloadDetector::detect(&records);

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].scenario.as_deref(), Some("Stress"));
        assert_eq!(
            diags[0].detail,
            "allocators completed different operation counts: A=1, B=2, C=3"
        );
        assert_eq!(diags[1].scenario.as_deref(), Some("Mixed"));
    }

    #[test]
    fn test_single_allocator_with_varying_counts() {
        let records = vec![record("A", "Random", 10), record("A", "Random", 12)];
        let workloads = WorkloadDetector::operation_counts(&records);

        assert_eq!(workloads[0].allocators[0].alloc_ops, vec![10, 12]);
        assert!(workloads[0].is_uneven());
        assert!(WorkloadDetector::detect(&records)[0].detail.contains("A=10/12"));
    }

    #[test]
    fn test_alloc_ops_alone_is_enough() {
        let partial = BenchmarkRecord::builder()
            .allocator("Buddy")
            .scenario("Random")
            .alloc_ops_per_sec(1.0)
            .free_ops_per_sec(1.0)
            .peak_utilization(0.1)
            .alloc_ops(480_000)
            .build()
            .unwrap();
        let records = vec![record("SegregatedFreeList", "Random", 500_000), partial];

        let diags = WorkloadDetector::detect(&records);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("Buddy=480000"));
    }

    #[test]
    fn test_records_without_counters_are_ignored() {
        let bare = BenchmarkRecord::builder()
            .allocator("Buddy")
            .scenario("Random")
            .alloc_ops_per_sec(1.0)
            .free_ops_per_sec(1.0)
            .peak_utilization(0.1)
            .build()
            .unwrap();
        let records = vec![record("SegregatedFreeList", "Random", 500_000), bare];

        let workloads = WorkloadDetector::operation_counts(&records);
        assert_eq!(workloads[0].allocators.len(), 1);
        assert!(WorkloadDetector::detect(&records).is_empty());
    }
}
