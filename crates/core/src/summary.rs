// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregated views handed to report writers and renderers.

use serde::{Deserialize, Serialize};

/// Mean metrics for one allocator, optionally restricted to one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistic {
    /// Allocator name
    pub allocator: String,
    /// Scenario name; `None` for summaries across all scenarios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Mean reported allocation throughput
    pub mean_alloc_ops_per_sec: f64,
    /// Mean reported free throughput
    pub mean_free_ops_per_sec: f64,
    /// Mean peak utilization
    pub mean_peak_utilization: f64,
    /// Number of records behind the means
    pub sample_count: usize,
}

/// Metric selectable from a [`SummaryStatistic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Allocation throughput (ops/sec)
    AllocOpsPerSec,
    /// Free throughput (ops/sec)
    FreeOpsPerSec,
    /// Peak requested bytes over heap size
    PeakUtilization,
}

impl Metric {
    /// Read this metric's mean from a summary.
    pub fn value(&self, stat: &SummaryStatistic) -> f64 {
        match self {
            Metric::AllocOpsPerSec => stat.mean_alloc_ops_per_sec,
            Metric::FreeOpsPerSec => stat.mean_free_ops_per_sec,
            Metric::PeakUtilization => stat.mean_peak_utilization,
        }
    }

    /// Display title for tables.
    pub fn title(&self) -> &'static str {
        match self {
            Metric::AllocOpsPerSec => "Allocation Throughput (ops/sec)",
            Metric::FreeOpsPerSec => "Free Throughput (ops/sec)",
            Metric::PeakUtilization => "Peak Utilization Factor",
        }
    }
}

/// Dense two-dimensional view of one metric.
///
/// `cells[row][column]` is `None` where no group backs the combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    /// Table title
    pub title: String,
    /// Metric shown in the cells
    pub metric: Metric,
    /// Name of the row axis (e.g. "Benchmark")
    pub row_axis: String,
    /// Name of the column axis (e.g. "Allocator")
    pub column_axis: String,
    /// Row labels in display order
    pub row_labels: Vec<String>,
    /// Column labels in display order
    pub column_labels: Vec<String>,
    /// Cell values, row-major
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    /// Look up a cell by labels.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == column)?;
        self.cells.get(r)?.get(c).copied().flatten()
    }

    /// Whether the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.column_labels.is_empty()
    }
}
