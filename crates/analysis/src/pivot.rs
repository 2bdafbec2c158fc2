// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Pivoted views of per-(allocator, scenario) summaries.

use allocscope_core::{Metric, PivotTable, SummaryStatistic};

fn lookup(summaries: &[SummaryStatistic], allocator: &str, scenario: &str, metric: Metric) -> Option<f64> {
    summaries
        .iter()
        .find(|s| s.allocator == allocator && s.scenario.as_deref() == Some(scenario))
        .map(|s| metric.value(s))
}

/// Scenario-by-allocator table of one metric.
///
/// Rows follow `scenario_order` and columns follow `allocators`, normally the
/// dataset's encounter order. Summaries without a scenario are ignored.
pub fn throughput_pivot(
    summaries: &[SummaryStatistic],
    scenario_order: &[String],
    allocators: &[&str],
    metric: Metric,
) -> PivotTable {
    let columns: Vec<String> = allocators.iter().map(|a| a.to_string()).collect();
    let cells = scenario_order
        .iter()
        .map(|scenario| {
            columns
                .iter()
                .map(|allocator| lookup(summaries, allocator, scenario, metric))
                .collect()
        })
        .collect();

    PivotTable {
        title: metric.title().to_string(),
        metric,
        row_axis: "Benchmark".to_string(),
        column_axis: "Allocator".to_string(),
        row_labels: scenario_order.to_vec(),
        column_labels: columns,
        cells,
    }
}

/// Allocator-by-scenario table of mean peak utilization.
pub fn utilization_pivot(
    summaries: &[SummaryStatistic],
    scenario_order: &[String],
    allocators: &[&str],
) -> PivotTable {
    let rows: Vec<String> = allocators.iter().map(|a| a.to_string()).collect();
    let cells = rows
        .iter()
        .map(|allocator| {
            scenario_order
                .iter()
                .map(|scenario| lookup(summaries, allocator, scenario, Metric::PeakUtilization))
                .collect()
        })
        .collect();

    PivotTable {
        title: Metric::PeakUtilization.title().to_string(),
        metric: Metric::PeakUtilization,
        row_axis: "Allocator".to_string(),
        column_axis: "Benchmark".to_string(),
        row_labels: rows,
        column_labels: scenario_order.to_vec(),
        cells,
    }
}
