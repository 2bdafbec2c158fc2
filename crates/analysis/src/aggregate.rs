// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregation of benchmark records into mean statistics.

use crate::ordering::ScenarioOrdering;
use allocscope_core::error::AggregationResult;
use allocscope_core::{AggregationError, BenchmarkRecord, CombinedDataset, ResultSet, SummaryStatistic};
use std::collections::HashMap;
use tracing::debug;

/// Concatenate result sets without merging or deduplicating records.
pub fn combine(result_sets: &[ResultSet]) -> CombinedDataset {
    let dataset = CombinedDataset::from_result_sets(result_sets);
    debug!(
        sources = dataset.sources().len(),
        records = dataset.len(),
        "Combined result sets"
    );
    dataset
}

/// Mean metrics of one group.
///
/// Fails with [`AggregationError::EmptyGroup`] when `records` is empty.
pub fn summarize_group<'a, I>(
    allocator: &str,
    scenario: Option<&str>,
    records: I,
) -> AggregationResult<SummaryStatistic>
where
    I: IntoIterator<Item = &'a BenchmarkRecord>,
{
    let mut count = 0usize;
    let mut alloc = 0.0;
    let mut free = 0.0;
    let mut peak = 0.0;

    for record in records {
        count += 1;
        alloc += record.alloc_ops_per_sec();
        free += record.free_ops_per_sec();
        peak += record.peak_utilization();
    }

    if count == 0 {
        return Err(AggregationError::EmptyGroup {
            allocator: allocator.to_string(),
            scenario: scenario.map(str::to_string),
        });
    }

    let n = count as f64;
    Ok(SummaryStatistic {
        allocator: allocator.to_string(),
        scenario: scenario.map(str::to_string),
        mean_alloc_ops_per_sec: alloc / n,
        mean_free_ops_per_sec: free / n,
        mean_peak_utilization: peak / n,
        sample_count: count,
    })
}

/// Distinct allocators in encounter order.
pub fn allocators_in_encounter_order(dataset: &CombinedDataset) -> Vec<&str> {
    let mut allocators: Vec<&str> = Vec::new();
    for record in dataset.iter_records() {
        if !allocators.contains(&record.allocator()) {
            allocators.push(record.allocator());
        }
    }
    allocators
}

/// Mean statistics per `(allocator, scenario)`.
///
/// Scenarios follow `ordering`; allocators within a scenario follow encounter
/// order. An empty dataset gives an empty result.
pub fn summarize_by_allocator_and_scenario(
    dataset: &CombinedDataset,
    ordering: &ScenarioOrdering,
) -> AggregationResult<Vec<SummaryStatistic>> {
    let mut groups: HashMap<(&str, &str), Vec<&BenchmarkRecord>> = HashMap::new();
    for record in dataset.iter_records() {
        groups
            .entry((record.allocator(), record.scenario()))
            .or_default()
            .push(record);
    }

    let allocators = allocators_in_encounter_order(dataset);
    let scenarios = ordering.order(dataset.iter_records().map(BenchmarkRecord::scenario));

    let mut summaries = Vec::with_capacity(groups.len());
    for scenario in &scenarios {
        for allocator in &allocators {
            if let Some(records) = groups.get(&(*allocator, scenario.as_str())) {
                summaries.push(summarize_group(
                    allocator,
                    Some(scenario.as_str()),
                    records.iter().copied(),
                )?);
            }
        }
    }

    debug!(groups = summaries.len(), "Summarized by allocator and scenario");
    Ok(summaries)
}

/// Mean statistics per allocator across all scenarios, in encounter order.
pub fn summarize_by_allocator(dataset: &CombinedDataset) -> AggregationResult<Vec<SummaryStatistic>> {
    allocators_in_encounter_order(dataset)
        .into_iter()
        .map(|allocator| {
            summarize_group(
                allocator,
                None,
                dataset.iter_records().filter(|r| r.allocator() == allocator),
            )
        })
        .collect()
}
