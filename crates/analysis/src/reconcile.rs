// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Throughput reconciliation.
//!
//! Reported `ops/sec` values are recomputed from the raw operation counts and
//! elapsed times. Disagreements beyond the configured relative threshold are
//! reported as [`DiagnosticKind::ThroughputMismatch`]; measurement windows
//! that are too short to be trusted are reported as
//! [`DiagnosticKind::ShortMeasurementWarning`].
//!
//! Nothing here alters or drops a record.

use allocscope_core::{AnalysisConfig, BenchmarkRecord, Diagnostic, DiagnosticKind, Phase};
use std::collections::HashSet;
use tracing::debug;

const PHASES: [Phase; 2] = [Phase::Alloc, Phase::Free];

/// Throughput implied by `ops` completed in `micros` microseconds.
///
/// A zero-length window yields `+inf`.
pub fn calculated_throughput(ops: u64, micros: f64) -> f64 {
    if micros == 0.0 {
        return f64::INFINITY;
    }
    ops as f64 / (micros * 1e-6)
}

/// Relative difference between two values.
///
/// The deviation is measured against the smaller magnitude, floored at
/// `epsilon`, so `reldiff(1_000_000, 990_000)` is `0.0101...`. Equal values
/// (including equal infinities) give `0`; if only one side is finite the
/// result is `+inf`.
///
/// The denominator is deliberately not `max(|a|, |b|, epsilon)`: with it,
/// 1,000,000 against 990,000 comes out at exactly `0.01` and a 1% deviation
/// would not be flagged at the default threshold.
pub fn reldiff(a: f64, b: f64, epsilon: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    if !a.is_finite() || !b.is_finite() {
        return f64::INFINITY;
    }
    (a - b).abs() / a.abs().min(b.abs()).max(epsilon)
}

/// Cross-checks records against their raw counters.
#[derive(Debug, Clone)]
pub struct Reconciler {
    mismatch_threshold: f64,
    short_measurement_micros: f64,
    epsilon: f64,
    canonical: HashSet<String>,
}

impl Reconciler {
    /// Create a reconciler from the analysis thresholds.
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            mismatch_threshold: config.mismatch_threshold,
            short_measurement_micros: config.short_measurement_micros,
            epsilon: config.reldiff_epsilon,
            canonical: config.canonical_scenarios.iter().cloned().collect(),
        }
    }

    /// Check every record, in order.
    pub fn reconcile(&self, records: &[BenchmarkRecord]) -> Vec<Diagnostic> {
        let diagnostics: Vec<Diagnostic> = records.iter().flat_map(|r| self.check(r)).collect();
        debug!(
            records = records.len(),
            diagnostics = diagnostics.len(),
            "Reconciled throughput"
        );
        diagnostics
    }

    /// Check a single record.
    ///
    /// Records without raw counters are skipped.
    pub fn check(&self, record: &BenchmarkRecord) -> Vec<Diagnostic> {
        let Some(counters) = record.counters() else {
            return Vec::new();
        };

        let mut diagnostics = Vec::new();

        for phase in PHASES {
            let ops = counters.ops(phase);
            let micros = counters.elapsed_micros(phase);
            let calculated = calculated_throughput(ops, micros);
            let reported = record.ops_per_sec(phase);
            let deviation = reldiff(calculated, reported, self.epsilon);

            // NaN never compares greater, so a failed computation is skipped.
            if deviation > self.mismatch_threshold {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::ThroughputMismatch,
                        format!(
                            "reported {:.0} ops/sec but {} ops in {} us gives {:.0} ops/sec (deviation {})",
                            reported,
                            ops,
                            micros,
                            calculated,
                            format_deviation(deviation)
                        ),
                    )
                    .with_allocator(record.allocator())
                    .with_scenario(record.scenario())
                    .with_phase(phase),
                );
            }
        }

        if self.canonical.contains(record.scenario()) {
            for phase in PHASES {
                let micros = counters.elapsed_micros(phase);
                if micros < self.short_measurement_micros {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::ShortMeasurementWarning,
                            format!(
                                "{} phase took {} us, below {} us",
                                phase, micros, self.short_measurement_micros
                            ),
                        )
                        .with_allocator(record.allocator())
                        .with_scenario(record.scenario())
                        .with_phase(phase),
                    );
                }
            }
        }

        diagnostics
    }
}

fn format_deviation(deviation: f64) -> String {
    if deviation.is_finite() {
        format!("{:.2}%", deviation * 100.0)
    } else {
        "unbounded".to_string()
    }
}
