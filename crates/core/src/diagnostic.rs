// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Advisory diagnostics.
//!
//! Diagnostics describe data-quality concerns found while ingesting or
//! checking records. They never remove or alter records; callers collect them
//! into a side list and decide how to present them.

use crate::record::{Phase, SourceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A single row could not be parsed and was skipped.
    RowParseWarning,
    /// Reported throughput disagrees with the throughput recomputed from counters.
    ThroughputMismatch,
    /// The measured window was too short to yield a stable rate.
    ShortMeasurementWarning,
    /// Allocators completed different operation counts for the same scenario.
    UnevenWorkloadWarning,
}

impl DiagnosticKind {
    /// Stable name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RowParseWarning => "RowParseWarning",
            Self::ThroughputMismatch => "ThroughputMismatch",
            Self::ShortMeasurementWarning => "ShortMeasurementWarning",
            Self::UnevenWorkloadWarning => "UnevenWorkloadWarning",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, non-fatal warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic category
    pub kind: DiagnosticKind,
    /// Allocator the warning concerns, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocator: Option<String>,
    /// Scenario the warning concerns, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Human-readable explanation
    pub detail: String,
    /// Source the offending data came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
    /// Benchmark phase, for per-phase checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

impl Diagnostic {
    /// Create a diagnostic with only a kind and detail.
    pub fn new(kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            allocator: None,
            scenario: None,
            detail: detail.into(),
            source: None,
            phase: None,
        }
    }

    /// Attach the allocator name.
    pub fn with_allocator(mut self, allocator: impl Into<String>) -> Self {
        self.allocator = Some(allocator.into());
        self
    }

    /// Attach the scenario name.
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// Attach the source.
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach the phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attach the source unless one is already set.
    pub fn or_source(mut self, source: &SourceId) -> Self {
        if self.source.is_none() {
            self.source = Some(source.clone());
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(source) = &self.source {
            write!(f, " {}", source)?;
        }
        match (&self.allocator, &self.scenario) {
            (Some(allocator), Some(scenario)) => write!(f, " {}/{}", allocator, scenario)?,
            (Some(allocator), None) => write!(f, " {}", allocator)?,
            (None, Some(scenario)) => write!(f, " {}", scenario)?,
            (None, None) => {}
        }
        if let Some(phase) = self.phase {
            write!(f, " ({})", phase)?;
        }
        write!(f, ": {}", self.detail)
    }
}

/// Count diagnostics of one kind.
pub fn count_kind(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> usize {
    diagnostics.iter().filter(|d| d.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let diag = Diagnostic::new(DiagnosticKind::ThroughputMismatch, "off by 2%")
            .with_allocator("Buddy")
            .with_scenario("Random")
            .with_source(SourceId::new("run1.csv"))
            .with_phase(Phase::Alloc);

        assert_eq!(
            diag.to_string(),
            "[ThroughputMismatch] run1.csv Buddy/Random (alloc): off by 2%"
        );
    }

    #[test]
    fn test_or_source_keeps_existing() {
        let diag = Diagnostic::new(DiagnosticKind::RowParseWarning, "bad row")
            .with_source(SourceId::new("first.csv"))
            .or_source(&SourceId::new("second.csv"));
        assert_eq!(diag.source.unwrap().as_str(), "first.csv");
    }

    #[test]
    fn test_serialization_skips_missing_context() {
        let diag = Diagnostic::new(DiagnosticKind::UnevenWorkloadWarning, "counts differ")
            .with_scenario("Stress");
        let json = serde_json::to_value(&diag).unwrap();

        assert_eq!(json["kind"], "UnevenWorkloadWarning");
        assert_eq!(json["scenario"], "Stress");
        assert!(json.get("allocator").is_none());
        assert!(json.get("phase").is_none());
    }

    #[test]
    fn test_count_kind() {
        let diags = vec![
            Diagnostic::new(DiagnosticKind::RowParseWarning, "a"),
            Diagnostic::new(DiagnosticKind::ThroughputMismatch, "b"),
            Diagnostic::new(DiagnosticKind::RowParseWarning, "c"),
        ];
        assert_eq!(count_kind(&diags, DiagnosticKind::RowParseWarning), 2);
        assert_eq!(count_kind(&diags, DiagnosticKind::ShortMeasurementWarning), 0);
    }
}
