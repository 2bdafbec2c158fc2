//! Ingestion result types.
//!
//! A successfully read source yields its records together with the row-level
//! warnings raised while reading it.

use allocscope_core::{Diagnostic, IngestError, ResultSet, SourceId};

/// Records read from one source plus the warnings raised on the way.
#[derive(Debug, Clone)]
pub struct Ingested {
    /// Parsed records.
    pub result_set: ResultSet,
    /// Row-level warnings, in row order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Ingested {
    /// Source the records came from.
    pub fn source(&self) -> &SourceId {
        self.result_set.source()
    }
}

/// Outcome of ingesting one source among several.
#[derive(Debug)]
pub struct SourceOutcome {
    /// Source that was attempted.
    pub source: SourceId,
    /// Parsed data, or the fatal error for this source.
    pub result: Result<Ingested, IngestError>,
}

impl SourceOutcome {
    /// Whether the source was ingested.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Successful and failed sources, each in input order.
#[derive(Debug, Default)]
pub struct PartitionedOutcomes {
    /// Ingested sources.
    pub ingested: Vec<Ingested>,
    /// Sources that failed fatally.
    pub failed: Vec<IngestError>,
}

/// Split outcomes into successes and failures.
pub fn partition(outcomes: Vec<SourceOutcome>) -> PartitionedOutcomes {
    let mut parts = PartitionedOutcomes::default();
    for outcome in outcomes {
        match outcome.result {
            Ok(ingested) => parts.ingested.push(ingested),
            Err(err) => parts.failed.push(err),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_keeps_order() {
        let ok = |name: &str| SourceOutcome {
            source: SourceId::new(name),
            result: Ok(Ingested {
                result_set: ResultSet::new(SourceId::new(name), Vec::new()),
                diagnostics: Vec::new(),
            }),
        };
        let failed = SourceOutcome {
            source: SourceId::new("bad.csv"),
            result: Err(IngestError::input(&SourceId::new("bad.csv"), "unreadable")),
        };

        let parts = partition(vec![ok("a.csv"), failed, ok("b.csv")]);
        assert_eq!(parts.ingested.len(), 2);
        assert_eq!(parts.ingested[1].source().as_str(), "b.csv");
        assert_eq!(parts.failed.len(), 1);
        assert_eq!(parts.failed[0].source_id().as_str(), "bad.csv");
    }
}
