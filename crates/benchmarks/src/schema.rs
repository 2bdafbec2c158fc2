//! Column schema for allocator benchmark CSV files.
//!
//! The benchmark harness writes a header row such as:
//!
//! ```text
//! Allocator,Benchmark,AllocTime_us,FreeTime_us,AllocOps,FreeOps,AllocOpsPerSec,FreeOpsPerSec,PeakUtilization
//! ```
//!
//! Only the columns needed for charts are mandatory. The raw counters are
//! optional; without them records cannot be reconciled. `AllocOps` is also
//! resolved on its own since the workload check needs nothing else.

use allocscope_core::{IngestError, SourceId};
use csv::StringRecord;

/// Known input columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// `Allocator`
    Allocator,
    /// `Benchmark`, the scenario name
    Benchmark,
    /// `AllocOps`
    AllocOps,
    /// `FreeOps`
    FreeOps,
    /// `AllocTime_us`
    AllocTimeUs,
    /// `FreeTime_us`
    FreeTimeUs,
    /// `AllocOpsPerSec`
    AllocOpsPerSec,
    /// `FreeOpsPerSec`
    FreeOpsPerSec,
    /// `PeakUtilization`
    PeakUtilization,
}

impl Column {
    /// Mandatory columns, in the order they are reported when missing.
    pub const REQUIRED: [Column; 5] = [
        Column::Allocator,
        Column::Benchmark,
        Column::AllocOpsPerSec,
        Column::FreeOpsPerSec,
        Column::PeakUtilization,
    ];

    /// Columns needed to recompute throughput.
    pub const COUNTERS: [Column; 4] = [
        Column::AllocOps,
        Column::FreeOps,
        Column::AllocTimeUs,
        Column::FreeTimeUs,
    ];

    /// Exact, case-sensitive header name.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Allocator => "Allocator",
            Column::Benchmark => "Benchmark",
            Column::AllocOps => "AllocOps",
            Column::FreeOps => "FreeOps",
            Column::AllocTimeUs => "AllocTime_us",
            Column::FreeTimeUs => "FreeTime_us",
            Column::AllocOpsPerSec => "AllocOpsPerSec",
            Column::FreeOpsPerSec => "FreeOpsPerSec",
            Column::PeakUtilization => "PeakUtilization",
        }
    }
}

/// Positions of the mandatory columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredColumns {
    /// `Allocator` index
    pub allocator: usize,
    /// `Benchmark` index
    pub benchmark: usize,
    /// `AllocOpsPerSec` index
    pub alloc_ops_per_sec: usize,
    /// `FreeOpsPerSec` index
    pub free_ops_per_sec: usize,
    /// `PeakUtilization` index
    pub peak_utilization: usize,
}

/// Positions of the raw counter columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterColumns {
    /// `AllocOps` index
    pub alloc_ops: usize,
    /// `FreeOps` index
    pub free_ops: usize,
    /// `AllocTime_us` index
    pub alloc_time_us: usize,
    /// `FreeTime_us` index
    pub free_time_us: usize,
}

/// Resolved header layout of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    /// Mandatory columns
    pub required: RequiredColumns,
    /// `AllocOps` index, whether or not the other counters are declared
    pub alloc_ops: Option<usize>,
    /// Counter columns, when the header declares all four
    pub counters: Option<CounterColumns>,
}

fn position(headers: &StringRecord, column: Column) -> Option<usize> {
    headers.iter().position(|h| h == column.header())
}

/// Check a header row and resolve column positions.
///
/// Every missing mandatory column is listed in the returned error.
pub fn validate_header(headers: &StringRecord, source: &SourceId) -> Result<ColumnMap, IngestError> {
    let lookup = |column: Column| position(headers, column);

    let (
        Some(allocator),
        Some(benchmark),
        Some(alloc_ops_per_sec),
        Some(free_ops_per_sec),
        Some(peak_utilization),
    ) = (
        lookup(Column::Allocator),
        lookup(Column::Benchmark),
        lookup(Column::AllocOpsPerSec),
        lookup(Column::FreeOpsPerSec),
        lookup(Column::PeakUtilization),
    )
    else {
        let missing = Column::REQUIRED
            .iter()
            .filter(|column| lookup(**column).is_none())
            .map(|column| column.header().to_string())
            .collect();
        return Err(IngestError::Schema {
            source_id: source.clone(),
            missing,
        });
    };

    let required = RequiredColumns {
        allocator,
        benchmark,
        alloc_ops_per_sec,
        free_ops_per_sec,
        peak_utilization,
    };

    let alloc_ops = lookup(Column::AllocOps);
    let counters = match (
        alloc_ops,
        lookup(Column::FreeOps),
        lookup(Column::AllocTimeUs),
        lookup(Column::FreeTimeUs),
    ) {
        (Some(alloc_ops), Some(free_ops), Some(alloc_time_us), Some(free_time_us)) => {
            Some(CounterColumns {
                alloc_ops,
                free_ops,
                alloc_time_us,
                free_time_us,
            })
        }
        _ => None,
    };

    Ok(ColumnMap {
        required,
        alloc_ops,
        counters,
    })
}
