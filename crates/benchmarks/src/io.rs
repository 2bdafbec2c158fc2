//! I/O operations for benchmark results.
//!
//! This module reads allocator benchmark CSV files into result sets and
//! writes finished reports back to the filesystem.
//!
//! Reading follows a partial-failure policy: a source that cannot be read,
//! or whose header lacks a mandatory column, fails as a whole; a single
//! malformed row is skipped and reported as a
//! [`RowParseWarning`](allocscope_core::DiagnosticKind::RowParseWarning).

use crate::result::{Ingested, SourceOutcome};
use crate::schema::{validate_header, Column, ColumnMap, CounterColumns};
use allocscope_core::error::IngestResult;
use allocscope_core::{
    BenchmarkRecord, Diagnostic, DiagnosticKind, IngestError, ResultSet, RunCounters, SourceId,
};
use csv::StringRecord;
use futures::future::join_all;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read benchmark results from any reader.
pub fn read_results<R: io::Read>(reader: R, source: SourceId) -> IngestResult<Ingested> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| IngestError::input(&source, e))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(IngestError::input(&source, "no header row"));
    }

    let columns = validate_header(&headers, &source)?;
    if columns.counters.is_none() {
        let absent: Vec<&str> = Column::COUNTERS
            .iter()
            .map(Column::header)
            .filter(|name| !headers.iter().any(|h| h == *name))
            .collect();
        debug!(source = %source, absent = ?absent, "Counter columns absent, records will not be reconciled");
    }

    let mut records = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, row) in csv_reader.records().enumerate() {
        let row_number = index + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(IngestError::input(&source, e)),
            Err(e) => {
                warn!(source = %source, row = row_number, error = %e, "Skipping unreadable row");
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::RowParseWarning,
                        format!("row {}: {}", row_number, e),
                    )
                    .with_source(source.clone()),
                );
                continue;
            }
        };

        match parse_row(&row, &columns) {
            Ok(record) => records.push(record),
            Err(rejected) => {
                warn!(source = %source, row = row_number, reason = %rejected.reason, "Skipping malformed row");
                let mut diag = Diagnostic::new(
                    DiagnosticKind::RowParseWarning,
                    format!("row {}: {}", row_number, rejected.reason),
                )
                .with_source(source.clone());
                if let Some(allocator) = rejected.allocator {
                    diag = diag.with_allocator(allocator);
                }
                if let Some(scenario) = rejected.scenario {
                    diag = diag.with_scenario(scenario);
                }
                diagnostics.push(diag);
            }
        }
    }

    debug!(
        source = %source,
        records = records.len(),
        skipped = diagnostics.len(),
        "Ingested benchmark results"
    );

    Ok(Ingested {
        result_set: ResultSet::new(source, records),
        diagnostics,
    })
}

/// Read benchmark results from in-memory CSV text.
pub fn read_results_str(text: &str, source: SourceId) -> IngestResult<Ingested> {
    read_results(text.as_bytes(), source)
}

/// Read benchmark results from a CSV file.
pub fn read_results_file(path: impl AsRef<Path>) -> IngestResult<Ingested> {
    let path = path.as_ref();
    let source = source_for(path);
    let file = fs::File::open(path).map_err(|e| IngestError::input(&source, e))?;
    read_results(file, source)
}

/// Ingest several files concurrently.
///
/// Each file is parsed on the blocking pool; outcomes come back in the order
/// of `paths`, one per path, whether it succeeded or not.
pub async fn ingest_sources<P: AsRef<Path>>(paths: &[P]) -> Vec<SourceOutcome> {
    let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    let tasks = paths.iter().cloned().map(|path| {
        tokio::task::spawn_blocking(move || read_results_file(&path))
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(&paths)
        .map(|(joined, path)| {
            let source = source_for(path);
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(IngestError::input(&source, format!("ingestion task failed: {}", e))),
            };
            if let Err(err) = &result {
                warn!(source = %source, error = %err, "Source could not be ingested");
            }
            SourceOutcome { source, result }
        })
        .collect()
}

/// Source identifier used for a file path.
pub fn source_for(path: &Path) -> SourceId {
    SourceId::new(path.display().to_string())
}

/// A row that could not become a record, with whatever context was readable.
#[derive(Debug)]
struct RejectedRow {
    allocator: Option<String>,
    scenario: Option<String>,
    reason: String,
}

fn parse_row(row: &StringRecord, columns: &ColumnMap) -> Result<BenchmarkRecord, RejectedRow> {
    let required = &columns.required;
    let allocator = row.get(required.allocator).filter(|s| !s.is_empty());
    let scenario = row.get(required.benchmark).filter(|s| !s.is_empty());
    let reject = |reason: String| RejectedRow {
        allocator: allocator.map(str::to_string),
        scenario: scenario.map(str::to_string),
        reason,
    };

    let (Some(allocator_name), Some(scenario_name)) = (allocator, scenario) else {
        let column = if allocator.is_none() {
            Column::Allocator
        } else {
            Column::Benchmark
        };
        return Err(reject(format!("missing value for column {}", column.header())));
    };

    let alloc_ops_per_sec =
        parse_metric(row, required.alloc_ops_per_sec, Column::AllocOpsPerSec).map_err(&reject)?;
    let free_ops_per_sec =
        parse_metric(row, required.free_ops_per_sec, Column::FreeOpsPerSec).map_err(&reject)?;
    let peak_utilization =
        parse_metric(row, required.peak_utilization, Column::PeakUtilization).map_err(&reject)?;

    let counters = columns
        .counters
        .as_ref()
        .map(|c| parse_counters(row, c))
        .transpose()
        .map_err(&reject)?;
    let alloc_ops = match columns.alloc_ops {
        Some(index) if counters.is_none() => {
            Some(parse_count(row, index, Column::AllocOps).map_err(&reject)?)
        }
        _ => None,
    };

    BenchmarkRecord::builder()
        .allocator(allocator_name)
        .scenario(scenario_name)
        .alloc_ops_per_sec(alloc_ops_per_sec)
        .free_ops_per_sec(free_ops_per_sec)
        .peak_utilization(peak_utilization)
        .maybe_alloc_ops(alloc_ops)
        .maybe_counters(counters)
        .build()
        .map_err(|e| reject(e.to_string()))
}

fn non_empty_cell<'r>(row: &'r StringRecord, index: usize, column: Column) -> Result<&'r str, String> {
    row.get(index)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing value for column {}", column.header()))
}

fn parse_metric(row: &StringRecord, index: usize, column: Column) -> Result<f64, String> {
    let cell = non_empty_cell(row, index, column)?;
    let value: f64 = cell
        .parse()
        .map_err(|_| format!("column {}: cannot parse '{}' as a number", column.header(), cell))?;
    if !value.is_finite() {
        return Err(format!("column {}: '{}' is not a finite number", column.header(), cell));
    }
    Ok(value)
}

fn parse_counters(row: &StringRecord, columns: &CounterColumns) -> Result<RunCounters, String> {
    Ok(RunCounters {
        alloc_ops: parse_count(row, columns.alloc_ops, Column::AllocOps)?,
        free_ops: parse_count(row, columns.free_ops, Column::FreeOps)?,
        alloc_time_us: parse_micros(row, columns.alloc_time_us, Column::AllocTimeUs)?,
        free_time_us: parse_micros(row, columns.free_time_us, Column::FreeTimeUs)?,
    })
}

/// Operation counts are integers, but tolerate integral floats such as `1000.0`.
fn parse_count(row: &StringRecord, index: usize, column: Column) -> Result<u64, String> {
    let cell = non_empty_cell(row, index, column)?;
    if let Ok(count) = cell.parse::<u64>() {
        return Ok(count);
    }
    match cell.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value <= u64::MAX as f64 =>
        {
            Ok(value as u64)
        }
        _ => Err(format!("column {}: cannot parse '{}' as a count", column.header(), cell)),
    }
}

fn parse_micros(row: &StringRecord, index: usize, column: Column) -> Result<f64, String> {
    let cell = non_empty_cell(row, index, column)?;
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(format!(
            "column {}: '{}' is not a non-negative duration",
            column.header(),
            cell
        )),
    }
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    write_text(&json, path)
}

/// Write a rendered text report, creating parent directories as needed.
pub fn write_text(text: &str, path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
}
