//! Markdown output generation for benchmark analysis.
//!
//! This module renders the aggregated views (pivot tables, per-group
//! summaries, the summary block and diagnostics) as a Markdown document.
//! It works on plain data and knows nothing about how it was computed.

use allocscope_core::{Diagnostic, FailedSource, Metric, PivotTable, SourceId, SummaryStatistic};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

/// Everything a report shows.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    /// Document title
    pub title: &'a str,
    /// Generation time
    pub generated_at: DateTime<Utc>,
    /// Sources that contributed records
    pub sources: &'a [SourceId],
    /// Sources that failed fatally
    pub failures: &'a [FailedSource],
    /// Scenario display order
    pub scenario_order: &'a [String],
    /// Pivot tables, in display order
    pub pivots: &'a [PivotTable],
    /// Per-(allocator, scenario) summaries
    pub by_scenario: &'a [SummaryStatistic],
    /// Per-allocator summaries
    pub by_allocator: &'a [SummaryStatistic],
    /// Advisory diagnostics
    pub diagnostics: &'a [Diagnostic],
}

/// Markdown rendering of a [`ReportView`].
pub struct MarkdownReport<'a>(pub ReportView<'a>);

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = &self.0;

        writeln!(f, "# {}", view.title)?;
        writeln!(f)?;
        writeln!(f, "Generated: {}", view.generated_at.to_rfc3339())?;
        writeln!(f)?;

        writeln!(f, "## Sources")?;
        writeln!(f)?;
        for source in view.sources {
            writeln!(f, "- {}", source)?;
        }
        for failure in view.failures {
            writeln!(f, "- {} (failed: {})", failure.source, failure.reason)?;
        }
        writeln!(f)?;

        if !view.scenario_order.is_empty() {
            writeln!(f, "Scenario order: {}", view.scenario_order.join(", "))?;
            writeln!(f)?;
        }

        for pivot in view.pivots {
            writeln!(f, "## {}", pivot.title)?;
            writeln!(f)?;
            write_pivot(f, pivot)?;
            writeln!(f)?;
        }

        writeln!(f, "## Results by Allocator and Benchmark")?;
        writeln!(f)?;
        writeln!(
            f,
            "| Benchmark | Allocator | Alloc ops/sec | Free ops/sec | Peak util | Samples |"
        )?;
        writeln!(f, "|-----------|-----------|---------------|--------------|-----------|---------|")?;
        for stat in view.by_scenario {
            writeln!(
                f,
                "| {} | {} | {} | {} | {:.4} | {} |",
                stat.scenario.as_deref().unwrap_or("*"),
                stat.allocator,
                format_thousands(stat.mean_alloc_ops_per_sec),
                format_thousands(stat.mean_free_ops_per_sec),
                stat.mean_peak_utilization,
                stat.sample_count
            )?;
        }
        writeln!(f)?;

        writeln!(f, "## Summary")?;
        writeln!(f)?;
        writeln!(f, "```text")?;
        f.write_str(&summary_block(view.by_allocator))?;
        writeln!(f, "```")?;
        writeln!(f)?;

        writeln!(f, "## Diagnostics")?;
        writeln!(f)?;
        if view.diagnostics.is_empty() {
            writeln!(f, "No diagnostics.")?;
        } else {
            for diagnostic in view.diagnostics {
                writeln!(f, "- {}", diagnostic)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(
            f,
            "Total groups: {}, diagnostics: {}",
            view.by_scenario.len(),
            view.diagnostics.len()
        )
    }
}

/// Generate a Markdown report.
pub fn generate_report(view: ReportView<'_>) -> String {
    MarkdownReport(view).to_string()
}

/// Render one pivot table as a Markdown table.
pub fn render_pivot(table: &PivotTable) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_pivot(&mut out, table);
    out
}

fn write_pivot(out: &mut impl Write, table: &PivotTable) -> fmt::Result {
    write!(out, "| {} |", table.row_axis)?;
    for column in &table.column_labels {
        write!(out, " {} |", column)?;
    }
    writeln!(out)?;

    write!(out, "|---|")?;
    for _ in &table.column_labels {
        write!(out, "---|")?;
    }
    writeln!(out)?;

    for (label, row) in table.row_labels.iter().zip(&table.cells) {
        write!(out, "| {} |", label)?;
        for cell in row {
            match cell {
                Some(value) => write!(out, " {} |", format_metric(table.metric, *value))?,
                None => write!(out, " - |")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Plain-text summary block, one paragraph per allocator.
///
/// ```text
/// Summary Statistics
///
/// Buddy:
///   Avg alloc ops/sec: 1,100,000
///   Avg free ops/sec:  2,000,000
///   Avg peak util:     0.0122
/// ```
pub fn summary_block(by_allocator: &[SummaryStatistic]) -> String {
    let mut text = String::from("Summary Statistics\n\n");
    for stat in by_allocator {
        text.push_str(&format!("{}:\n", stat.allocator));
        text.push_str(&format!(
            "  Avg alloc ops/sec: {}\n",
            format_thousands(stat.mean_alloc_ops_per_sec)
        ));
        text.push_str(&format!(
            "  Avg free ops/sec:  {}\n",
            format_thousands(stat.mean_free_ops_per_sec)
        ));
        text.push_str(&format!(
            "  Avg peak util:     {:.4}\n\n",
            stat.mean_peak_utilization
        ));
    }
    text
}

fn format_metric(metric: Metric, value: f64) -> String {
    match metric {
        Metric::AllocOpsPerSec | Metric::FreeOpsPerSec => format_thousands(value),
        Metric::PeakUtilization => format!("{:.4}", value),
    }
}

/// Round to an integer and group digits by thousands (`1234567.8` -> `1,234,568`).
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0.0 && grouped != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocscope_core::{DiagnosticKind, IngestError};

    fn stat(allocator: &str, scenario: Option<&str>, alloc: f64) -> SummaryStatistic {
        SummaryStatistic {
            allocator: allocator.to_string(),
            scenario: scenario.map(str::to_string),
            mean_alloc_ops_per_sec: alloc,
            mean_free_ops_per_sec: 2_000_000.0,
            mean_peak_utilization: 0.012207,
            sample_count: 2,
        }
    }

    fn pivot() -> PivotTable {
        PivotTable {
            title: Metric::AllocOpsPerSec.title().to_string(),
            metric: Metric::AllocOpsPerSec,
            row_axis: "Benchmark".to_string(),
            column_axis: "Allocator".to_string(),
            row_labels: vec!["Sequential".to_string(), "Random".to_string()],
            column_labels: vec!["Buddy".to_string(), "SegregatedFreeList".to_string()],
            cells: vec![vec![Some(1_100_000.0), Some(950.4)], vec![None, Some(12.0)]],
        }
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1_234_567.8), "1,234,568");
        assert_eq!(format_thousands(-45_000.0), "-45,000");
        assert_eq!(format_thousands(-0.2), "0");
        assert_eq!(format_thousands(f64::INFINITY), "inf");
    }

    #[test]
    fn test_summary_block_layout() {
        let block = summary_block(&[stat("Buddy", None, 1_100_000.0)]);
        assert_eq!(
            block,
            "Summary Statistics\n\nBuddy:\n  Avg alloc ops/sec: 1,100,000\n  Avg free ops/sec:  2,000,000\n  Avg peak util:     0.0122\n\n"
        );
    }

    #[test]
    fn test_render_pivot() {
        let table = render_pivot(&pivot());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Benchmark | Buddy | SegregatedFreeList |");
        assert_eq!(lines[1], "|---|---|---|");
        assert_eq!(lines[2], "| Sequential | 1,100,000 | 950 |");
        assert_eq!(lines[3], "| Random | - | 12 |");
    }

    #[test]
    fn test_generate_report_sections() {
        let sources = vec![SourceId::new("run1.csv")];
        let failures = vec![FailedSource::from(&IngestError::input(
            &SourceId::new("run2.csv"),
            "unreadable",
        ))];
        let order = vec!["Sequential".to_string(), "Random".to_string()];
        let pivots = vec![pivot()];
        let by_scenario = vec![stat("Buddy", Some("Sequential"), 1_100_000.0)];
        let by_allocator = vec![stat("Buddy", None, 1_100_000.0)];
        let diagnostics = vec![Diagnostic::new(DiagnosticKind::ThroughputMismatch, "off by 2%")
            .with_allocator("Buddy")
            .with_scenario("Sequential")];

        let report = generate_report(ReportView {
            title: "Allocator Benchmark Report",
            generated_at: Utc::now(),
            sources: &sources,
            failures: &failures,
            scenario_order: &order,
            pivots: &pivots,
            by_scenario: &by_scenario,
            by_allocator: &by_allocator,
            diagnostics: &diagnostics,
        });

        assert!(report.starts_with("# Allocator Benchmark Report\n"));
        assert!(report.contains("- run1.csv\n"));
        assert!(report.contains("- run2.csv (failed: Input error in run2.csv: unreadable)"));
        assert!(report.contains("Scenario order: Sequential, Random"));
        assert!(report.contains("## Allocation Throughput (ops/sec)"));
        assert!(report.contains("| Sequential | Buddy | 1,100,000 | 2,000,000 | 0.0122 | 2 |"));
        assert!(report.contains("Summary Statistics\n\nBuddy:"));
        assert!(report.contains("- [ThroughputMismatch] Buddy/Sequential: off by 2%"));
        assert!(report.contains("Total groups: 1, diagnostics: 1"));
    }

    #[test]
    fn test_report_without_diagnostics() {
        let report = generate_report(ReportView {
            title: "Empty",
            generated_at: Utc::now(),
            sources: &[],
            failures: &[],
            scenario_order: &[],
            pivots: &[],
            by_scenario: &[],
            by_allocator: &[],
            diagnostics: &[],
        });
        assert!(report.contains("No diagnostics."));
        assert!(!report.contains("Scenario order"));
    }
}
