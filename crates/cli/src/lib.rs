//! CLI for allocscope.
//!
//! This crate provides the `allocscope` command: it ingests benchmark CSV
//! files, runs the validation and aggregation pipeline, prints diagnostics
//! and writes a Markdown and/or JSON report.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use allocscope_analysis::{AnalysisReport, Pipeline};
use allocscope_benchmarks::io::{ingest_sources, write_json, write_text};
use allocscope_benchmarks::markdown::{generate_report, ReportView};
use allocscope_benchmarks::result::{partition, PartitionedOutcomes};
use allocscope_core::{
    AnalysisConfig, Diagnostic, DiagnosticKind, FailedSource, IngestError, ResultSet,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default report name in comparison mode.
pub const COMPARISON_STEM: &str = "comparison";

/// allocscope CLI.
#[derive(Parser, Debug)]
#[command(name = "allocscope")]
#[command(author, version, about = "Validate and compare memory allocator benchmark results", long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./allocscope.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze benchmark results and write a report.
    ///
    /// With a single input the report covers that run, even with --comparison.
    /// With --comparison and several inputs, they are combined and averaged
    /// per allocator and benchmark.
    Analyze {
        /// Benchmark CSV files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report path (default: <input stem>.md, or comparison.md).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Combine several result files.
        #[arg(short, long)]
        comparison: bool,

        /// Report format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Verbose output.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check benchmark results and print diagnostics without writing a report.
    Validate {
        /// Benchmark CSV files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Verbose output.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Analyze { verbose, .. } | Commands::Validate { verbose, .. } => *verbose,
            Commands::Config => false,
        }
    }
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown document
    Markdown,
    /// JSON document
    Json,
    /// Both, side by side
    Both,
}

/// Log formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the command fails.
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.command.verbose())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(execute(cli))
}

fn init_tracing(format: LogFormat, verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

/// Execute a parsed command.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Analyze {
            inputs,
            output,
            comparison,
            format,
            verbose,
        } => {
            let config = load_config(config_path)?;
            analyze(&inputs, output, comparison, format, verbose, config).await
        }
        Commands::Validate { inputs, verbose } => {
            let config = load_config(config_path)?;
            validate(&inputs, verbose, config).await
        }
        Commands::Config => {
            let config = load_config(config_path)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    AnalysisConfig::load(path).context("could not load configuration")
}

async fn analyze(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    comparison: bool,
    format: OutputFormat,
    verbose: bool,
    config: AnalysisConfig,
) -> anyhow::Result<()> {
    let comparison = comparison && inputs.len() > 1;
    if !comparison && inputs.len() != 1 {
        bail!(
            "single-file mode takes exactly one input, got {}; pass --comparison to combine results",
            inputs.len()
        );
    }

    let PartitionedOutcomes { ingested, failed } = partition(ingest_sources(inputs).await);
    report_failures(&failed);
    if ingested.is_empty() {
        bail!("no input could be ingested");
    }

    let mut ingest_diagnostics = Vec::new();
    let mut result_sets = Vec::with_capacity(ingested.len());
    for source in ingested {
        ingest_diagnostics.extend(source.diagnostics);
        result_sets.push(source.result_set);
    }

    let report = Pipeline::new(config)
        .run(&result_sets, ingest_diagnostics)?
        .with_failures(failed.iter().map(FailedSource::from).collect());

    print_diagnostics(&report.diagnostics);
    if verbose {
        for stat in &report.by_scenario {
            println!(
                "  {} / {}: {:.0} alloc ops/sec, {:.0} free ops/sec ({} samples)",
                stat.allocator,
                stat.scenario.as_deref().unwrap_or("*"),
                stat.mean_alloc_ops_per_sec,
                stat.mean_free_ops_per_sec,
                stat.sample_count
            );
        }
    }

    let markdown_path = output.unwrap_or_else(|| default_output(inputs));
    let title = report_title(inputs);
    for path in write_report(&report, &title, &markdown_path, format)? {
        println!("{} {}", "Wrote".green().bold(), path.display());
    }

    Ok(())
}

async fn validate(inputs: &[PathBuf], verbose: bool, config: AnalysisConfig) -> anyhow::Result<()> {
    let PartitionedOutcomes { ingested, failed } = partition(ingest_sources(inputs).await);
    let pipeline = Pipeline::new(config);

    for source in &ingested {
        let mut diagnostics = source.diagnostics.clone();
        diagnostics.extend(pipeline.reconcile(std::slice::from_ref(&source.result_set)));

        let status = if diagnostics.is_empty() {
            "ok".green().bold()
        } else {
            "warnings".yellow().bold()
        };
        println!(
            "{} {}: {} records, {} diagnostics",
            status,
            source.source(),
            source.result_set.len(),
            diagnostics.len()
        );
        if verbose || !diagnostics.is_empty() {
            print_diagnostics(&diagnostics);
        }
    }

    let result_sets: Vec<ResultSet> = ingested.iter().map(|s| s.result_set.clone()).collect();
    let workloads = pipeline.check_workloads(&result_sets);
    if !workloads.is_empty() {
        println!(
            "{} {} scenario(s) with uneven workloads across sources",
            "warnings".yellow().bold(),
            workloads.len()
        );
        print_diagnostics(&workloads);
    }

    report_failures(&failed);
    if !failed.is_empty() {
        bail!("{} of {} source(s) failed", failed.len(), inputs.len());
    }
    info!(sources = ingested.len(), "Validation complete");
    Ok(())
}

/// Report path used when none is given.
///
/// A single input names the report after itself, with or without --comparison.
pub fn default_output(inputs: &[PathBuf]) -> PathBuf {
    let stem = match inputs {
        [single] => single
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| COMPARISON_STEM.to_string()),
        _ => COMPARISON_STEM.to_string(),
    };
    PathBuf::from(format!("{}.md", stem))
}

fn report_title(inputs: &[PathBuf]) -> String {
    match inputs {
        [single] => format!("Allocator Benchmark Results: {}", single.display()),
        _ => "Allocator Benchmark Comparison".to_string(),
    }
}

/// Write the report in the requested format(s) and return the written paths.
///
/// JSON output uses the Markdown path with a `.json` extension.
pub fn write_report(
    report: &AnalysisReport,
    title: &str,
    markdown_path: &Path,
    format: OutputFormat,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, OutputFormat::Markdown | OutputFormat::Both) {
        let markdown = generate_report(ReportView {
            title,
            generated_at: report.generated_at,
            sources: &report.sources,
            failures: &report.failed_sources,
            scenario_order: &report.scenario_order,
            pivots: &report.pivots,
            by_scenario: &report.by_scenario,
            by_allocator: &report.by_allocator,
            diagnostics: &report.diagnostics,
        });
        write_text(&markdown, markdown_path)
            .with_context(|| format!("failed to write {}", markdown_path.display()))?;
        written.push(markdown_path.to_path_buf());
    }

    if matches!(format, OutputFormat::Json | OutputFormat::Both) {
        let json_path = markdown_path.with_extension("json");
        write_json(report, &json_path)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        written.push(json_path);
    }

    debug!(files = written.len(), "Report written");
    Ok(written)
}

fn report_failures(failed: &[IngestError]) {
    for err in failed {
        eprintln!("{} {}", "failed:".red().bold(), err);
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.kind {
            DiagnosticKind::ThroughputMismatch => "mismatch:".red(),
            DiagnosticKind::RowParseWarning => "skipped:".yellow(),
            DiagnosticKind::ShortMeasurementWarning | DiagnosticKind::UnevenWorkloadWarning => {
                "warning:".yellow()
            }
        };
        eprintln!("{} {}", label.bold(), diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "Allocator,Benchmark,AllocTime_us,FreeTime_us,AllocOps,FreeOps,AllocOpsPerSec,FreeOpsPerSec,PeakUtilization";

    fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_parse_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "allocscope",
            "analyze",
            "a.csv",
            "b.csv",
            "-c",
            "-o",
            "out.md",
            "-f",
            "both",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Analyze {
                inputs,
                output,
                comparison,
                format,
                verbose,
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(output, Some(PathBuf::from("out.md")));
                assert!(comparison);
                assert_eq!(format, OutputFormat::Both);
                assert!(!verbose);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_analyze_requires_input() {
        assert!(Cli::try_parse_from(["allocscope", "analyze"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["allocscope", "config", "--config", "custom.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_default_output() {
        let single = vec![PathBuf::from("results/run1.csv")];
        assert_eq!(default_output(&single), PathBuf::from("run1.md"));
        assert_eq!(report_title(&single), "Allocator Benchmark Results: results/run1.csv");

        let many = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        assert_eq!(default_output(&many), PathBuf::from("comparison.md"));
        assert_eq!(report_title(&many), "Allocator Benchmark Comparison");
    }

    #[tokio::test]
    async fn test_comparison_with_one_input_falls_back_to_single_mode() {
        let dir = tempfile::tempdir().unwrap();
        let run1 = write_csv(
            dir.path(),
            "run1.csv",
            &["Buddy,Sequential,1000.0,1000.0,1000,1000,1000000.0,1000000.0,0.250000"],
        );
        let output = dir.path().join("run1.md");

        analyze(
            &[run1.clone()],
            Some(output.clone()),
            true,
            OutputFormat::Markdown,
            false,
            AnalysisConfig::default(),
        )
        .await
        .unwrap();

        let markdown = fs::read_to_string(&output).unwrap();
        assert!(markdown.starts_with(&format!("# Allocator Benchmark Results: {}", run1.display())));
    }

    #[tokio::test]
    async fn test_single_mode_rejects_several_inputs() {
        let inputs = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        let err = analyze(&inputs, None, false, OutputFormat::Markdown, false, AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--comparison"));
    }

    #[tokio::test]
    async fn test_comparison_writes_both_reports_and_skips_failed_sources() {
        let dir = tempfile::tempdir().unwrap();
        let run1 = write_csv(
            dir.path(),
            "run1.csv",
            &["Buddy,Sequential,1000.0,1000.0,1000,1000,1000000.0,1000000.0,0.250000"],
        );
        let run2 = write_csv(
            dir.path(),
            "run2.csv",
            &["Buddy,Sequential,1000.0,1000.0,1000,1000,1200000.0,1000000.0,0.250000"],
        );
        let missing = dir.path().join("missing.csv");
        let output = dir.path().join("reports").join("cmp.md");

        analyze(
            &[run1, run2, missing],
            Some(output.clone()),
            true,
            OutputFormat::Both,
            false,
            AnalysisConfig::default(),
        )
        .await
        .unwrap();

        let markdown = fs::read_to_string(&output).unwrap();
        assert!(markdown.starts_with("# Allocator Benchmark Comparison"));
        assert!(markdown.contains("missing.csv (failed:"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.with_extension("json")).unwrap()).unwrap();
        assert_eq!(json["record_count"], 2);
        assert_eq!(json["by_scenario"][0]["mean_alloc_ops_per_sec"], 1_100_000.0);
        assert_eq!(json["failed_sources"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_fails_when_a_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_csv(
            dir.path(),
            "good.csv",
            &["Buddy,Random,1000.0,1000.0,1000,1000,1000000.0,1000000.0,0.5"],
        );
        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "Allocator,Benchmark\nBuddy,Random\n").unwrap();

        assert!(validate(&[good.clone()], false, AnalysisConfig::default()).await.is_ok());
        let err = validate(&[good, bad], false, AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }
}
