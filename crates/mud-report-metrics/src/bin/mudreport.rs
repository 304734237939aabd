use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use mud_report_metrics::{
    Capture, ColumnSummary, DashboardReport, Selection, Template, ViewRequest, build_report,
    comparison_csv, derived_to_csv_string, load_documents, write_derived_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mudreport",
    version,
    about = "Extract fields from drilling mud report PDFs and derive screen and dilution metrics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write the derived metrics table, one row per report.
    Extract(ExtractArgs),
    /// Group reports by a column and write the comparison CSV.
    Compare(CompareArgs),
    /// Print descriptive statistics of the key metrics.
    Summary(SummaryArgs),
    /// List the fields a template extracts.
    Fields(FieldsArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Report template: shaker-screen, solids-control or daily-drilling.
    #[arg(short, long, default_value = "shaker-screen")]
    template: String,

    /// Keep only these values, as v1,v2 (well names) or column=v1,v2.
    #[arg(long)]
    select: Option<String>,

    /// Print every warning instead of a count.
    #[arg(short, long)]
    verbose: bool,

    /// Input PDF paths.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the full report as JSON instead of CSV.
    #[arg(long)]
    json: bool,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,
}

#[derive(Debug, Args)]
struct CompareArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Column to group by, e.g. "Well Name" or "Rig".
    #[arg(long)]
    group_by: String,

    /// Directory receiving `{column}_comparison.csv`.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct SummaryArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Emit the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct FieldsArgs {
    /// Report template.
    #[arg(short, long, default_value = "shaker-screen")]
    template: String,
}

fn parse_template(value: &str) -> Result<Template> {
    Template::from_str(value).context("failed to parse --template")
}

fn parse_request(args: &InputArgs, group_by: Option<&str>) -> Result<ViewRequest> {
    let mut request = ViewRequest::new(parse_template(&args.template)?);
    if let Some(column) = group_by {
        request = request
            .with_group_by(column)
            .context("failed to parse --group-by")?;
    }
    if let Some(value) = args.select.as_deref() {
        let selection = Selection::from_str(value)
            .map_err(|error| anyhow!("invalid selection: {error}"))
            .context("failed to parse --select")?;
        request = request
            .with_selection(selection)
            .context("failed to parse --select")?;
    }
    Ok(request)
}

fn run_report(args: &InputArgs, group_by: Option<&str>) -> Result<DashboardReport> {
    let request = parse_request(args, group_by)?;
    let (documents, unreadable) = load_documents(&args.inputs);
    let mut report = build_report(&documents, &request);
    report.failures.splice(0..0, unreadable);
    log_report(&report, args.verbose);
    Ok(report)
}

fn log_report(report: &DashboardReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} document={:?} field={:?}: {}",
                warning.code, warning.document, warning.field, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<DashboardReport> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    let report = run_report(&args.input, None)?;
    let delimiter = args.delimiter as u8;

    match (&args.output, args.json) {
        (Some(path), false) => write_derived_csv(path, &report.table, delimiter)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        (Some(path), true) => {
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(path, json)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        (None, false) => print!("{}", derived_to_csv_string(&report.table, delimiter)?),
        (None, true) => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(report)
}

fn run_compare(args: &CompareArgs) -> Result<DashboardReport> {
    let report = run_report(&args.input, Some(&args.group_by))?;
    let (file_name, bytes) = comparison_csv(&report)?;
    let path = args.out_dir.join(file_name);
    write_file(&path, &bytes)?;
    println!("{}", path.display());
    Ok(report)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write '{}'", path.display()))
}

fn format_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.3}"))
}

fn print_summary(summary: &[ColumnSummary]) {
    println!(
        "{:<20} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for column in summary {
        println!(
            "{:<20} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            column.column,
            column.count,
            format_stat(column.mean),
            format_stat(column.std),
            format_stat(column.min),
            format_stat(column.p25),
            format_stat(column.p50),
            format_stat(column.p75),
            format_stat(column.max),
        );
    }
}

fn run_summary(args: &SummaryArgs) -> Result<DashboardReport> {
    let report = run_report(&args.input, None)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        print_summary(&report.summary);
    }
    Ok(report)
}

fn run_fields(args: &FieldsArgs) -> Result<()> {
    let template = parse_template(&args.template)?;
    for rule in template.rules() {
        let source = match rule.capture {
            Capture::Sum(left, right) => format!("{left} + {right}"),
            capture => capture.pattern().unwrap_or_default().to_string(),
        };
        for field in rule.output_fields() {
            println!(
                "{field}\t{:?}\tdefault={}\t{source}",
                rule.kind, rule.default
            );
        }
    }
    Ok(())
}

fn exit_code(result: Result<DashboardReport>) -> ExitCode {
    match result {
        Ok(report) if report.is_empty() => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mud_report_metrics=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => exit_code(run_extract(&args)),
        Commands::Compare(args) => exit_code(run_compare(&args)),
        Commands::Summary(args) => exit_code(run_summary(&args)),
        Commands::Fields(args) => match run_fields(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
