use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use deadsymbols::analysis::{AnalysisReport, Orchestrator, RunContext};
use deadsymbols::index::snapshot::load_index;
use deadsymbols::index::SemanticIndex;
use deadsymbols::report::{ReportFormat, Reporter};
use deadsymbols::Config;

/// deadsymbols - find types, members and parameters nothing uses
#[derive(Parser, Debug)]
#[command(name = "deadsymbols")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Index snapshot (JSON or YAML) exported by a language service
    snapshot: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format; overrides the configured one
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report public symbols too
    #[arg(long)]
    include_public: bool,

    /// Do not report internal symbols
    #[arg(long)]
    no_internal: bool,

    /// Report symbols declared in generated code
    #[arg(long)]
    include_generated: bool,

    /// Excluded roots (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Patterns to retain - never report as unused (can be specified multiple times)
    #[arg(short, long)]
    retain: Vec<String>,

    /// Explicit entry points (can be specified multiple times)
    #[arg(long = "entry-point")]
    entry_points: Vec<String>,

    /// Reflection rule set version
    #[arg(long)]
    rule_set: Option<u32>,

    /// Log the outcome of every usage tier
    #[arg(long)]
    diagnostics: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet, cli.diagnostics);

    info!("deadsymbols v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(report) if report.has_findings() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<AnalysisReport> {
    let config = load_config(cli)?;

    let format = cli
        .format
        .map(ReportFormat::from)
        .unwrap_or_else(|| ReportFormat::from_name(&config.report.format));

    let index = load_index(&cli.snapshot)?;
    let root = index.root().to_path_buf();
    info!("Analyzing {} units under {}", index.units().into_diagnostic()?.len(), root.display());

    let context = RunContext::new(config).with_diagnostics(cli.diagnostics);
    let orchestrator = Orchestrator::new(context);
    let report = orchestrator.run(&index, &root)?;

    let reporter = Reporter::new(format, cli.output.clone());
    reporter.report(&report.findings)?;

    if !cli.quiet && format == ReportFormat::Terminal {
        print_run_summary(&report);
    }

    Ok(report)
}

fn print_run_summary(report: &AnalysisReport) {
    println!(
        "{}",
        format!(
            "{} units analyzed, {} skipped, {} symbols skipped",
            report.units_analyzed,
            report.units_skipped.len(),
            report.symbols_skipped
        )
        .dimmed()
    );
    for unit in &report.units_skipped {
        println!("  {} {}", "skipped:".yellow(), unit);
    }
    println!(
        "{}",
        format!(
            "Reference cache: {} entries, {} hits, {} misses",
            report.cache.entries, report.cache.hits, report.cache.misses
        )
        .dimmed()
    );
}

fn init_logging(verbose: bool, quiet: bool, diagnostics: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet && !diagnostics {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&Config::default_search_root(&cli.snapshot))?
    };

    // Override with CLI arguments
    if cli.include_public {
        config.include_public = true;
    }
    if cli.no_internal {
        config.include_internal = false;
    }
    if cli.include_generated {
        config.exclude_generated = false;
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    config.retain_patterns.extend(cli.retain.iter().cloned());
    config.entry_points.extend(cli.entry_points.iter().cloned());
    if cli.rule_set.is_some() {
        config.reflection.rule_set = cli.rule_set;
    }

    Ok(config)
}
