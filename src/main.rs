use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use reftrim::baseline::Baseline;
use reftrim::{Analyzer, Classification, Config, MetadataReader, ProjectInputs, ReportFormat, Reporter};

/// reftrim - Find removable references in .NET projects
#[derive(Parser, Debug)]
#[command(name = "reftrim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Inputs document describing the project's references (JSON)
    #[arg(default_value = "reftrim.inputs.json")]
    inputs: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolved lock file (project.assets.json)
    #[arg(long, value_name = "FILE")]
    assets_file: Option<PathBuf>,

    /// Target framework moniker, e.g. net8.0
    #[arg(long, value_name = "TFM")]
    target_moniker: Option<String>,

    /// Runtime identifier, e.g. win-x64
    #[arg(long, value_name = "RID")]
    runtime_identifier: Option<String>,

    /// Package folder (can be specified multiple times)
    #[arg(long, value_name = "DIR")]
    package_folder: Vec<PathBuf>,

    /// Target framework reference directory (can be specified multiple times)
    #[arg(long, value_name = "DIR")]
    framework_dir: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json/sarif/msbuild formats)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Baseline file for ignoring existing findings
    /// New findings not in baseline will be reported
    #[arg(long, value_name = "FILE")]
    baseline: Option<PathBuf>,

    /// Generate a baseline file from current results
    #[arg(long, value_name = "FILE")]
    generate_baseline: Option<PathBuf>,

    /// Exit with an error when removable references are found
    #[arg(long)]
    fail_on_removable: bool,

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
    Sarif,
    Msbuild,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Sarif => ReportFormat::Sarif,
            OutputFormat::Msbuild => ReportFormat::MsBuild,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("reftrim v{}", env!("CARGO_PKG_VERSION"));

    let inputs = load_inputs(&cli)?;
    let config = load_config(&cli, &inputs)?;

    run_analysis(&config, &cli, &inputs)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so report output on stdout stays machine readable
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_inputs(cli: &Cli) -> Result<ProjectInputs> {
    let mut inputs = ProjectInputs::from_file(&cli.inputs)
        .into_diagnostic()
        .wrap_err("Failed to load project inputs")?;

    // CLI paths are relative to the working directory, not the inputs document
    let cwd = std::env::current_dir().into_diagnostic()?;
    if let Some(assets_file) = &cli.assets_file {
        inputs.assets_file = Some(cwd.join(assets_file));
    }
    if let Some(moniker) = &cli.target_moniker {
        inputs.target_moniker = Some(moniker.clone());
    }
    if let Some(rid) = &cli.runtime_identifier {
        inputs.runtime_identifier = Some(rid.clone());
    }
    if !cli.package_folder.is_empty() {
        inputs.package_folders = cli.package_folder.iter().map(|p| cwd.join(p)).collect();
    }
    if !cli.framework_dir.is_empty() {
        inputs.target_framework_directories = cli.framework_dir.iter().map(|p| cwd.join(p)).collect();
    }

    Ok(inputs)
}

fn load_config(cli: &Cli, inputs: &ProjectInputs) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations next to the inputs
        Config::from_default_locations(&inputs.base_dir)?
    };

    // Override with CLI arguments
    if cli.fail_on_removable {
        config.fail_on_removable = true;
    }
    config.package_folders = config
        .package_folders
        .iter()
        .map(|p| inputs.resolve(p))
        .collect();

    Ok(config)
}

fn report_format(cli: &Cli, config: &Config) -> ReportFormat {
    if let Some(format) = cli.format {
        return format.into();
    }

    ReportFormat::parse(&config.report.format).unwrap_or_else(|| {
        warn!("Unknown report format '{}', using terminal", config.report.format);
        ReportFormat::Terminal
    })
}

fn run_analysis(config: &Config, cli: &Cli, inputs: &ProjectInputs) -> Result<()> {
    use std::time::Instant;

    let start_time = Instant::now();
    let project = inputs.project_path();

    // Step 1: Analyze
    let reader = MetadataReader::new();
    let analyzer = Analyzer::new(&reader).with_extra_package_folders(config.package_folders.clone());
    let result = analyzer
        .analyze(inputs)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to analyze references of {}", project.display()))?;

    info!(
        "{} used assemblies, {} framework assemblies, {} packages analyzed",
        result.used_assemblies, result.ambient_assemblies, result.analyzed_packages
    );

    // Step 2: Apply ignore patterns and disabled codes
    let findings = config.filter(result.classifications);

    // Step 3: Generate baseline if requested
    if let Some(ref baseline_path) = cli.generate_baseline {
        info!("Generating baseline file...");
        let baseline = Baseline::from_findings(&findings, &project);
        match baseline.save(baseline_path) {
            Ok(_) => {
                eprintln!(
                    "{}",
                    format!(
                        "Baseline generated: {} ({} issues)",
                        baseline_path.display(),
                        findings.len()
                    )
                    .green()
                );
            }
            Err(e) => {
                eprintln!("{}: Failed to generate baseline: {}", "Error".red(), e);
            }
        }
    }

    // Step 4: Filter by baseline if provided
    let findings = match cli.baseline {
        Some(ref baseline_path) => apply_baseline(baseline_path, findings),
        None => findings,
    };

    // Step 5: Report results
    let reporter = Reporter::new(report_format(cli, config), cli.output.clone());
    reporter.report(&project, &findings)?;

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    if config.fail_on_removable && !findings.is_empty() {
        return Err(miette::miette!(
            "{} removable references found in {}",
            findings.len(),
            project.display()
        ));
    }

    Ok(())
}

fn apply_baseline(baseline_path: &Path, findings: Vec<Classification>) -> Vec<Classification> {
    match Baseline::load(baseline_path) {
        Ok(baseline) => {
            let stats = baseline.stats(&findings);
            eprintln!("{}", format!("Baseline: {}", stats).cyan());

            let new_issues: Vec<_> = baseline.filter_new(&findings).into_iter().cloned().collect();

            if new_issues.is_empty() && stats.baselined_found > 0 {
                eprintln!("{}", "No new removable references found!".green());
            }

            new_issues
        }
        Err(e) => {
            eprintln!("{}: Failed to load baseline: {}", "Warning".yellow(), e);
            findings
        }
    }
}
