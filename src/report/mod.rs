mod json;
mod msbuild;
mod sarif;
mod terminal;

pub use json::JsonReporter;
pub use msbuild::MsBuildReporter;
pub use sarif::SarifReporter;
pub use terminal::TerminalReporter;

use crate::analysis::Classification;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
    Sarif,
    /// `file : warning CODE: message` lines, as a build log shows them
    MsBuild,
}

impl ReportFormat {
    /// Parse a format name as written in config files
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "terminal" => Some(ReportFormat::Terminal),
            "json" => Some(ReportFormat::Json),
            "sarif" => Some(ReportFormat::Sarif),
            "msbuild" => Some(ReportFormat::MsBuild),
            _ => None,
        }
    }
}

/// Reporter for outputting removable references
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    /// Report the findings for one project
    pub fn report(&self, project: &Path, findings: &[Classification]) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new();
                reporter.report(project, findings)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(project, findings)
            }
            ReportFormat::Sarif => {
                let reporter = SarifReporter::new(self.output_path.clone());
                reporter.report(project, findings)
            }
            ReportFormat::MsBuild => {
                let reporter = MsBuildReporter::new(self.output_path.clone());
                reporter.report(project, findings)
            }
        }
    }
}

/// Write rendered output to a file, or stdout when no path is given
fn emit(output_path: Option<&Path>, contents: &str) -> Result<()> {
    if let Some(path) = output_path {
        std::fs::write(path, contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write report to {}", path.display()))?;
        eprintln!("Report written to: {}", path.display());
    } else {
        println!("{}", contents);
    }

    Ok(())
}
