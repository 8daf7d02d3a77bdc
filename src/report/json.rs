use super::emit;
use crate::analysis::{Classification, DiagnosticCode};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, project: &Path, findings: &[Classification]) -> Result<()> {
        let json = render(project, findings)?;
        emit(self.output_path.as_deref(), &json)
    }
}

pub(crate) fn render(project: &Path, findings: &[Classification]) -> Result<String> {
    let report = JsonReport::new(project, findings);
    serde_json::to_string_pretty(&report).into_diagnostic()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    project: String,
    total_issues: usize,
    issues: Vec<JsonIssue<'a>>,
    summary: BTreeMap<&'static str, usize>,
}

#[derive(Serialize)]
struct JsonIssue<'a> {
    code: &'static str,
    kind: &'static str,
    identity: &'a str,
    message: &'a str,
}

impl<'a> JsonReport<'a> {
    fn new(project: &Path, findings: &'a [Classification]) -> Self {
        let mut summary: BTreeMap<&'static str, usize> =
            DiagnosticCode::ALL.iter().map(|code| (code.code(), 0)).collect();

        let issues = findings
            .iter()
            .map(|finding| {
                *summary.entry(finding.code.code()).or_default() += 1;
                JsonIssue {
                    code: finding.code.code(),
                    kind: finding.kind.as_str(),
                    identity: &finding.identity,
                    message: &finding.message,
                }
            })
            .collect();

        Self {
            version: "1.0",
            project: project.to_string_lossy().to_string(),
            total_issues: findings.len(),
            issues,
            summary,
        }
    }
}
