use super::emit;
use crate::analysis::Classification;
use miette::Result;
use std::path::{Path, PathBuf};

/// Canonical build-log lines, picked up by IDEs and CI log parsers
pub struct MsBuildReporter {
    output_path: Option<PathBuf>,
}

impl MsBuildReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, project: &Path, findings: &[Classification]) -> Result<()> {
        // A clean run prints nothing but still replaces an earlier report file
        if findings.is_empty() && self.output_path.is_none() {
            return Ok(());
        }
        emit(self.output_path.as_deref(), &render(project, findings))
    }
}

pub(crate) fn render(project: &Path, findings: &[Classification]) -> String {
    findings
        .iter()
        .map(|f| format!("{} : warning {}: {}", project.display(), f.code.code(), f.message))
        .collect::<Vec<_>>()
        .join("\n")
}
