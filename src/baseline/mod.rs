//! Baseline support for reftrim
//!
//! A baseline records the removable references a team has accepted, so
//! later runs only report new ones.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

use crate::analysis::{Classification, DiagnosticCode};

/// Baseline errors
#[derive(Error, Debug)]
pub enum BaselineError {
    #[error("Failed to read baseline file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse baseline: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Baseline version mismatch (expected {expected}, found {found})")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current baseline format version
const BASELINE_VERSION: u32 = 1;

/// A finding as remembered by the baseline
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueFingerprint {
    pub code: DiagnosticCode,
    /// Reference identity as written in the project
    pub identity: String,
}

impl IssueFingerprint {
    pub fn from_classification(finding: &Classification) -> Self {
        Self {
            code: finding.code,
            identity: finding.identity.clone(),
        }
    }

    /// Identities match ignoring case and path separator style
    pub fn matches(&self, finding: &Classification) -> bool {
        self.code == finding.code && normalize(&self.identity) == normalize(&finding.identity)
    }
}

fn normalize(identity: &str) -> String {
    identity.trim().replace('\\', "/").to_lowercase()
}

/// A baseline containing accepted findings
#[derive(Debug, Serialize, Deserialize)]
pub struct Baseline {
    /// Baseline format version
    pub version: u32,
    /// When the baseline was created (seconds since the Unix epoch)
    pub created_at: String,
    /// Project the baseline was generated for
    #[serde(default)]
    pub project: String,
    /// Known issues to ignore
    pub issues: Vec<IssueFingerprint>,
}

impl Baseline {
    /// Create a new baseline from findings
    pub fn from_findings(findings: &[Classification], project: &Path) -> Self {
        Self {
            version: BASELINE_VERSION,
            created_at: unix_now(),
            project: project.to_string_lossy().to_string(),
            issues: findings.iter().map(IssueFingerprint::from_classification).collect(),
        }
    }

    /// Load a baseline from a file
    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let baseline: Self = serde_json::from_reader(reader)?;

        if baseline.version != BASELINE_VERSION {
            return Err(BaselineError::VersionMismatch {
                expected: BASELINE_VERSION,
                found: baseline.version,
            });
        }

        Ok(baseline)
    }

    /// Save baseline to a file
    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Findings that are not in the baseline
    pub fn filter_new<'a>(&self, findings: &'a [Classification]) -> Vec<&'a Classification> {
        findings.iter().filter(|f| !self.is_baselined(f)).collect()
    }

    pub fn is_baselined(&self, finding: &Classification) -> bool {
        self.issues.iter().any(|fp| fp.matches(finding))
    }

    /// Get statistics about baseline coverage
    pub fn stats(&self, findings: &[Classification]) -> BaselineStats {
        let baselined = findings.iter().filter(|f| self.is_baselined(f)).count();

        BaselineStats {
            total_in_baseline: self.issues.len(),
            baselined_found: baselined,
            new_issues: findings.len() - baselined,
        }
    }
}

/// Statistics about baseline comparison
#[derive(Debug, Clone)]
pub struct BaselineStats {
    /// Total issues recorded in baseline
    pub total_in_baseline: usize,
    /// Number of current findings that match baseline
    pub baselined_found: usize,
    /// Number of new issues not in baseline
    pub new_issues: usize,
}

impl std::fmt::Display for BaselineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} new issues ({} baselined, {} in baseline file)",
            self.new_issues, self.baselined_found, self.total_in_baseline
        )
    }
}

fn unix_now() -> String {
    use std::time::SystemTime;

    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    duration.as_secs().to_string()
}
