use crate::analysis::{Classification, DiagnosticCode};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for reftrim runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Patterns matched against reference identities; matches are never reported
    pub ignore: Vec<String>,

    /// Diagnostic codes to suppress, e.g. `RT0002`
    pub disabled_codes: Vec<String>,

    /// Exit non-zero when removable references remain after filtering
    pub fail_on_removable: bool,

    /// Report configuration
    pub report: ReportConfig,

    /// Package folders tried after the ones from the inputs or lock file
    pub package_folders: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json, sarif, msbuild
    pub format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".reftrim.yml",
            ".reftrim.yaml",
            ".reftrim.toml",
            "reftrim.yml",
            "reftrim.yaml",
            "reftrim.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Check if a reference identity matches an ignore pattern
    pub fn should_ignore(&self, identity: &str) -> bool {
        let normalized = identity.replace('\\', "/");
        self.ignore.iter().any(|pattern| glob_match(pattern, &normalized))
    }

    pub fn is_code_disabled(&self, code: DiagnosticCode) -> bool {
        self.disabled_codes
            .iter()
            .any(|c| DiagnosticCode::parse(c) == Some(code))
    }

    /// Drop findings that are ignored or whose code is disabled
    pub fn filter(&self, classifications: Vec<Classification>) -> Vec<Classification> {
        classifications
            .into_iter()
            .filter(|c| !self.is_code_disabled(c.code) && !self.should_ignore(&c.identity))
            .collect()
    }
}

/// Simple glob matching for patterns like "*.Analyzers", "Microsoft.*" or "**/Legacy/**"
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        // "*.Analyzers" matches "StyleCop.Analyzers"
        let suffix = &pattern[1..];
        return text.ends_with(suffix);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        // "Microsoft.*" matches "Microsoft.Extensions.Logging"
        let prefix = &pattern[..pattern.len() - 1];
        return text.starts_with(prefix);
    }

    // Handle path patterns with **
    if pattern.contains("**") {
        let cleaned = pattern.replace("**/", "").replace("/**", "");

        // "**/Legacy/**" must match a whole directory name, not a substring
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = cleaned.trim_matches('/');
            let dir_pattern = format!("/{}/", dir_name);
            return text.contains(&dir_pattern);
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }

            if prefix.is_empty() {
                return text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
            }

            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }

            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || text.contains(&format!("/{}", suffix)));
        }
    }

    // Exact match
    text == pattern
}
