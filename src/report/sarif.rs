use super::emit;
use crate::analysis::{Classification, DiagnosticCode};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// SARIF reporter for CI/CD integration (GitHub, Azure DevOps, etc.)
pub struct SarifReporter {
    output_path: Option<PathBuf>,
}

impl SarifReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, project: &Path, findings: &[Classification]) -> Result<()> {
        let json = render(project, findings)?;
        emit(self.output_path.as_deref(), &json)
    }
}

pub(crate) fn render(project: &Path, findings: &[Classification]) -> Result<String> {
    let sarif = SarifReport::new(project, findings);
    serde_json::to_string_pretty(&sarif).into_diagnostic()
}

/// SARIF 2.1.0 format
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifConfiguration,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

fn rule_name(code: DiagnosticCode) -> &'static str {
    match code {
        DiagnosticCode::ReferenceRemovable => "removable-reference",
        DiagnosticCode::ProjectReferenceRemovable => "removable-project-reference",
        DiagnosticCode::PackageReferenceRemovable => "removable-package-reference",
    }
}

impl SarifReport {
    fn new(project: &Path, findings: &[Classification]) -> Self {
        let rules = DiagnosticCode::ALL
            .iter()
            .map(|&code| SarifRule {
                id: code.code(),
                name: rule_name(code),
                short_description: SarifMessage {
                    text: code.description().to_string(),
                },
                default_configuration: SarifConfiguration { level: "warning" },
            })
            .collect();

        // Findings are about the project file as a whole, there is no line
        let uri = project.to_string_lossy().replace('\\', "/");

        let results = findings
            .iter()
            .map(|finding| SarifResult {
                rule_id: finding.code.code(),
                level: "warning",
                message: SarifMessage {
                    text: finding.message.clone(),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation { uri: uri.clone() },
                    },
                }],
            })
            .collect();

        SarifReport {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "reftrim",
                        version: env!("CARGO_PKG_VERSION"),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sarif() {
        let findings = vec![Classification::new(
            DiagnosticCode::ProjectReferenceRemovable,
            "../Lib/Lib.csproj",
        )];

        let json = render(Path::new("src/App/App.csproj"), &findings).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], "2.1.0");
        let run = &value["runs"][0];
        assert_eq!(run["tool"]["driver"]["name"], "reftrim");
        assert_eq!(run["tool"]["driver"]["rules"].as_array().unwrap().len(), 3);
        assert_eq!(run["tool"]["driver"]["rules"][2]["id"], "RT0003");
        assert_eq!(run["results"][0]["ruleId"], "RT0002");
        assert_eq!(
            run["results"][0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            "src/App/App.csproj"
        );
    }
}
