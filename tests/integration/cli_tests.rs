//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.
//! Projects are laid out in temporary directories; none of them needs real
//! assemblies, so every binary the tool would read is absent or broken on
//! purpose.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory with an inputs document
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn inputs(&self, document: serde_json::Value) -> PathBuf {
        self.write("reftrim.inputs.json", &document.to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("reftrim").unwrap();
        cmd.current_dir(self.path());
        cmd
    }
}

const ASSETS: &str = r#"{
  "version": 3,
  "targets": {
    "net8.0": {
      "Pkg.Tools/1.0.0": {
        "type": "package",
        "compile": { "lib/net8.0/_._": {} },
        "build": { "build/Pkg.Tools.targets": {} }
      },
      "Analyzer.Only/2.0.0": {
        "type": "package",
        "compile": { "lib/netstandard2.0/_._": {} }
      }
    }
  },
  "libraries": {
    "Pkg.Tools/1.0.0": { "type": "package", "path": "pkg.tools/1.0.0" },
    "Analyzer.Only/2.0.0": { "type": "package", "path": "analyzer.only/2.0.0" }
  },
  "packageFolders": {}
}"#;

fn package_workspace() -> Workspace {
    let ws = Workspace::new();
    ws.write("obj/project.assets.json", ASSETS);
    fs::create_dir_all(ws.path().join("packages/pkg.tools/1.0.0")).unwrap();
    fs::create_dir_all(ws.path().join("packages/analyzer.only/2.0.0")).unwrap();
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "packageReferences": ["Pkg.Tools", "Analyzer.Only"],
        "assetsFile": "obj/project.assets.json",
        "targetMoniker": "net8.0",
        "packageFolders": ["packages"]
    }));
    ws
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    Command::cargo_bin("reftrim")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reftrim"))
        .stdout(predicate::str::contains("--assets-file"))
        .stdout(predicate::str::contains("--fail-on-removable"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("reftrim")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reftrim"));
}

#[test]
fn test_cli_missing_inputs_fails() {
    let ws = Workspace::new();
    ws.command()
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load project inputs"));
}

// ============================================================================
// Classification Tests
// ============================================================================

#[test]
fn test_unused_binary_reference_msbuild_format() {
    let ws = Workspace::new();
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "System.Data" }]
    }));

    ws.command()
        .args(["--format", "msbuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "App.csproj : warning RT0001: Reference System.Data can be removed",
        ));
}

#[test]
fn test_framework_assembly_is_never_reported() {
    let ws = Workspace::new();
    ws.write(
        "ref/RedistList/FrameworkList.xml",
        r#"<FileList><File AssemblyName="System.Data" /></FileList>"#,
    );
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "System.Data" }]
    }));

    ws.command()
        .args(["--format", "msbuild", "--framework-dir", "ref"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RT0001").not());
}

#[test]
fn test_project_reference_json_format() {
    let ws = Workspace::new();
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "projectReferences": [{
            "fusionName": "Lib, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null",
            "originalItemSpec": "../Lib/Lib.csproj"
        }]
    }));

    let output = ws.command().args(["--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_issues"], 1);
    assert_eq!(report["issues"][0]["code"], "RT0002");
    assert_eq!(
        report["issues"][0]["message"],
        "ProjectReference ../Lib/Lib.csproj can be removed"
    );
}

#[test]
fn test_build_logic_and_assetless_packages_are_kept() {
    let ws = package_workspace();

    ws.command()
        .args(["--format", "msbuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RT0003").not());
}

#[test]
fn test_unreadable_package_assembly_fails() {
    let ws = Workspace::new();
    ws.write(
        "obj/project.assets.json",
        r#"{
          "targets": {
            "net8.0": {
              "Pkg.Bad/1.0.0": { "type": "package", "compile": { "lib/net8.0/Pkg.Bad.dll": {} } }
            }
          },
          "libraries": { "Pkg.Bad/1.0.0": { "type": "package", "path": "pkg.bad/1.0.0" } }
        }"#,
    );
    ws.write("packages/pkg.bad/1.0.0/lib/net8.0/Pkg.Bad.dll", "not a portable executable");
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "packageReferences": ["Pkg.Bad"],
        "assetsFile": "obj/project.assets.json",
        "targetMoniker": "net8.0",
        "packageFolders": ["packages"]
    }));

    ws.command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Pkg.Bad.dll"));
}

#[test]
fn test_missing_package_directory_fails() {
    let ws = package_workspace();
    fs::remove_dir_all(ws.path().join("packages/pkg.tools")).unwrap();

    ws.command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("pkg.tools/1.0.0"));
}

#[test]
fn test_missing_target_fails() {
    let ws = package_workspace();

    ws.command()
        .args(["--target-moniker", "net6.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("net6.0"));
}

#[test]
fn test_long_form_moniker_selects_target() {
    let ws = package_workspace();

    ws.command()
        .args(["--target-moniker", ".NETCoreApp,Version=v8.0"])
        .assert()
        .success();
}

// ============================================================================
// Config, Baseline and Exit Code Tests
// ============================================================================

#[test]
fn test_fail_on_removable() {
    let ws = Workspace::new();
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "Vendor.Legacy" }]
    }));

    ws.command()
        .arg("--fail-on-removable")
        .assert()
        .failure()
        .stderr(predicate::str::contains("removable references found"));
}

#[test]
fn test_config_disables_codes_and_ignores_identities() {
    let ws = Workspace::new();
    ws.write(
        ".reftrim.yml",
        "ignore:\n  - \"Vendor.*\"\ndisabled_codes:\n  - RT0002\nfail_on_removable: true\n",
    );
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "Vendor.Legacy" }],
        "projectReferences": [{ "fusionName": "Lib", "originalItemSpec": "../Lib/Lib.csproj" }]
    }));

    ws.command()
        .args(["--format", "msbuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning").not());
}

#[test]
fn test_baseline_round_trip() {
    let ws = Workspace::new();
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "Vendor.Legacy" }, { "itemSpec": "Vendor.Old" }]
    }));

    ws.command()
        .args(["--format", "msbuild", "--generate-baseline", "baseline.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RT0001"));
    assert!(ws.path().join("baseline.json").exists());

    ws.command()
        .args(["--format", "msbuild", "--baseline", "baseline.json", "--fail-on-removable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RT0001").not());
}

#[test]
fn test_corrupt_baseline_is_a_warning() {
    let ws = Workspace::new();
    ws.write("baseline.json", "{ not json");
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "Vendor.Legacy" }]
    }));

    ws.command()
        .args(["--format", "msbuild", "--baseline", "baseline.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RT0001"))
        .stderr(predicate::str::contains("Failed to load baseline"));
}

#[test]
fn test_sarif_output_file() {
    let ws = Workspace::new();
    ws.inputs(json!({
        "projectFile": "App.csproj",
        "references": [{ "itemSpec": "Vendor.Legacy" }]
    }));

    ws.command()
        .args(["--format", "sarif", "--output", "report.sarif"])
        .assert()
        .success();

    let sarif: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.path().join("report.sarif")).unwrap()).unwrap();
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(sarif["runs"][0]["results"][0]["ruleId"], "RT0001");
}
