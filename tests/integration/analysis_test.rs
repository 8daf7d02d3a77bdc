//! Integration tests for the reftrim analysis pipeline
//!
//! Each test lays out a project, a lock file and a package cache in a
//! temporary directory. Assembly names come from a lookup table keyed by the
//! paths the pipeline will read.

use reftrim::project::{BinaryReference, PackageReference, ProjectReference};
use reftrim::{Analyzer, Classification, ErrorKind, ProjectInputs, StaticNameReader};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One package of a synthetic lock file
struct Package {
    id: &'static str,
    dependencies: Vec<&'static str>,
    /// (asset path, assembly name)
    compile: Vec<(&'static str, &'static str)>,
    build: Vec<&'static str>,
}

fn package(id: &'static str) -> Package {
    Package {
        id,
        dependencies: Vec::new(),
        compile: Vec::new(),
        build: Vec::new(),
    }
}

impl Package {
    fn depends_on(mut self, ids: &[&'static str]) -> Self {
        self.dependencies.extend_from_slice(ids);
        self
    }

    fn assembly(mut self, asset: &'static str, name: &'static str) -> Self {
        self.compile.push((asset, name));
        self
    }

    fn placeholder(mut self) -> Self {
        self.compile.push(("lib/netstandard2.0/_._", ""));
        self
    }

    fn build_file(mut self, asset: &'static str) -> Self {
        self.build.push(asset);
        self
    }

    fn folder(&self) -> String {
        format!("{}/1.0.0", self.id.to_lowercase())
    }
}

/// A project directory with a lock file and package cache
struct Fixture {
    dir: TempDir,
    reader: StaticNameReader,
    inputs: ProjectInputs,
}

impl Fixture {
    fn new(packages: Vec<Package>) -> Self {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("packages");
        let mut reader = StaticNameReader::new();

        let mut target = Map::new();
        let mut libraries = Map::new();

        for package in &packages {
            let root = cache.join(package.folder());
            fs::create_dir_all(&root).unwrap();

            let mut compile = Map::new();
            for (asset, name) in &package.compile {
                compile.insert(asset.to_string(), json!({}));
                if !name.is_empty() {
                    reader.insert(root.join(asset), *name);
                }
            }

            let dependencies: Map<String, Value> = package
                .dependencies
                .iter()
                .map(|d| (d.to_string(), json!("1.0.0")))
                .collect();
            let build: Map<String, Value> = package.build.iter().map(|b| (b.to_string(), json!({}))).collect();

            let key = format!("{}/1.0.0", package.id);
            target.insert(
                key.clone(),
                json!({
                    "type": "package",
                    "dependencies": dependencies,
                    "compile": compile,
                    "build": build,
                }),
            );
            libraries.insert(key, json!({ "type": "package", "path": package.folder() }));
        }

        let mut package_folders = Map::new();
        package_folders.insert(cache.to_string_lossy().to_string(), json!({}));

        let assets = json!({
            "version": 3,
            "targets": { "net8.0": target },
            "libraries": libraries,
            "packageFolders": package_folders,
        });
        let assets_path = dir.path().join("obj/project.assets.json");
        fs::create_dir_all(assets_path.parent().unwrap()).unwrap();
        fs::write(&assets_path, assets.to_string()).unwrap();

        let inputs = ProjectInputs {
            project_file: PathBuf::from("App.csproj"),
            assets_file: Some(PathBuf::from("obj/project.assets.json")),
            target_moniker: Some("net8.0".to_string()),
            base_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        Self { dir, reader, inputs }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Mark assemblies as used by the compiled output
    fn uses(&mut self, names: &[&str]) {
        for name in names {
            let path = self.path().join("bin").join(format!("{}.dll", name));
            self.reader.insert(path.clone(), *name);
            self.inputs.used_references.push(path);
        }
    }

    fn references_packages(&mut self, ids: &[&str]) {
        self.inputs
            .package_references
            .extend(ids.iter().map(|id| PackageReference::from(*id)));
    }

    fn run(&self) -> Vec<Classification> {
        Analyzer::new(&self.reader)
            .analyze(&self.inputs)
            .unwrap()
            .classifications
    }
}

fn codes(results: &[Classification]) -> Vec<(String, String)> {
    results
        .iter()
        .map(|r| (r.code.code().to_string(), r.identity.clone()))
        .collect()
}

#[test]
fn test_unused_binary_reference_scenario() {
    let mut fixture = Fixture::new(vec![]);
    fixture.uses(&["Newtonsoft.Json"]);
    fixture.inputs.references.push(BinaryReference {
        item_spec: "System.Data".to_string(),
        ..Default::default()
    });

    let results = fixture.run();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].code.code(), "RT0001");
    assert_eq!(results[0].message, "Reference System.Data can be removed");
}

#[test]
fn test_transitive_assembly_keeps_package() {
    let mut fixture = Fixture::new(vec![
        package("Pkg.A").depends_on(&["Pkg.B"]).placeholder(),
        package("Pkg.B").assembly("lib/net8.0/Lib.B.dll", "Lib.B"),
    ]);
    fixture.uses(&["Lib.B"]);
    fixture.references_packages(&["Pkg.A"]);

    assert!(fixture.run().is_empty());
}

#[test]
fn test_unused_package_is_removable() {
    let mut fixture = Fixture::new(vec![
        package("Pkg.A").depends_on(&["Pkg.B"]).assembly("lib/net8.0/Lib.A.dll", "Lib.A"),
        package("Pkg.B").assembly("lib/net8.0/Lib.B.dll", "Lib.B"),
        package("Serilog").assembly("lib/net8.0/Serilog.dll", "Serilog"),
    ]);
    fixture.uses(&["Serilog"]);
    fixture.references_packages(&["Pkg.A", "serilog"]);

    assert_eq!(
        codes(&fixture.run()),
        vec![("RT0003".to_string(), "Pkg.A".to_string())]
    );
}

#[test]
fn test_diamond_propagation() {
    let mut fixture = Fixture::new(vec![
        package("A").depends_on(&["B", "C"]),
        package("B").depends_on(&["D"]),
        package("C").depends_on(&["D"]),
        package("D").assembly("lib/net8.0/D.dll", "D"),
    ]);
    fixture.uses(&["D"]);
    fixture.references_packages(&["A", "B", "C", "D"]);

    assert!(fixture.run().is_empty());
}

#[test]
fn test_cycle_terminates() {
    let mut fixture = Fixture::new(vec![
        package("A").depends_on(&["B"]).assembly("lib/net8.0/A.dll", "A"),
        package("B").depends_on(&["A"]),
    ]);
    fixture.uses(&["A"]);
    fixture.references_packages(&["B"]);

    assert!(fixture.run().is_empty());
}

#[test]
fn test_build_logic_exemption() {
    let mut fixture = Fixture::new(vec![
        package("Pkg.Tools").placeholder().build_file("build/Pkg.Tools.targets"),
        package("Pkg.Meta").depends_on(&["Pkg.Tools"]).assembly("lib/net8.0/Meta.dll", "Meta"),
    ]);
    fixture.references_packages(&["Pkg.Tools", "Pkg.Meta"]);

    assert!(fixture.run().is_empty());
}

#[test]
fn test_package_without_assets_is_not_judged() {
    let mut fixture = Fixture::new(vec![package("Analyzer.Only").placeholder()]);
    fixture.references_packages(&["Analyzer.Only", "Not.In.Lock.File"]);

    assert!(fixture.run().is_empty());
}

#[test]
fn test_ambient_and_package_owned_references_are_skipped() {
    let mut fixture = Fixture::new(vec![]);
    let framework = fixture.path().join("ref/net48");
    fs::create_dir_all(framework.join("RedistList")).unwrap();
    fs::write(
        framework.join("RedistList/FrameworkList.xml"),
        r#"<FileList><File AssemblyName="System.Xml" /><File Type="Analyzer" AssemblyName="System.Gen" /></FileList>"#,
    )
    .unwrap();
    fixture.inputs.target_framework_directories.push(PathBuf::from("ref/net48"));
    // A directory without a manifest is fine
    fixture.inputs.target_framework_directories.push(PathBuf::from("ref/missing"));

    for (spec, owner) in [("system.xml", None), ("System.Gen", None), ("Pkg.Lib", Some("Pkg"))] {
        fixture.inputs.references.push(BinaryReference {
            item_spec: spec.to_string(),
            nuget_package_id: owner.map(str::to_string),
            ..Default::default()
        });
    }

    assert_eq!(
        codes(&fixture.run()),
        vec![("RT0001".to_string(), "System.Gen".to_string())]
    );
}

#[test]
fn test_hint_path_identity() {
    let mut fixture = Fixture::new(vec![]);
    let hint = fixture.path().join("lib/Contoso.Core.dll");
    fs::create_dir_all(hint.parent().unwrap()).unwrap();
    fs::write(&hint, b"MZ").unwrap();
    fixture.reader.insert(hint, "Contoso.Core");
    fixture.uses(&["Contoso.Core"]);

    fixture.inputs.references.push(BinaryReference {
        item_spec: "Contoso".to_string(),
        hint_path: Some("lib/Contoso.Core.dll".to_string()),
        ..Default::default()
    });

    assert!(fixture.run().is_empty());
}

#[test]
fn test_output_order_and_idempotence() {
    let mut fixture = Fixture::new(vec![package("Unused.Pkg").assembly("lib/net8.0/Unused.dll", "Unused")]);
    fixture.references_packages(&["Unused.Pkg"]);
    fixture.inputs.project_references.push(ProjectReference {
        fusion_name: "Lib, Version=1.0.0.0".to_string(),
        original_item_spec: "../Lib/Lib.csproj".to_string(),
    });
    fixture.inputs.references.push(BinaryReference {
        item_spec: "Vendor".to_string(),
        ..Default::default()
    });

    let first = fixture.run();
    assert_eq!(
        codes(&first),
        vec![
            ("RT0001".to_string(), "Vendor".to_string()),
            ("RT0002".to_string(), "../Lib/Lib.csproj".to_string()),
            ("RT0003".to_string(), "Unused.Pkg".to_string()),
        ]
    );
    assert_eq!(first, fixture.run());
}

#[test]
fn test_explicit_package_folders_take_precedence() {
    let mut fixture = Fixture::new(vec![package("Pkg").assembly("lib/net8.0/Pkg.dll", "Pkg")]);
    fixture.inputs.package_folders.push(PathBuf::from("empty-cache"));
    fs::create_dir_all(fixture.path().join("empty-cache")).unwrap();

    let err = Analyzer::new(&fixture.reader).analyze(&fixture.inputs).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolutionInconsistency);

    // The real cache as an extra folder resolves it again
    let result = Analyzer::new(&fixture.reader)
        .with_extra_package_folders(vec![fixture.path().join("packages")])
        .analyze(&fixture.inputs)
        .unwrap();
    assert_eq!(result.analyzed_packages, 1);
}

#[test]
fn test_unreadable_used_reference_is_fatal() {
    let mut fixture = Fixture::new(vec![]);
    fixture.inputs.used_references.push(PathBuf::from("bin/Missing.dll"));

    let err = Analyzer::new(&fixture.reader).analyze(&fixture.inputs).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BinaryUnreadable);
}

#[test]
fn test_missing_moniker_is_input_error() {
    let mut fixture = Fixture::new(vec![]);
    fixture.inputs.target_moniker = None;

    let err = Analyzer::new(&fixture.reader).analyze(&fixture.inputs).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputMalformed);
}

#[test]
fn test_no_assets_file_skips_package_references() {
    let mut fixture = Fixture::new(vec![]);
    fixture.inputs.assets_file = None;
    fixture.references_packages(&["Anything"]);

    let result = Analyzer::new(&fixture.reader).analyze(&fixture.inputs).unwrap();
    assert!(result.classifications.is_empty());
    assert_eq!(result.analyzed_packages, 0);
}
