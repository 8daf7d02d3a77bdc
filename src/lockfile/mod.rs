//! Resolved restore output (`project.assets.json`)
//!
//! Only the parts the dependency analysis needs are modelled: per-target
//! libraries with their dependencies and compile/build assets, the library
//! table (for package paths) and the package folders.

mod framework;

pub use framework::{frameworks_match, TargetFramework};

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Map;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix NuGet uses for placeholder assets that mean "nothing here"
pub const EMPTY_FOLDER_MARKER: &str = "_._";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    #[serde(default)]
    pub version: u32,

    /// Target key (`net8.0`, `net8.0/win-x64`) to libraries keyed by `Id/Version`
    #[serde(default)]
    pub targets: Map<String, serde_json::Value>,

    #[serde(default)]
    pub libraries: Map<String, serde_json::Value>,

    /// Package folders in priority order
    #[serde(default)]
    pub package_folders: Map<String, serde_json::Value>,
}

/// One library entry of a target
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetLibrary {
    #[serde(rename = "type")]
    pub kind: String,

    /// Dependency id to version range, in declaration order
    pub dependencies: Map<String, serde_json::Value>,

    pub compile: Map<String, serde_json::Value>,

    pub build: Map<String, serde_json::Value>,
}

impl TargetLibrary {
    pub fn is_package(&self) -> bool {
        self.kind.eq_ignore_ascii_case("package")
    }

    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    /// Compile asset paths, without empty-folder placeholders
    pub fn compile_assets(&self) -> impl Iterator<Item = &str> {
        self.compile
            .keys()
            .map(String::as_str)
            .filter(|path| !path.ends_with(EMPTY_FOLDER_MARKER))
    }

    pub fn build_assets(&self) -> impl Iterator<Item = &str> {
        self.build.keys().map(String::as_str)
    }
}

/// Library table entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Library {
    #[serde(rename = "type")]
    pub kind: String,

    /// Path relative to a package folder, e.g. `newtonsoft.json/13.0.3`
    pub path: Option<String>,
}

/// A resolved library of the selected target
#[derive(Debug, Clone)]
pub struct ResolvedLibrary {
    pub name: String,
    pub version: String,
    pub library: TargetLibrary,
}

/// The target selected for analysis
#[derive(Debug, Clone)]
pub struct LockFileTarget {
    pub key: String,
    pub libraries: Vec<ResolvedLibrary>,
}

impl LockFileTarget {
    /// Package-type libraries only
    pub fn packages(&self) -> impl Iterator<Item = &ResolvedLibrary> {
        self.libraries.iter().filter(|l| l.library.is_package())
    }
}

impl LockFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::LockFileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let lock_file: LockFile = serde_json::from_str(&contents).map_err(|source| Error::LockFileParse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            "Loaded lock file {} (version {}, {} targets, {} libraries)",
            path.display(),
            lock_file.version,
            lock_file.targets.len(),
            lock_file.libraries.len()
        );

        Ok(lock_file)
    }

    pub fn package_folders(&self) -> Vec<PathBuf> {
        self.package_folders.keys().map(PathBuf::from).collect()
    }

    /// Select the target for a framework moniker and optional runtime identifier
    pub fn target(&self, moniker: &str, runtime_identifier: Option<&str>) -> Result<LockFileTarget> {
        let rid = runtime_identifier.filter(|r| !r.is_empty());

        let (key, libraries) = self
            .targets
            .iter()
            .find(|(key, _)| target_key_matches(key, moniker, rid))
            .ok_or_else(|| Error::TargetNotFound {
                target: match rid {
                    Some(rid) => format!("{}/{}", moniker, rid),
                    None => moniker.to_string(),
                },
                available: self.targets.keys().cloned().collect::<Vec<_>>().join(", "),
            })?;

        let libraries = libraries
            .as_object()
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id_version, value)| {
                        let (name, version) = split_library_key(id_version);
                        let library = serde_json::from_value(value.clone()).map_err(|source| {
                            Error::LockFileParse {
                                path: PathBuf::from(format!("targets/{}/{}", key, id_version)),
                                source,
                            }
                        })?;
                        Ok(ResolvedLibrary {
                            name: name.to_string(),
                            version: version.to_string(),
                            library,
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        debug!("Selected target {} with {} libraries", key, libraries.len());

        Ok(LockFileTarget {
            key: key.clone(),
            libraries,
        })
    }

    /// Look up the library table entry for a resolved library
    pub fn library(&self, name: &str, version: &str) -> Result<Library> {
        let not_found = || Error::LibraryNotFound {
            id: name.to_string(),
            version: version.to_string(),
        };

        let (_, value) = self
            .libraries
            .iter()
            .find(|(key, _)| {
                let (id, v) = split_library_key(key);
                id.eq_ignore_ascii_case(name) && v.eq_ignore_ascii_case(version)
            })
            .ok_or_else(not_found)?;

        serde_json::from_value(value.clone()).map_err(|_| not_found())
    }
}

fn split_library_key(key: &str) -> (&str, &str) {
    key.split_once('/').unwrap_or((key, ""))
}

fn target_key_matches(key: &str, moniker: &str, rid: Option<&str>) -> bool {
    let (framework, key_rid) = match key.split_once('/') {
        Some((framework, key_rid)) => (framework, Some(key_rid)),
        None => (key, None),
    };

    let rid_matches = match (key_rid, rid) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    };

    rid_matches && frameworks_match(framework, moniker)
}
