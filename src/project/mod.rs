//! Declared references of the project under analysis
//!
//! The build host writes an inputs document describing the project's
//! references and what the compiled output actually used. Relative paths in
//! it are resolved against the document's directory.

use crate::error::{Error, Result};
use crate::names::PackageId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A `Reference` item: a plain binary reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryReference {
    /// Item identity, either an assembly name or a path
    pub item_spec: String,

    pub hint_path: Option<String>,

    /// Logical name metadata
    pub name: Option<String>,

    /// Added by the SDK rather than the user
    pub is_implicitly_defined: bool,

    /// Set when the reference was contributed by a package
    #[serde(alias = "nuGetPackageId")]
    pub nuget_package_id: Option<String>,
}

impl BinaryReference {
    pub fn owning_package(&self) -> Option<&str> {
        self.nuget_package_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A `ProjectReference` item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectReference {
    /// Full display name of the referenced project's assembly
    pub fusion_name: String,

    /// Path to the referenced project file, as written in the project
    #[serde(alias = "originalProjectReferenceItemSpec")]
    pub original_item_spec: String,
}

/// A `PackageReference` item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageReference {
    Id(PackageId),
    Item { id: PackageId },
}

impl PackageReference {
    pub fn id(&self) -> &PackageId {
        match self {
            PackageReference::Id(id) | PackageReference::Item { id } => id,
        }
    }
}

impl From<&str> for PackageReference {
    fn from(id: &str) -> Self {
        PackageReference::Id(PackageId::from(id))
    }
}

/// Everything the host knows about one project build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectInputs {
    pub project_file: PathBuf,

    /// Binaries whose members the compiled output references
    pub used_references: Vec<PathBuf>,

    pub references: Vec<BinaryReference>,
    pub project_references: Vec<ProjectReference>,
    pub package_references: Vec<PackageReference>,

    /// Resolved lock file (`project.assets.json`)
    pub assets_file: Option<PathBuf>,

    /// Target framework moniker, e.g. `net8.0`
    pub target_moniker: Option<String>,

    pub runtime_identifier: Option<String>,

    pub target_framework_directories: Vec<PathBuf>,

    pub package_folders: Vec<PathBuf>,

    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ProjectInputs {
    /// Load an inputs document (JSON)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::InputsRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut inputs: ProjectInputs = serde_json::from_str(&contents).map_err(|e| Error::InputsRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        inputs.base_dir = if parent.is_absolute() {
            parent
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&parent))
                .unwrap_or(parent)
        };

        debug!(
            "Loaded inputs for {}: {} references, {} project references, {} package references, {} used",
            inputs.project_file.display(),
            inputs.references.len(),
            inputs.project_references.len(),
            inputs.package_references.len(),
            inputs.used_references.len()
        );

        Ok(inputs)
    }

    /// Resolve a path from the document against its directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Display path of the project, used as the diagnostic location
    pub fn project_path(&self) -> PathBuf {
        self.resolve(&self.project_file)
    }
}
