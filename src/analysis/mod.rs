//! Reference necessity analysis
//!
//! Data flows from the identity resolver, framework catalog and package
//! graph into the aggregator, and from there into the classifier. Only the
//! classifier produces output.

mod aggregate;
mod classifier;

pub use aggregate::{aggregate, PackageInfo};
pub use classifier::{Classification, Classifier, DiagnosticCode, ReferenceKind};

use crate::assembly::{AssemblyNameReader, IdentityResolver};
use crate::error::{Error, Result};
use crate::framework::FrameworkCatalog;
use crate::graph::PackageGraphBuilder;
use crate::lockfile::LockFile;
use crate::names::PackageId;
use crate::project::ProjectInputs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of analyzing one project
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub classifications: Vec<Classification>,

    /// Distinct assemblies the compiled output uses
    pub used_assemblies: usize,

    /// Assemblies provided by the target framework
    pub ambient_assemblies: usize,

    /// Packages with aggregated assets
    pub analyzed_packages: usize,
}

/// Runs the whole pipeline for one project
pub struct Analyzer<'a> {
    reader: &'a dyn AssemblyNameReader,

    /// Package folders tried after the ones from the inputs or lock file
    extra_package_folders: Vec<PathBuf>,
}

impl<'a> Analyzer<'a> {
    pub fn new(reader: &'a dyn AssemblyNameReader) -> Self {
        Self {
            reader,
            extra_package_folders: Vec::new(),
        }
    }

    pub fn with_extra_package_folders(mut self, folders: Vec<PathBuf>) -> Self {
        self.extra_package_folders = folders;
        self
    }

    pub fn analyze(&self, inputs: &ProjectInputs) -> Result<AnalysisResult> {
        let project_path = inputs.project_path();
        let project_dir = project_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| inputs.base_dir.clone());
        info!("Analyzing references of {}", project_path.display());

        let resolver = IdentityResolver::new(self.reader, project_dir);

        let used_paths: Vec<PathBuf> = inputs.used_references.iter().map(|p| inputs.resolve(p)).collect();
        let used = resolver.used_assemblies(&used_paths)?;
        debug!("{} used assemblies", used.len());

        let framework_dirs: Vec<PathBuf> = inputs
            .target_framework_directories
            .iter()
            .map(|p| inputs.resolve(p))
            .collect();
        let ambient = FrameworkCatalog::load(&framework_dirs)?;
        if ambient.is_empty() {
            debug!("No framework assemblies listed, binary references are judged by use only");
        } else {
            debug!("{} framework assemblies", ambient.len());
        }

        let packages = self.package_infos(inputs)?;

        let classifier = Classifier::new(&used, &ambient, &packages, &resolver);
        let classifications = classifier.classify(
            &inputs.references,
            &inputs.project_references,
            &inputs.package_references,
        )?;

        info!("{} removable references", classifications.len());

        Ok(AnalysisResult {
            classifications,
            used_assemblies: used.len(),
            ambient_assemblies: ambient.len(),
            analyzed_packages: packages.len(),
        })
    }

    fn package_infos(&self, inputs: &ProjectInputs) -> Result<HashMap<PackageId, PackageInfo>> {
        let Some(assets_file) = inputs.assets_file.as_ref() else {
            if !inputs.package_references.is_empty() {
                warn!(
                    "No assets file given, {} package references are not analyzed",
                    inputs.package_references.len()
                );
            }
            return Ok(HashMap::new());
        };

        let assets_path = inputs.resolve(assets_file);
        let moniker = inputs
            .target_moniker
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::MissingTargetMoniker(assets_path.clone()))?;

        let lock_file = LockFile::load(&assets_path)?;
        let target = lock_file.target(moniker, inputs.runtime_identifier.as_deref())?;

        let graph = PackageGraphBuilder::new(self.reader, self.package_folders(inputs, &lock_file))
            .build(&lock_file, &target)?;

        Ok(aggregate(&graph))
    }

    /// Explicit folders win over the lock file's; extra folders come last
    fn package_folders(&self, inputs: &ProjectInputs, lock_file: &LockFile) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = if inputs.package_folders.is_empty() {
            lock_file.package_folders()
        } else {
            inputs.package_folders.iter().map(|p| inputs.resolve(p)).collect()
        };

        for folder in &self.extra_package_folders {
            if !folders.contains(folder) {
                folders.push(folder.clone());
            }
        }

        debug!("Package folders: {:?}", folders);
        folders
    }
}
