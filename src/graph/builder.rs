use super::{PackageGraph, PackageNode};
use crate::assembly::AssemblyNameReader;
use crate::error::{Error, Result};
use crate::lockfile::{LockFile, LockFileTarget, ResolvedLibrary};
use crate::names::{AssemblyName, PackageId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds the package graph of a selected lock-file target
///
/// Package directories are looked up in the package folders in order; the
/// first folder holding the package wins.
pub struct PackageGraphBuilder<'a> {
    reader: &'a dyn AssemblyNameReader,
    package_folders: Vec<PathBuf>,
}

impl<'a> PackageGraphBuilder<'a> {
    pub fn new(reader: &'a dyn AssemblyNameReader, package_folders: Vec<PathBuf>) -> Self {
        Self {
            reader,
            package_folders,
        }
    }

    pub fn build(&self, lock_file: &LockFile, target: &LockFileTarget) -> Result<PackageGraph> {
        let mut graph = PackageGraph::new();

        for library in target.packages() {
            let root = self.package_root(lock_file, library)?;
            let node = self.resolve_package(library, root)?;
            debug!(
                "Package {}: {} dependencies, {} compile assemblies, {} build files",
                node.id,
                node.dependencies.len(),
                node.compile_assemblies.len(),
                node.build_files.len()
            );
            graph.add_package(node);
        }

        debug!(
            "Package graph for {}: {} packages, {} edges",
            target.key,
            graph.package_count(),
            graph.edge_count()
        );

        Ok(graph)
    }

    fn resolve_package(&self, library: &ResolvedLibrary, root: PathBuf) -> Result<PackageNode> {
        let compile_assemblies = library
            .library
            .compile_assets()
            .map(|asset| self.reader.read_assembly_name(&root.join(asset)))
            .collect::<Result<Vec<AssemblyName>>>()?;

        let build_files = library.library.build_assets().map(|asset| root.join(asset)).collect();

        Ok(PackageNode {
            id: PackageId::new(library.name.as_str()),
            dependencies: library.library.dependency_ids().map(PackageId::from).collect(),
            compile_assemblies,
            build_files,
            root,
        })
    }

    /// Absolute directory of a package in the first folder that has it
    fn package_root(&self, lock_file: &LockFile, library: &ResolvedLibrary) -> Result<PathBuf> {
        let entry = lock_file.library(&library.name, &library.version)?;
        let relative_path = entry.path.filter(|p| !p.is_empty()).ok_or_else(|| Error::LibraryNotFound {
            id: library.name.clone(),
            version: library.version.clone(),
        })?;

        self.package_folders
            .iter()
            .map(|folder| folder.join(Path::new(&relative_path)))
            .find(|candidate| candidate.is_dir())
            .ok_or_else(|| Error::PackageFolderNotFound {
                id: library.name.clone(),
                relative_path: relative_path.clone(),
                folders: self
                    .package_folders
                    .iter()
                    .map(|f| f.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
