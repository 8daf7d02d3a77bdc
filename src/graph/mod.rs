//! Package dependency graph of one lock-file target
//!
//! Edges point from a package to each of its direct dependencies, so the
//! dependants of a package are its incoming edges. Both views come from the
//! same edge set.

mod builder;

pub use builder::PackageGraphBuilder;

use crate::names::{AssemblyName, PackageId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// One resolved package with its raw (non-transitive) assets
#[derive(Debug, Clone, Default)]
pub struct PackageNode {
    pub id: PackageId,

    /// Direct dependency ids, in lock-file order
    pub dependencies: Vec<PackageId>,

    /// Names of the package's own compile-time assemblies
    pub compile_assemblies: Vec<AssemblyName>,

    /// Absolute paths of the package's own build files
    pub build_files: Vec<PathBuf>,

    /// Absolute on-disk package directory
    pub root: PathBuf,
}

impl PackageNode {
    pub fn new(id: impl Into<PackageId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn has_assets(&self) -> bool {
        !self.compile_assemblies.is_empty() || !self.build_files.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PackageGraph {
    /// Nodes are package ids, an edge A -> B means A depends on B
    inner: DiGraph<PackageId, ()>,

    /// Map from package id to node index
    node_map: HashMap<PackageId, NodeIndex>,

    /// Resolved packages in insertion (lock-file) order
    packages: Vec<PackageNode>,

    package_index: HashMap<PackageId, usize>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from already resolved packages
    pub fn from_packages(packages: impl IntoIterator<Item = PackageNode>) -> Self {
        let mut graph = Self::new();
        for package in packages {
            graph.add_package(package);
        }
        graph
    }

    /// Add a resolved package and the edges to its dependencies
    ///
    /// Dependencies that are never added as packages themselves still get a
    /// node. A second package with the same id is ignored.
    pub fn add_package(&mut self, package: PackageNode) {
        if self.package_index.contains_key(&package.id) {
            warn!("Package {} listed twice, keeping the first entry", package.id);
            return;
        }

        let from = self.ensure_node(&package.id);
        for dependency in &package.dependencies {
            let to = self.ensure_node(dependency);
            self.inner.update_edge(from, to, ());
        }

        self.package_index.insert(package.id.clone(), self.packages.len());
        self.packages.push(package);
    }

    fn ensure_node(&mut self, id: &PackageId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(id.clone());
        self.node_map.insert(id.clone(), idx);
        idx
    }

    /// Resolved packages in lock-file order
    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.packages.iter()
    }

    pub fn get_package(&self, id: &PackageId) -> Option<&PackageNode> {
        self.package_index.get(id).map(|&i| &self.packages[i])
    }

    /// Packages `id` depends on directly
    pub fn dependencies(&self, id: &PackageId) -> Vec<&PackageId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Packages that depend directly on `id`
    pub fn dependants(&self, id: &PackageId) -> Vec<&PackageId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &PackageId, direction: Direction) -> Vec<&PackageId> {
        let Some(&node_idx) = self.node_map.get(id) else {
            return Vec::new();
        };

        self.inner
            .edges_directed(node_idx, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.inner.node_weight(other)
            })
            .collect()
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}
