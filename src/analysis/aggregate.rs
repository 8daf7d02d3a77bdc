use crate::graph::PackageGraph;
use crate::names::{AssemblyName, PackageId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use tracing::debug;

/// Everything a package makes available, directly or through its dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub compile_assemblies: BTreeSet<AssemblyName>,
    pub build_files: BTreeSet<PathBuf>,
}

impl PackageInfo {
    pub fn has_build_logic(&self) -> bool {
        !self.build_files.is_empty()
    }

    /// Whether any of the package's assemblies is among `used`
    pub fn provides_any(&self, used: &HashSet<AssemblyName>) -> bool {
        self.compile_assemblies.iter().any(|a| used.contains(a))
    }
}

/// Mutable accumulator, frozen into [`PackageInfo`] once propagation is done
#[derive(Debug, Default)]
struct PackageInfoBuilder {
    compile_assemblies: BTreeSet<AssemblyName>,
    build_files: BTreeSet<PathBuf>,
}

impl PackageInfoBuilder {
    fn add(&mut self, assemblies: &[AssemblyName], build_files: &[PathBuf]) {
        self.compile_assemblies.extend(assemblies.iter().cloned());
        self.build_files.extend(build_files.iter().cloned());
    }

    fn freeze(self) -> PackageInfo {
        PackageInfo {
            compile_assemblies: self.compile_assemblies,
            build_files: self.build_files,
        }
    }
}

/// Propagate each package's raw assets to every package that depends on it,
/// directly or transitively
///
/// One breadth-first walk over dependants per contributing package; the
/// seen-set keeps cycles finite. This is O(P * (P + E)), fine for lock files.
/// Packages never reached by a contributor have no entry.
pub fn aggregate(graph: &PackageGraph) -> HashMap<PackageId, PackageInfo> {
    let mut builders: HashMap<PackageId, PackageInfoBuilder> = HashMap::new();

    for source in graph.packages().filter(|p| p.has_assets()) {
        let mut seen: HashSet<&PackageId> = HashSet::new();
        let mut queue: VecDeque<&PackageId> = VecDeque::new();
        seen.insert(&source.id);
        queue.push_back(&source.id);

        while let Some(current) = queue.pop_front() {
            builders
                .entry(current.clone())
                .or_default()
                .add(&source.compile_assemblies, &source.build_files);

            for dependant in graph.dependants(current) {
                if seen.insert(dependant) {
                    queue.push_back(dependant);
                }
            }
        }

        debug!("Propagated assets of {} to {} packages", source.id, seen.len());
    }

    builders
        .into_iter()
        .map(|(id, builder)| (id, builder.freeze()))
        .collect()
}
