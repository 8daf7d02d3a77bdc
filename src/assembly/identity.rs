use super::AssemblyNameReader;
use crate::error::Result;
use crate::names::AssemblyName;
use crate::project::BinaryReference;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Turns declared references into canonical assembly names
///
/// Relative paths are resolved against the project directory.
pub struct IdentityResolver<'a> {
    reader: &'a dyn AssemblyNameReader,
    base_dir: PathBuf,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(reader: &'a dyn AssemblyNameReader, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            base_dir: base_dir.into(),
        }
    }

    fn locate(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Resolve a binary reference's assembly name
    ///
    /// An existing hint path wins; then the item spec itself when the
    /// reference carries a logical name and the spec points at a file;
    /// otherwise the spec is taken as the name. Once a file is selected a
    /// read failure is returned as is.
    pub fn resolve(&self, reference: &BinaryReference) -> Result<AssemblyName> {
        if let Some(hint) = non_empty(reference.hint_path.as_deref()) {
            let hint_path = self.locate(hint);
            if hint_path.is_file() {
                debug!("Resolving {} through hint path {}", reference.item_spec, hint_path.display());
                return self.reader.read_assembly_name(&hint_path);
            }
        }

        if non_empty(reference.name.as_deref()).is_some() {
            let spec_path = self.locate(&reference.item_spec);
            if spec_path.is_file() {
                debug!("Resolving {} through its item spec", reference.item_spec);
                return self.reader.read_assembly_name(&spec_path);
            }
        }

        Ok(AssemblyName::new(reference.item_spec.as_str()))
    }

    /// Read the names of every binary the compiled output actually uses
    pub fn used_assemblies(&self, used_references: &[PathBuf]) -> Result<HashSet<AssemblyName>> {
        let names = used_references
            .par_iter()
            .map(|path| self.reader.read_assembly_name(&self.base_dir.join(path)))
            .collect::<Result<Vec<_>>>()?;

        Ok(names.into_iter().collect())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
