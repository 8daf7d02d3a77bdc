//! Assembly identity: reading declared names from binaries and turning
//! declared references into canonical simple names

mod fusion;
mod identity;
pub mod metadata;

pub use fusion::simple_name_from_display_name;
pub use identity::IdentityResolver;
pub use metadata::MetadataReader;

use crate::error::{Error, Result};
use crate::names::AssemblyName;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads the name an assembly declares for itself
///
/// Passed explicitly to everything that inspects binaries, so callers choose
/// between real PE parsing and a lookup table.
pub trait AssemblyNameReader: Send + Sync {
    fn read_assembly_name(&self, path: &Path) -> Result<AssemblyName>;
}

impl<R: AssemblyNameReader + ?Sized> AssemblyNameReader for &R {
    fn read_assembly_name(&self, path: &Path) -> Result<AssemblyName> {
        (**self).read_assembly_name(path)
    }
}

/// Fixed path-to-name table, for hosts that already know the names
#[derive(Debug, Default, Clone)]
pub struct StaticNameReader {
    names: HashMap<PathBuf, AssemblyName>,
}

impl StaticNameReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, name: impl Into<AssemblyName>) -> Self {
        self.insert(path, name);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, name: impl Into<AssemblyName>) {
        self.names.insert(path.into(), name.into());
    }
}

impl AssemblyNameReader for StaticNameReader {
    fn read_assembly_name(&self, path: &Path) -> Result<AssemblyName> {
        self.names
            .get(path)
            .cloned()
            .ok_or_else(|| Error::unreadable(path, "no assembly name registered for this path"))
    }
}
