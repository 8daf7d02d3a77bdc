use super::PackageInfo;
use crate::assembly::{simple_name_from_display_name, IdentityResolver};
use crate::error::Result;
use crate::framework::FrameworkCatalog;
use crate::names::{AssemblyName, PackageId};
use crate::project::{BinaryReference, PackageReference, ProjectReference};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    #[serde(rename = "RT0001")]
    ReferenceRemovable,
    #[serde(rename = "RT0002")]
    ProjectReferenceRemovable,
    #[serde(rename = "RT0003")]
    PackageReferenceRemovable,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 3] = [
        DiagnosticCode::ReferenceRemovable,
        DiagnosticCode::ProjectReferenceRemovable,
        DiagnosticCode::PackageReferenceRemovable,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticCode::ReferenceRemovable => "RT0001",
            DiagnosticCode::ProjectReferenceRemovable => "RT0002",
            DiagnosticCode::PackageReferenceRemovable => "RT0003",
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            DiagnosticCode::ReferenceRemovable => ReferenceKind::Reference,
            DiagnosticCode::ProjectReferenceRemovable => ReferenceKind::ProjectReference,
            DiagnosticCode::PackageReferenceRemovable => ReferenceKind::PackageReference,
        }
    }

    /// Short rule description, used by SARIF output
    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticCode::ReferenceRemovable => "Binary reference is not used by the compiled output",
            DiagnosticCode::ProjectReferenceRemovable => "Project reference is not used by the compiled output",
            DiagnosticCode::PackageReferenceRemovable => {
                "Package reference provides nothing the compiled output uses"
            }
        }
    }

    pub fn message(&self, identity: &str) -> String {
        format!("{} {} can be removed", self.kind(), identity)
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Which kind of declared item a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceKind {
    Reference,
    ProjectReference,
    PackageReference,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Reference => "Reference",
            ReferenceKind::ProjectReference => "ProjectReference",
            ReferenceKind::PackageReference => "PackageReference",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared reference that can be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub code: DiagnosticCode,
    pub kind: ReferenceKind,
    /// How the reference is written in the project
    pub identity: String,
    pub message: String,
}

impl Classification {
    pub fn new(code: DiagnosticCode, identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            code,
            kind: code.kind(),
            message: code.message(&identity),
            identity,
        }
    }
}

/// Decides, per declared reference, whether the build actually needs it
///
/// All inputs are read-only; classifying twice gives the same result.
pub struct Classifier<'a> {
    used: &'a HashSet<AssemblyName>,
    ambient: &'a FrameworkCatalog,
    packages: &'a HashMap<PackageId, PackageInfo>,
    resolver: &'a IdentityResolver<'a>,
}

impl<'a> Classifier<'a> {
    pub fn new(
        used: &'a HashSet<AssemblyName>,
        ambient: &'a FrameworkCatalog,
        packages: &'a HashMap<PackageId, PackageInfo>,
        resolver: &'a IdentityResolver<'a>,
    ) -> Self {
        Self {
            used,
            ambient,
            packages,
            resolver,
        }
    }

    /// Classify every declared reference: binary references first, then
    /// project references, then package references
    pub fn classify(
        &self,
        references: &[BinaryReference],
        project_references: &[ProjectReference],
        package_references: &[PackageReference],
    ) -> Result<Vec<Classification>> {
        let mut results = Vec::new();

        for reference in references {
            results.extend(self.classify_reference(reference)?);
        }
        for reference in project_references {
            results.extend(self.classify_project_reference(reference)?);
        }
        for reference in package_references {
            results.extend(self.classify_package_reference(reference));
        }

        Ok(results)
    }

    pub fn classify_reference(&self, reference: &BinaryReference) -> Result<Option<Classification>> {
        if reference.is_implicitly_defined {
            debug!("{}: implicitly defined, skipped", reference.item_spec);
            return Ok(None);
        }

        // Checked before the owning package so framework assemblies are never judged
        if self.ambient.contains(&AssemblyName::new(reference.item_spec.as_str())) {
            debug!("{}: ships with the framework, skipped", reference.item_spec);
            return Ok(None);
        }

        if let Some(package) = reference.owning_package() {
            debug!("{}: contributed by package {}, skipped", reference.item_spec, package);
            return Ok(None);
        }

        let name = self.resolver.resolve(reference)?;
        if self.used.contains(&name) {
            return Ok(None);
        }

        Ok(Some(Classification::new(
            DiagnosticCode::ReferenceRemovable,
            reference.item_spec.as_str(),
        )))
    }

    pub fn classify_project_reference(&self, reference: &ProjectReference) -> Result<Option<Classification>> {
        let name = simple_name_from_display_name(&reference.fusion_name)?;
        if self.used.contains(&name) {
            return Ok(None);
        }

        Ok(Some(Classification::new(
            DiagnosticCode::ProjectReferenceRemovable,
            reference.original_item_spec.as_str(),
        )))
    }

    pub fn classify_package_reference(&self, reference: &PackageReference) -> Option<Classification> {
        let id = reference.id();

        let Some(info) = self.packages.get(id) else {
            debug!("{}: nothing known about this package, skipped", id);
            return None;
        };

        if info.has_build_logic() {
            debug!("{}: injects build logic, kept", id);
            return None;
        }

        if info.provides_any(self.used) {
            return None;
        }

        Some(Classification::new(DiagnosticCode::PackageReferenceRemovable, id.as_str()))
    }
}
