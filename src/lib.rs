//! reftrim - Find removable references in .NET projects
//!
//! This library compares what a project declares (binary, project and
//! package references) with the assemblies its compiled output actually
//! uses, and reports the declarations that can be dropped.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Identity Resolution** - Turn references into simple assembly names
//! 2. **Framework Catalog** - Collect assemblies the target framework ships
//! 3. **Package Graph** - Build dependency edges from `project.assets.json`
//! 4. **Aggregation** - Propagate package assets to every dependant
//! 5. **Classification** - Emit RT0001/RT0002/RT0003 for unneeded references
//! 6. **Reporting** - Output results in various formats

pub mod analysis;
pub mod assembly;
pub mod baseline;
pub mod config;
pub mod error;
pub mod framework;
pub mod graph;
pub mod lockfile;
pub mod names;
pub mod project;
pub mod report;

pub use analysis::{AnalysisResult, Analyzer, Classification, DiagnosticCode, PackageInfo, ReferenceKind};
pub use assembly::{AssemblyNameReader, MetadataReader, StaticNameReader};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use graph::{PackageGraph, PackageNode};
pub use lockfile::LockFile;
pub use names::{AssemblyName, PackageId};
pub use project::ProjectInputs;
pub use report::{ReportFormat, Reporter};
