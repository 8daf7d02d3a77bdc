use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Every variant is fatal: once the closure computation cannot be trusted
/// there is no meaningful "removable" verdict to report.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read lock file {path}: {source}")]
    LockFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse lock file {path}: {source}")]
    LockFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Lock file has no target for '{target}' (available: {available})")]
    TargetNotFound { target: String, available: String },

    #[error("Lock file has no library entry for {id}/{version}")]
    LibraryNotFound { id: String, version: String },

    #[error("Package {id} ({relative_path}) was not found in any package folder: {folders}")]
    PackageFolderNotFound {
        id: String,
        relative_path: String,
        folders: String,
    },

    #[error("Failed to read assembly name from {path}: {reason}")]
    BinaryUnreadable { path: PathBuf, reason: String },

    #[error("Failed to parse framework list {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Invalid assembly display name '{0}'")]
    InvalidFusionName(String),

    #[error("Failed to read inputs {path}: {reason}")]
    InputsRead { path: PathBuf, reason: String },

    #[error("No target framework moniker given for lock file {0}")]
    MissingTargetMoniker(PathBuf),
}

/// Broad category of a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A static input (lock file, manifest, inputs document) is malformed
    InputMalformed,
    /// The lock file and the on-disk package cache disagree
    ResolutionInconsistency,
    /// A binary selected for inspection is missing or not a valid assembly
    BinaryUnreadable,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PackageFolderNotFound { .. } => ErrorKind::ResolutionInconsistency,
            Error::BinaryUnreadable { .. } => ErrorKind::BinaryUnreadable,
            Error::LockFileRead { .. }
            | Error::LockFileParse { .. }
            | Error::TargetNotFound { .. }
            | Error::LibraryNotFound { .. }
            | Error::ManifestParse { .. }
            | Error::InvalidFusionName(_)
            | Error::InputsRead { .. }
            | Error::MissingTargetMoniker(_) => ErrorKind::InputMalformed,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::BinaryUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
