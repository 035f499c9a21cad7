//! Error types for the index builder.
//!
//! Variants follow the failure taxonomy of a run: configuration problems are
//! reported before any work starts, while source, download, and storage
//! failures abort the run (or, under
//! [`FailurePolicy::SkipPackage`](crate::pipeline::FailurePolicy::SkipPackage),
//! drop a single package).

use crate::artefact::download::DownloadError;
use crate::artefact::materialize::MaterializeError;
use crate::naming::PackageKey;
use crate::render::WriteError;
use crate::source::SourceError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while building the index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of the problem.
        reason: String,
    },

    /// Releases could not be enumerated.
    #[error("failed to list releases: {0}")]
    Source(#[from] SourceError),

    /// An artifact could not be downloaded.
    #[error("failed to download {filename} for package {package}: {source}")]
    Download {
        /// The package owning the artifact.
        package: PackageKey,
        /// The artifact filename.
        filename: String,
        /// The underlying download error.
        #[source]
        source: DownloadError,
    },

    /// A directory or file in the output tree could not be written.
    #[error("failed to write {path}: {source}")]
    Storage {
        /// The path being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write command output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

impl IndexError {
    /// Wrap a materialization failure for `package`.
    #[must_use]
    pub fn from_materialize(package: &PackageKey, err: MaterializeError) -> Self {
        match err {
            MaterializeError::Download { filename, source } => Self::Download {
                package: package.clone(),
                filename,
                source,
            },
            MaterializeError::Storage { path, source } => Self::Storage { path, source },
        }
    }

    /// Process exit code for this error: 2 for configuration problems,
    /// 1 for everything else.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 2,
            _ => 1,
        }
    }
}

impl From<WriteError> for IndexError {
    fn from(err: WriteError) -> Self {
        Self::Storage {
            path: err.path,
            source: err.source,
        }
    }
}

/// Result type alias using [`IndexError`].
pub type Result<T> = std::result::Result<T, IndexError>;
