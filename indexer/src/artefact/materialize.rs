//! Artifact materialization: download, hash, and store.
//!
//! For each distinct filename in a package the winning artifact is streamed
//! into `<output_root>/<key>/<filename>`. Bytes land in a temporary file in
//! the package directory and are hashed as they are written; the temporary
//! file is renamed into place only once the stream completes, so an aborted
//! download never occupies the path the index links to.

use super::download::{ArtefactFetcher, DownloadError};
use super::sha256_digest::{CHUNK_SIZE, HashingWriter, Sha256Digest};
use crate::naming::PackageKey;
use crate::package::{Artifact, Package};
use crate::retry::{RetryPolicy, Transient};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors arising while materializing a package.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// An artifact's bytes could not be retrieved.
    #[error("failed to download {filename}")]
    Download {
        /// The artifact filename.
        filename: String,
        /// The underlying download error.
        #[source]
        source: DownloadError,
    },

    /// Local storage could not be written.
    #[error("failed to write {path}")]
    Storage {
        /// The path being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Transient for MaterializeError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Download { source, .. } => source.is_transient(),
            Self::Storage { .. } => false,
        }
    }
}

/// An artifact whose bytes are stored locally and hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedArtifact {
    /// The artifact that won deduplication.
    pub artifact: Artifact,
    /// SHA-256 of the stored bytes.
    pub digest: Sha256Digest,
    /// Number of bytes stored.
    pub bytes_written: u64,
    /// Where the bytes were stored.
    pub path: Utf8PathBuf,
}

/// A package whose distinct artifacts are all materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedPackage {
    /// The normalized package key.
    pub key: PackageKey,
    /// Materialized artifacts, sorted by filename.
    pub artifacts: Vec<MaterializedArtifact>,
}

/// Downloads package artifacts into an output tree.
pub struct Materializer<'a> {
    output_root: &'a Utf8Path,
    fetcher: &'a (dyn ArtefactFetcher + Sync),
    retry: RetryPolicy,
}

impl<'a> Materializer<'a> {
    /// Create a materializer writing below `output_root`.
    #[must_use]
    pub fn new(
        output_root: &'a Utf8Path,
        fetcher: &'a (dyn ArtefactFetcher + Sync),
        retry: RetryPolicy,
    ) -> Self {
        Self {
            output_root,
            fetcher,
            retry,
        }
    }

    /// Directory holding a package's files.
    #[must_use]
    pub fn package_dir(&self, key: &PackageKey) -> Utf8PathBuf {
        self.output_root.join(key.as_str())
    }

    /// Materialize every distinct artifact of `package`.
    ///
    /// # Errors
    ///
    /// Returns the first download or storage failure; artifacts already
    /// stored for this package are left on disk but nothing references them.
    pub fn materialize(&self, package: &Package) -> Result<MaterializedPackage, MaterializeError> {
        let dir = self.package_dir(package.key());
        std::fs::create_dir_all(dir.as_std_path()).map_err(|source| {
            MaterializeError::Storage {
                path: dir.clone(),
                source,
            }
        })?;

        let distinct = package.distinct_artifacts();
        let skipped = package.artifacts().len() - distinct.len();
        if skipped > 0 {
            debug!("{}: skipping {skipped} duplicate asset(s)", package.key());
        }

        let artifacts = distinct
            .into_iter()
            .map(|artifact| self.materialize_artifact(&dir, artifact))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MaterializedPackage {
            key: package.key().clone(),
            artifacts,
        })
    }

    fn materialize_artifact(
        &self,
        dir: &Utf8Path,
        artifact: &Artifact,
    ) -> Result<MaterializedArtifact, MaterializeError> {
        let dest = dir.join(&artifact.filename);
        info!(
            "downloading {} from {}",
            artifact.filename, artifact.download_locator
        );
        let (digest, bytes_written) = self.retry.run(&artifact.filename, |_| {
            self.download_once(dir, &dest, artifact)
        })?;

        if bytes_written != artifact.size_bytes {
            warn!(
                "{}: received {bytes_written} bytes, source advertised {}",
                artifact.filename, artifact.size_bytes
            );
        }

        Ok(MaterializedArtifact {
            artifact: artifact.clone(),
            digest,
            bytes_written,
            path: dest,
        })
    }

    fn download_once(
        &self,
        dir: &Utf8Path,
        dest: &Utf8Path,
        artifact: &Artifact,
    ) -> Result<(Sha256Digest, u64), MaterializeError> {
        let storage = |source: io::Error| MaterializeError::Storage {
            path: dest.to_owned(),
            source,
        };
        let download = |source: DownloadError| MaterializeError::Download {
            filename: artifact.filename.clone(),
            source,
        };

        let mut reader = self
            .fetcher
            .open(&artifact.download_locator)
            .map_err(download)?;
        let partial = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(dir.as_std_path())
            .map_err(storage)?;
        let mut writer = HashingWriter::new(partial);

        let mut buffer = [0u8; CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(download(DownloadError::Interrupted {
                        locator: artifact.download_locator.clone(),
                        source,
                    }));
                }
            };
            if read == 0 {
                break;
            }
            if let Some(chunk) = buffer.get(..read) {
                writer.write_all(chunk).map_err(storage)?;
            }
        }
        writer.flush().map_err(storage)?;

        let (partial, digest, bytes_written) = writer.finish();
        partial
            .persist(dest.as_std_path())
            .map_err(|e| storage(e.error))?;
        Ok((digest, bytes_written))
    }
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;
