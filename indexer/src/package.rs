//! Packages and the artifacts collected for them.

use crate::naming::{PackageKey, extract_version};
use crate::source::AssetRecord;

/// A single distributable file belonging to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The archive filename, unique within a package after deduplication.
    pub filename: String,
    /// Opaque locator used to fetch the bytes.
    pub download_locator: String,
    /// Size advertised by the release source.
    pub size_bytes: u64,
    /// Creation timestamp reported by the release source.
    pub created_at: String,
    /// Version extracted from the filename; may be empty.
    pub version: String,
}

impl Artifact {
    /// Build an artifact from an asset, deriving its version.
    #[must_use]
    pub fn from_asset(asset: AssetRecord) -> Self {
        let version = extract_version(&asset.filename);
        Self {
            filename: asset.filename,
            download_locator: asset.download_locator,
            size_bytes: asset.size_bytes,
            created_at: asset.created_at,
            version,
        }
    }
}

/// A package and every artifact collected for it, in collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    key: PackageKey,
    artifacts: Vec<Artifact>,
}

impl Package {
    /// Create an empty package.
    #[must_use]
    pub const fn new(key: PackageKey) -> Self {
        Self {
            key,
            artifacts: Vec::new(),
        }
    }

    /// The normalized package key.
    #[must_use]
    pub const fn key(&self) -> &PackageKey {
        &self.key
    }

    /// Every collected artifact, duplicates included.
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Append an artifact.
    pub fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// Artifacts sorted by filename with one entry per filename.
    ///
    /// The sort is stable, so when several assets share a filename the one
    /// collected first wins and the rest are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheelhouse_indexer::naming::PackageKey;
    /// use wheelhouse_indexer::package::{Artifact, Package};
    ///
    /// let artifact = |filename: &str, locator: &str| Artifact {
    ///     filename: filename.to_owned(),
    ///     download_locator: locator.to_owned(),
    ///     size_bytes: 0,
    ///     created_at: String::new(),
    ///     version: "1.0".to_owned(),
    /// };
    /// let mut package = Package::new(PackageKey::new("pkg"));
    /// package.push(artifact("pkg-1.0.tar.gz", "first"));
    /// package.push(artifact("pkg-1.0-py3-none-any.whl", "wheel"));
    /// package.push(artifact("pkg-1.0.tar.gz", "second"));
    ///
    /// let distinct = package.distinct_artifacts();
    /// assert_eq!(distinct.len(), 2);
    /// assert_eq!(distinct[1].download_locator, "first");
    /// ```
    #[must_use]
    pub fn distinct_artifacts(&self) -> Vec<&Artifact> {
        let mut sorted: Vec<&Artifact> = self.artifacts.iter().collect();
        sorted.sort_by(|a, b| a.filename.cmp(&b.filename));
        sorted.dedup_by(|later, earlier| later.filename == earlier.filename);
        sorted
    }
}
