//! Asset collection: releases in, package map out.
//!
//! Walks every release and asset, keeps wheels and source tarballs, and
//! groups them by the normalized first `-` field of the filename. Other
//! suffixes are skipped silently. Accepted suffixes are still skipped, with a
//! warning, when the filename could escape its package directory or carries
//! no project name. Collection order is preserved inside each package so
//! deduplication stays deterministic.

use crate::naming::{ArchiveKind, PackageKey, package_name_field};
use crate::package::{Artifact, Package};
use crate::source::{Release, ReleaseSource, SourceError};
use log::{debug, trace, warn};
use std::collections::BTreeMap;

/// Packages keyed by normalized name, in lexicographic key order.
pub type PackageMap = BTreeMap<PackageKey, Package>;

/// Enumerate `source` and build the package map.
///
/// # Errors
///
/// Returns the source's error unchanged if enumeration fails; no partial
/// map is returned.
pub fn collect(source: &dyn ReleaseSource) -> Result<PackageMap, SourceError> {
    let releases = source.list_releases()?;
    Ok(collect_releases(releases))
}

/// Build the package map from already-listed releases.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::collector::collect_releases;
/// use wheelhouse_indexer::naming::PackageKey;
/// use wheelhouse_indexer::source::{AssetRecord, Release};
///
/// let asset = |name: &str| AssetRecord {
///     filename: name.to_owned(),
///     download_locator: format!("https://example.test/{name}"),
///     size_bytes: 1,
///     created_at: String::new(),
/// };
/// let releases = vec![Release {
///     tag: "v1.0".to_owned(),
///     assets: vec![asset("Demo_Pkg-1.0.tar.gz"), asset("notes.txt")],
/// }];
///
/// let packages = collect_releases(releases);
/// assert_eq!(packages.len(), 1);
/// assert!(packages.contains_key(&PackageKey::new("demo-pkg")));
/// ```
#[must_use]
pub fn collect_releases(releases: Vec<Release>) -> PackageMap {
    let mut packages = PackageMap::new();
    for release in releases {
        debug!(
            "release {}: {} asset(s)",
            release.tag,
            release.assets.len()
        );
        for asset in release.assets {
            if ArchiveKind::from_filename(&asset.filename).is_none() {
                trace!("skipping {}: not a wheel or sdist", asset.filename);
                continue;
            }
            if !is_plain_filename(&asset.filename) {
                warn!("skipping {:?}: not a plain file name", asset.filename);
                continue;
            }
            let key = PackageKey::new(package_name_field(&asset.filename));
            if key.as_str().is_empty() {
                warn!("skipping {}: no project name before the first '-'", asset.filename);
                continue;
            }
            packages
                .entry(key.clone())
                .or_insert_with(|| Package::new(key))
                .push(Artifact::from_asset(asset));
        }
    }
    packages
}

/// A filename that stays inside the directory it is joined onto.
fn is_plain_filename(filename: &str) -> bool {
    !filename.contains(['/', '\\']) && !filename.contains("..")
}
