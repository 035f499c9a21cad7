//! Index build orchestration.
//!
//! A run collects the package map, materializes packages on a bounded worker
//! pool, then renders the index. Rendering starts only after every worker
//! has finished, so no page ever links a file whose digest is unknown.

use crate::artefact::download::ArtefactFetcher;
use crate::artefact::materialize::{MaterializedPackage, Materializer};
use crate::collector::{PackageMap, collect};
use crate::error::{IndexError, Result};
use crate::naming::PackageKey;
use crate::package::Package;
use crate::render::{INDEX_FILE, write_index_tree};
use crate::retry::RetryPolicy;
use crate::source::ReleaseSource;
use crate::workers::run_bounded;
use crate::yank::YankTable;
use camino::Utf8Path;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default number of packages materialized concurrently.
pub const DEFAULT_JOBS: usize = 4;

/// What to do when a package cannot be materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run on the first failure.
    #[default]
    Abort,
    /// Drop the failing package from the index and continue.
    SkipPackage,
}

/// Options for an index build.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions<'a> {
    /// Root of the output tree.
    pub output_root: &'a Utf8Path,
    /// Maximum number of packages materialized concurrently.
    pub jobs: usize,
    /// Retry policy for individual downloads.
    pub retry: RetryPolicy,
    /// Handling of per-package failures.
    pub failure_policy: FailurePolicy,
}

/// A package dropped under [`FailurePolicy::SkipPackage`].
#[derive(Debug)]
pub struct SkippedPackage {
    /// The package key.
    pub key: PackageKey,
    /// The failure that caused the package to be dropped.
    pub error: IndexError,
}

/// Summary of a completed build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Packages published in the index, in key order.
    pub packages: Vec<PackageKey>,
    /// Number of artifacts published.
    pub artifacts: usize,
    /// Number of published artifacts carrying the yanked marker.
    pub yanked: usize,
    /// Packages dropped because they failed.
    pub skipped: Vec<SkippedPackage>,
}

enum Outcome {
    Done(MaterializedPackage),
    Failed(IndexError),
    Cancelled,
}

/// Build the complete index tree.
///
/// # Errors
///
/// Returns [`IndexError::Source`] if releases cannot be listed,
/// [`IndexError::Download`] or [`IndexError::Storage`] if a package fails
/// under [`FailurePolicy::Abort`], and [`IndexError::Storage`] if an index
/// page cannot be written.
pub fn build_index(
    source: &dyn ReleaseSource,
    fetcher: &(dyn ArtefactFetcher + Sync),
    yanks: &YankTable,
    options: &BuildOptions<'_>,
) -> Result<BuildReport> {
    let packages = collect(source)?;
    info!(
        "collected {} package(s), {} asset(s)",
        packages.len(),
        packages.values().map(|p| p.artifacts().len()).sum::<usize>()
    );

    std::fs::create_dir_all(options.output_root.as_std_path()).map_err(|source| {
        IndexError::Storage {
            path: options.output_root.to_owned(),
            source,
        }
    })?;

    let (materialized, skipped) = materialize_all(&packages, fetcher, options)?;
    for failed in &skipped {
        discard_stale_index(options.output_root, &failed.key);
    }

    write_index_tree(options.output_root, &materialized, yanks)?;

    let report = BuildReport {
        packages: materialized.iter().map(|p| p.key.clone()).collect(),
        artifacts: materialized.iter().map(|p| p.artifacts.len()).sum(),
        yanked: materialized
            .iter()
            .flat_map(|p| {
                p.artifacts
                    .iter()
                    .filter(|a| yanks.is_yanked(p.key.as_str(), &a.artifact.version))
            })
            .count(),
        skipped,
    };
    Ok(report)
}

fn materialize_all(
    packages: &PackageMap,
    fetcher: &(dyn ArtefactFetcher + Sync),
    options: &BuildOptions<'_>,
) -> Result<(Vec<MaterializedPackage>, Vec<SkippedPackage>)> {
    let materializer = Materializer::new(options.output_root, fetcher, options.retry);
    let cancelled = AtomicBool::new(false);
    let ordered: Vec<&Package> = packages.values().collect();

    let outcomes = run_bounded(&ordered, options.jobs, |package| {
        if cancelled.load(Ordering::Relaxed) {
            return Outcome::Cancelled;
        }
        match materializer.materialize(package) {
            Ok(done) => {
                info!(
                    "{}: {} artifact(s) ready",
                    done.key,
                    done.artifacts.len()
                );
                Outcome::Done(done)
            }
            Err(err) => {
                if options.failure_policy == FailurePolicy::Abort {
                    cancelled.store(true, Ordering::Relaxed);
                }
                Outcome::Failed(IndexError::from_materialize(package.key(), err))
            }
        }
    });

    let mut materialized = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (package, outcome) in ordered.into_iter().zip(outcomes) {
        match outcome {
            Outcome::Done(done) => materialized.push(done),
            Outcome::Failed(err) => match options.failure_policy {
                FailurePolicy::Abort => {
                    error!("{}: {err}", package.key());
                    return Err(err);
                }
                FailurePolicy::SkipPackage => {
                    warn!("{}: skipped: {err}", package.key());
                    skipped.push(SkippedPackage {
                        key: package.key().clone(),
                        error: err,
                    });
                }
            },
            Outcome::Cancelled => {}
        }
    }
    Ok((materialized, skipped))
}

/// Remove an index page left by an earlier run for a package that is no
/// longer published.
fn discard_stale_index(output_root: &Utf8Path, key: &PackageKey) {
    let stale = output_root.join(key.as_str()).join(INDEX_FILE);
    match std::fs::remove_file(stale.as_std_path()) {
        Ok(()) => warn!("removed stale {stale}"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove stale {stale}: {e}"),
    }
}

/// A package as it would be published, without downloading anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPackage {
    /// The package key.
    pub key: PackageKey,
    /// Distinct artifacts as `(filename, version, yanked)`.
    pub artifacts: Vec<(String, String, bool)>,
}

/// Collect and deduplicate without downloading or writing.
///
/// # Errors
///
/// Returns [`IndexError::Source`] if releases cannot be listed.
pub fn plan(source: &dyn ReleaseSource, yanks: &YankTable) -> Result<Vec<PlannedPackage>> {
    let packages = collect(source)?;
    Ok(packages
        .values()
        .map(|package| PlannedPackage {
            key: package.key().clone(),
            artifacts: package
                .distinct_artifacts()
                .into_iter()
                .map(|a| {
                    let yanked = yanks.is_yanked(package.key().as_str(), &a.version);
                    (a.filename.clone(), a.version.clone(), yanked)
                })
                .collect(),
        })
        .collect())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
