//! Yanked version table.
//!
//! Maps a normalized package name to the set of exact version strings that
//! are withdrawn. Lookups normalize the package name, so callers may pass
//! raw or already-normalized names. Versions are compared verbatim.
//!
//! The table is loaded from a TOML file shaped like:
//!
//! ```toml
//! [yanked]
//! confluent-kafka = ["2.11.0+gr"]
//! ```

use crate::naming::PackageKey;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Errors arising while loading a yank table file.
#[derive(Debug, Error)]
pub enum YankFileError {
    /// The file could not be read.
    #[error("failed to read yank table {path}")]
    Read {
        /// Path of the file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not a valid yank table.
    #[error("invalid yank table: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct YankFile {
    yanked: BTreeMap<String, Vec<String>>,
}

/// Package → withdrawn versions lookup table.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::yank::YankTable;
///
/// let mut table = YankTable::new();
/// table.insert("confluent-kafka", "2.11.0+gr");
///
/// assert!(table.is_yanked("confluent_kafka", "2.11.0+gr"));
/// assert!(!table.is_yanked("confluent_kafka", "2.11.0"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YankTable {
    entries: HashMap<PackageKey, HashSet<String>>,
}

impl YankTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `version` of package `name` as yanked.
    pub fn insert(&mut self, name: &str, version: impl Into<String>) {
        self.entries
            .entry(PackageKey::new(name))
            .or_default()
            .insert(version.into());
    }

    /// Returns true when `version` of package `name` is withdrawn.
    #[must_use]
    pub fn is_yanked(&self, name: &str, version: &str) -> bool {
        self.entries
            .get(&PackageKey::new(name))
            .is_some_and(|versions| versions.contains(version))
    }

    /// Number of packages with at least one yanked version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no versions are yanked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a table from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`YankFileError::Parse`] if the text is not valid TOML or has
    /// keys other than `yanked`.
    pub fn from_toml_str(contents: &str) -> Result<Self, YankFileError> {
        let file: YankFile = toml::from_str(contents).map_err(|e| YankFileError::Parse {
            reason: e.to_string(),
        })?;
        Ok(file
            .yanked
            .into_iter()
            .flat_map(|(name, versions)| versions.into_iter().map(move |v| (name.clone(), v)))
            .collect())
    }

    /// Load a table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`YankFileError::Read`] if the file cannot be read, or
    /// [`YankFileError::Parse`] if it is malformed.
    pub fn load(path: &Utf8Path) -> Result<Self, YankFileError> {
        let contents =
            std::fs::read_to_string(path.as_std_path()).map_err(|source| YankFileError::Read {
                path: path.to_owned(),
                source,
            })?;
        Self::from_toml_str(&contents)
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for YankTable {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, version) in iter {
            table.insert(name.as_ref(), version);
        }
        table
    }
}
