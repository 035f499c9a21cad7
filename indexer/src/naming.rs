//! Package name normalization and archive filename conventions.
//!
//! Names follow PEP 503: any run of `-`, `_` and `.` collapses into a single
//! `-` and the result is lower-cased. Versions are pulled out of filenames
//! with the legacy `name-version[-...]` heuristic: strip the archive suffix,
//! split on `-`, take the second field. The heuristic is not a version
//! parser and filenames that break the convention yield an empty or wrong
//! version string.

use std::fmt;

/// Suffix of a binary wheel.
pub const WHEEL_SUFFIX: &str = ".whl";

/// Suffix of a source tarball.
pub const SDIST_SUFFIX: &str = ".tar.gz";

/// The kinds of archive accepted into the index.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::naming::ArchiveKind;
///
/// assert_eq!(
///     ArchiveKind::from_filename("demo-1.0-py3-none-any.whl"),
///     Some(ArchiveKind::Wheel)
/// );
/// assert_eq!(ArchiveKind::from_filename("demo-1.0.zip"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// A binary wheel (`.whl`).
    Wheel,
    /// A source distribution tarball (`.tar.gz`).
    Sdist,
}

impl ArchiveKind {
    /// Every accepted archive kind, in suffix-matching order.
    pub const ALL: [Self; 2] = [Self::Wheel, Self::Sdist];

    /// The filename suffix identifying this kind.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Wheel => WHEEL_SUFFIX,
            Self::Sdist => SDIST_SUFFIX,
        }
    }

    /// Classify a filename by its suffix, returning `None` for anything the
    /// index does not publish.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| filename.ends_with(kind.suffix()))
    }
}

/// A PEP 503 normalized package name.
///
/// The only way to build a key is through normalization, so a key never
/// carries a raw name into the index tree.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::naming::PackageKey;
///
/// let key = PackageKey::new("Confluent_Kafka");
/// assert_eq!(key.as_str(), "confluent-kafka");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageKey(String);

impl PackageKey {
    /// Normalize `name` into a package key.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(normalize_str(name))
    }

    /// Get the normalized name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PackageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a package name according to PEP 503.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::naming::normalize;
///
/// assert_eq!(normalize("Foo_Bar.Baz"), normalize("foo-bar-baz"));
/// assert_eq!(normalize("Foo_Bar.Baz").as_str(), "foo-bar-baz");
/// ```
#[must_use]
pub fn normalize(name: &str) -> PackageKey {
    PackageKey::new(name)
}

fn normalize_str(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator_run = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator_run {
                normalized.push('-');
                in_separator_run = true;
            }
        } else {
            in_separator_run = false;
            normalized.extend(ch.to_lowercase());
        }
    }
    normalized
}

/// Return the first `-`-separated field of a filename, the raw project name
/// under the `name-version[-...]` convention.
#[must_use]
pub fn package_name_field(filename: &str) -> &str {
    filename.split('-').next().unwrap_or(filename)
}

/// Extract the version field from an archive filename.
///
/// The archive suffix is stripped, the remainder split on `-`, and the
/// second field returned. Fewer than two fields yield an empty string.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::naming::extract_version;
///
/// assert_eq!(extract_version("widget-1.2.3-py3-none-any.whl"), "1.2.3");
/// assert_eq!(extract_version("widget.tar.gz"), "");
/// ```
#[must_use]
pub fn extract_version(filename: &str) -> String {
    let stem = ArchiveKind::from_filename(filename)
        .and_then(|kind| filename.strip_suffix(kind.suffix()))
        .unwrap_or(filename);
    stem.split('-').nth(1).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Foo_Bar.Baz", "foo-bar-baz")]
    #[case("foo-bar-baz", "foo-bar-baz")]
    #[case("confluent_kafka", "confluent-kafka")]
    #[case("A__B--C..D", "a-b-c-d")]
    #[case("_leading.and.trailing_", "-leading-and-trailing-")]
    #[case("-_.", "-")]
    #[case("", "")]
    fn normalize_collapses_separator_runs(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize(raw).as_str(), expected);
    }

    #[rstest]
    #[case("Foo_Bar.Baz")]
    #[case("Some.__Package")]
    #[case("already-normal")]
    fn normalize_is_idempotent(#[case] raw: &str) {
        let once = normalize(raw);
        let twice = normalize(once.as_str());
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case("widget-1.2.3-py3-none-any.whl", "1.2.3")]
    #[case("widget-1.2.3.tar.gz", "1.2.3")]
    #[case("confluent_kafka-2.11.0+gr-py3-none-any.whl", "2.11.0+gr")]
    #[case("widget.tar.gz", "")]
    #[case("widget.whl", "")]
    #[case("widget", "")]
    fn extract_version_takes_second_field(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(extract_version(filename), expected);
    }

    #[test]
    fn extract_version_keeps_legacy_quirk_for_hyphenated_names() {
        // The project name boundary is not disambiguated.
        assert_eq!(extract_version("my-project-1.0.tar.gz"), "project");
    }

    #[rstest]
    #[case("demo-1.0-py3-none-any.whl", Some(ArchiveKind::Wheel))]
    #[case("demo-1.0.tar.gz", Some(ArchiveKind::Sdist))]
    #[case("demo-1.0.zip", None)]
    #[case("demo-1.0.tar.gz.asc", None)]
    #[case("checksums.txt", None)]
    fn archive_kind_recognises_accepted_suffixes(
        #[case] filename: &str,
        #[case] expected: Option<ArchiveKind>,
    ) {
        assert_eq!(ArchiveKind::from_filename(filename), expected);
    }

    #[test]
    fn package_name_field_returns_first_field() {
        assert_eq!(
            package_name_field("confluent_kafka-2.11.0-py3-none-any.whl"),
            "confluent_kafka"
        );
        assert_eq!(package_name_field("widget.tar.gz"), "widget.tar.gz");
    }
}
