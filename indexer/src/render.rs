//! Static HTML rendering of the simple index.
//!
//! The root page links every package directory; each package page links its
//! artifacts with a `#sha256=` integrity fragment and, for withdrawn
//! versions, a `data-yanked="true"` attribute. Pages carry no scripts and no
//! timestamps, so identical input renders byte-identical output.

use crate::artefact::materialize::{MaterializedArtifact, MaterializedPackage};
use crate::naming::PackageKey;
use crate::yank::YankTable;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::io::{self, Write};
use thiserror::Error;

/// Title of the root index page.
pub const ROOT_TITLE: &str = "Simple Package Index";

/// Filename of every index page.
pub const INDEX_FILE: &str = "index.html";

/// Characters left unescaped in hrefs: unreserved characters plus `/`.
const HREF_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// An index page could not be written.
#[derive(Debug, Error)]
#[error("failed to write {path}")]
pub struct WriteError {
    /// The path being written.
    pub path: Utf8PathBuf,
    /// The underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// Percent-encode a filename for use in an href.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::render::encode_href;
///
/// assert_eq!(
///     encode_href("confluent_kafka-2.11.0+gr-py3-none-any.whl"),
///     "confluent_kafka-2.11.0%2Bgr-py3-none-any.whl"
/// );
/// ```
#[must_use]
pub fn encode_href(filename: &str) -> String {
    utf8_percent_encode(filename, HREF_SAFE).to_string()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page(title: &str, links: &[String]) -> String {
    let title = escape_html(title);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>{title}</title>\n</head>\n<body>\n    <h1>{title}</h1>\n"
    );
    for link in links {
        html.push_str("    ");
        html.push_str(link);
        html.push('\n');
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Render the root index listing `keys` in lexicographic order.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::naming::PackageKey;
/// use wheelhouse_indexer::render::render_root;
///
/// let keys = [PackageKey::new("zeta"), PackageKey::new("Demo")];
/// let html = render_root(&keys);
/// assert!(html.contains(r#"<a href="demo/">demo</a>"#));
/// assert!(html.find("demo/").unwrap() < html.find("zeta/").unwrap());
/// ```
#[must_use]
pub fn render_root<'a>(keys: impl IntoIterator<Item = &'a PackageKey>) -> String {
    let mut keys: Vec<&PackageKey> = keys.into_iter().collect();
    keys.sort();
    keys.dedup();
    let links: Vec<String> = keys
        .into_iter()
        .map(|key| {
            format!(
                "<a href=\"{}/\">{}</a><br/>",
                encode_href(key.as_str()),
                escape_html(key.as_str())
            )
        })
        .collect();
    page(ROOT_TITLE, &links)
}

/// Render one artifact link.
#[must_use]
pub fn artifact_link(artifact: &MaterializedArtifact, yanked: bool) -> String {
    let filename = &artifact.artifact.filename;
    let marker = if yanked { " data-yanked=\"true\"" } else { "" };
    format!(
        "<a href=\"{}#sha256={}\"{marker}>{}</a><br/>",
        encode_href(filename),
        artifact.digest,
        escape_html(filename)
    )
}

/// Render a package page. Yank status is looked up here, per artifact.
#[must_use]
pub fn render_package(package: &MaterializedPackage, yanks: &YankTable) -> String {
    let links: Vec<String> = package
        .artifacts
        .iter()
        .map(|artifact| {
            let yanked = yanks.is_yanked(package.key.as_str(), &artifact.artifact.version);
            artifact_link(artifact, yanked)
        })
        .collect();
    page(&format!("Links for {}", package.key), &links)
}

/// Write `contents` to `path` through a temporary sibling file, so readers
/// never observe a half-written page.
fn write_atomic(path: &Utf8Path, contents: &str) -> Result<(), WriteError> {
    let fail = |source: io::Error| WriteError {
        path: path.to_owned(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(dir.as_std_path()).map_err(fail)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir.as_std_path()).map_err(fail)?;
    temp.write_all(contents.as_bytes()).map_err(fail)?;
    temp.persist(path.as_std_path()).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Write `<output_root>/<key>/index.html` for `package`.
///
/// # Errors
///
/// Returns [`WriteError`] if the directory or file cannot be written.
pub fn write_package_index(
    output_root: &Utf8Path,
    package: &MaterializedPackage,
    yanks: &YankTable,
) -> Result<(), WriteError> {
    let path = output_root.join(package.key.as_str()).join(INDEX_FILE);
    debug!("writing {path}");
    write_atomic(&path, &render_package(package, yanks))
}

/// Write every package page, then the root page linking them.
///
/// # Errors
///
/// Returns [`WriteError`] for the first page that cannot be written.
pub fn write_index_tree(
    output_root: &Utf8Path,
    packages: &[MaterializedPackage],
    yanks: &YankTable,
) -> Result<(), WriteError> {
    for package in packages {
        write_package_index(output_root, package, yanks)?;
    }
    let root = output_root.join(INDEX_FILE);
    debug!("writing {root}");
    write_atomic(&root, &render_root(packages.iter().map(|p| &p.key)))
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
