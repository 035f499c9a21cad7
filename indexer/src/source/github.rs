//! GitHub REST API release source.
//!
//! Lists `GET /repos/{owner}/{repo}/releases` page by page, following the
//! `Link: <...>; rel="next"` header until the last page. Asset download
//! locators are the API asset URLs, which serve the raw bytes when fetched
//! with `Accept: application/octet-stream`.

use super::{AssetRecord, Release, ReleaseSource, SourceError};
use crate::http::{HttpClient, map_ureq_error};
use crate::retry::RetryPolicy;
use log::debug;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type for GitHub API JSON responses.
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Releases requested per page (the API maximum).
const PER_PAGE: u32 = 100;

/// Upper bound on release listing response bodies.
const MAX_PAGE_BYTES: u64 = 64 * 1024 * 1024;

/// A repository identifier in `owner/name` form.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::source::github::RepositorySlug;
///
/// let slug: RepositorySlug = "confluentinc/confluent-kafka-python".parse().unwrap();
/// assert_eq!(slug.owner(), "confluentinc");
/// assert_eq!(slug.name(), "confluent-kafka-python");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySlug {
    owner: String,
    name: String,
}

/// A repository identifier that is not in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository \"{value}\"; expected owner/name")]
pub struct InvalidRepositorySlug {
    /// The rejected value.
    pub value: String,
}

impl RepositorySlug {
    /// The owning user or organisation.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepositorySlug {
    type Err = InvalidRepositorySlug;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRepositorySlug {
            value: value.to_owned(),
        };
        let (owner, name) = value.trim().split_once('/').ok_or_else(invalid)?;
        let valid_part = |part: &str| !part.is_empty() && !part.contains(['/', ' ']);
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ApiAsset>,
}

#[derive(Debug, Deserialize)]
struct ApiAsset {
    name: String,
    url: String,
    size: u64,
    created_at: String,
}

impl From<ApiRelease> for Release {
    fn from(release: ApiRelease) -> Self {
        Self {
            tag: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|asset| AssetRecord {
                    filename: asset.name,
                    download_locator: asset.url,
                    size_bytes: asset.size,
                    created_at: asset.created_at,
                })
                .collect(),
        }
    }
}

/// Lists releases of a GitHub repository.
#[derive(Debug)]
pub struct GitHubReleaseSource {
    client: HttpClient,
    api_url: String,
    repository: RepositorySlug,
    retry: RetryPolicy,
}

impl GitHubReleaseSource {
    /// Create a source for `repository` served from `api_url`.
    #[must_use]
    pub fn new(
        client: HttpClient,
        api_url: &str,
        repository: RepositorySlug,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            repository,
            retry,
        }
    }

    /// URL of the first releases page.
    #[must_use]
    pub fn first_page_url(&self) -> String {
        format!(
            "{}/repos/{}/releases?per_page={PER_PAGE}",
            self.api_url, self.repository
        )
    }

    fn fetch_page(&self, url: &str) -> Result<ReleasePage, SourceError> {
        let response = self.client.get(url, GITHUB_JSON)?;
        let next = response
            .headers()
            .get("link")
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_url);
        let body = response
            .into_body()
            .with_config()
            .limit(MAX_PAGE_BYTES)
            .read_to_string()
            .map_err(|e| map_ureq_error(url, &e))?;
        let releases: Vec<ApiRelease> =
            serde_json::from_str(&body).map_err(|e| SourceError::InvalidResponse {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(ReleasePage {
            releases: releases.into_iter().map(Release::from).collect(),
            next,
        })
    }
}

impl ReleaseSource for GitHubReleaseSource {
    fn list_releases(&self) -> Result<Vec<Release>, SourceError> {
        let releases = drain_pages(self.first_page_url(), self.retry, |url| self.fetch_page(url))?;
        debug!("listed {} release(s) from {}", releases.len(), self.repository);
        Ok(releases)
    }
}

/// One page of a paginated release listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasePage {
    /// Releases on this page, in listing order.
    pub releases: Vec<Release>,
    /// URL of the following page, if any.
    pub next: Option<String>,
}

/// Fetch pages starting at `first_url` until one has no successor.
///
/// Each page is retried under `retry`. A page whose successor is itself
/// ends the listing.
///
/// # Errors
///
/// Returns the first page failure that survives retrying; releases from
/// earlier pages are discarded.
pub fn drain_pages<F>(
    first_url: String,
    retry: RetryPolicy,
    mut fetch_page: F,
) -> Result<Vec<Release>, SourceError>
where
    F: FnMut(&str) -> Result<ReleasePage, SourceError>,
{
    let mut releases = Vec::new();
    let mut next = Some(first_url);
    while let Some(url) = next.take() {
        debug!("listing releases: {url}");
        let page = retry.run(&url, |_| fetch_page(&url))?;
        releases.extend(page.releases);
        next = page.next.filter(|candidate| *candidate != url);
    }
    Ok(releases)
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::source::github::next_page_url;
///
/// let header = r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#;
/// assert_eq!(next_page_url(header).as_deref(), Some("https://api.github.com/x?page=2"));
/// ```
#[must_use]
pub fn next_page_url(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split(' ').any(|r| r == "next"))
        });
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        is_next.then(|| url.to_owned())
    })
}
