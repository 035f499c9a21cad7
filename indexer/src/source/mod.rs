//! Release sources: where release assets are enumerated from.
//!
//! The index builder only sees the [`ReleaseSource`] trait. The production
//! implementation, [`github::GitHubReleaseSource`], lists releases through
//! the GitHub REST API.

pub mod github;

use crate::http::TransportError;
use crate::retry::Transient;
use thiserror::Error;

/// A binary asset attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    /// The asset filename.
    pub filename: String,
    /// Opaque locator used to fetch the asset bytes.
    pub download_locator: String,
    /// Size advertised by the source.
    pub size_bytes: u64,
    /// Creation timestamp as reported by the source (RFC 3339).
    pub created_at: String,
}

/// A release and its attached assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Release tag, used for logging.
    pub tag: String,
    /// Assets attached to the release.
    pub assets: Vec<AssetRecord>,
}

/// Errors arising while enumerating releases.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request failed at the transport level.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be read or decoded.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// Description of the decoding failure.
        reason: String,
    },
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_transient(),
            Self::InvalidResponse { .. } => false,
        }
    }
}

/// Trait for listing releases and their assets.
///
/// Implementations must return every release, draining any pagination
/// before returning.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource {
    /// List all releases with their assets.
    ///
    /// # Errors
    ///
    /// Returns an error if enumeration fails for any page.
    fn list_releases(&self) -> Result<Vec<Release>, SourceError>;
}
