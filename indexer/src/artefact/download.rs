//! Artefact byte retrieval.
//!
//! Provides a trait-based abstraction for opening a byte stream for a
//! release asset, enabling dependency injection for testing. The HTTP
//! implementation requests `application/octet-stream` from the asset API
//! URL; GitHub redirects to storage and `ureq` drops the access token on the
//! cross-host hop.

use crate::http::{HttpClient, TransportError};
use crate::retry::Transient;
use std::io::Read;
use thiserror::Error;

/// Media type that makes the GitHub asset API serve raw bytes.
const OCTET_STREAM: &str = "application/octet-stream";

/// Errors arising from artefact download operations.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request failed at the transport level.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The byte stream broke off part-way through.
    #[error("download of {locator} interrupted")]
    Interrupted {
        /// The locator being downloaded.
        locator: String,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },
}

impl Transient for DownloadError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_transient(),
            Self::Interrupted { .. } => true,
        }
    }
}

/// Trait for opening the byte stream of a release asset.
///
/// Abstractions allow tests to supply bytes without network access.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::artefact::download::HttpFetcher;
/// use wheelhouse_indexer::http::{HttpClient, Timeouts};
///
/// let fetcher = HttpFetcher::new(HttpClient::new(Timeouts::default(), None));
/// // Use fetcher.open(locator) in production
/// # let _ = fetcher;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactFetcher {
    /// Open a reader over the bytes behind `locator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn open(&self, locator: &str) -> Result<Box<dyn Read>, DownloadError>;
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    /// Create a fetcher backed by `client`.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl ArtefactFetcher for HttpFetcher {
    fn open(&self, locator: &str) -> Result<Box<dyn Read>, DownloadError> {
        let response = self.client.get(locator, OCTET_STREAM)?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}
