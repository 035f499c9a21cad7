//! Shared test utilities for the indexer crate.

use crate::artefact::download::{ArtefactFetcher, DownloadError};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::http::TransportError;
use crate::source::{AssetRecord, Release, ReleaseSource, SourceError};
use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Returns the lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256Digest::of_bytes(bytes).into_inner()
}

/// Builds an asset record served from `stub://<filename>`.
#[must_use]
pub fn asset(filename: &str, size_bytes: u64) -> AssetRecord {
    AssetRecord {
        filename: filename.to_owned(),
        download_locator: format!("stub://{filename}"),
        size_bytes,
        created_at: "2025-06-01T12:00:00Z".to_owned(),
    }
}

/// Builds a release from assets.
#[must_use]
pub fn release(tag: &str, assets: Vec<AssetRecord>) -> Release {
    Release {
        tag: tag.to_owned(),
        assets,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A release source returning a fixed listing or a fixed failure.
#[derive(Debug)]
pub struct StubReleaseSource {
    listing: Result<Vec<Release>, TransportError>,
    calls: Mutex<usize>,
}

impl StubReleaseSource {
    /// A source returning `releases`.
    #[must_use]
    pub fn new(releases: Vec<Release>) -> Self {
        Self {
            listing: Ok(releases),
            calls: Mutex::new(0),
        }
    }

    /// A source whose listing always fails with `error`.
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        Self {
            listing: Err(error),
            calls: Mutex::new(0),
        }
    }

    /// Number of times the listing was requested.
    #[must_use]
    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

impl ReleaseSource for StubReleaseSource {
    fn list_releases(&self) -> Result<Vec<Release>, SourceError> {
        *lock(&self.calls) += 1;
        self.listing.clone().map_err(SourceError::Transport)
    }
}

/// A scripted failure for one `open` call.
#[derive(Debug, Clone)]
pub enum FetchFailure {
    /// The request fails before any bytes are served.
    Transport(TransportError),
    /// The stream yields this many bytes, then breaks.
    InterruptAfter(usize),
}

/// An in-memory fetcher keyed by download locator.
///
/// Locators without a body return [`TransportError::NotFound`]. Scripted
/// failures are consumed in order, one per `open` call, before the body is
/// served.
#[derive(Debug, Default)]
pub struct StubFetcher {
    bodies: HashMap<String, Vec<u8>>,
    failures: Mutex<HashMap<String, VecDeque<FetchFailure>>>,
    opened: Mutex<Vec<String>>,
}

impl StubFetcher {
    /// Creates a fetcher with no bodies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `locator`.
    #[must_use]
    pub fn with_body(mut self, locator: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(locator.to_owned(), bytes.into());
        self
    }

    /// Queue a failure for the next unconsumed `open` of `locator`.
    #[must_use]
    pub fn with_failure(self, locator: &str, failure: FetchFailure) -> Self {
        lock(&self.failures)
            .entry(locator.to_owned())
            .or_default()
            .push_back(failure);
        self
    }

    /// Locators opened so far, in call order.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }
}

impl ArtefactFetcher for StubFetcher {
    fn open(&self, locator: &str) -> Result<Box<dyn Read>, DownloadError> {
        lock(&self.opened).push(locator.to_owned());
        let failure = lock(&self.failures)
            .get_mut(locator)
            .and_then(VecDeque::pop_front);
        let body = self.bodies.get(locator).cloned();
        match (failure, body) {
            (Some(FetchFailure::Transport(err)), _) => Err(err.into()),
            (Some(FetchFailure::InterruptAfter(limit)), Some(bytes)) => {
                Ok(Box::new(InterruptingReader {
                    inner: Cursor::new(bytes),
                    remaining: limit,
                }))
            }
            (_, None) => Err(TransportError::NotFound {
                url: locator.to_owned(),
            }
            .into()),
            (None, Some(bytes)) => Ok(Box::new(Cursor::new(bytes))),
        }
    }
}

/// Yields up to `remaining` bytes, then fails with a connection reset.
struct InterruptingReader {
    inner: Cursor<Vec<u8>>,
    remaining: usize,
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "stub connection reset",
            ));
        }
        let limit = self.remaining.min(buf.len());
        let read = self.inner.read(buf.get_mut(..limit).unwrap_or_default())?;
        self.remaining -= read;
        if read == 0 {
            self.remaining = 0;
        }
        Ok(read)
    }
}
