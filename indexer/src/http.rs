//! Shared HTTP client configuration for the GitHub API and asset downloads.
//!
//! Wraps a `ureq` agent with per-phase [`Timeouts`] and the out-of-band
//! access token. Failures are mapped into [`TransportError`],
//! which knows whether a retry is worthwhile.

use crate::retry::Transient;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use ureq::http::Response;

/// Default bound on each request phase up to the response headers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound on receiving one response body.
pub const DEFAULT_BODY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const USER_AGENT: &str = concat!("wheelhouse-indexer/", env!("CARGO_PKG_VERSION"));

/// Transport-level failures shared by release listing and downloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The resource does not exist (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The credentials were rejected (HTTP 401 or 403).
    #[error("access denied ({status}) for {url}; check the access token")]
    Unauthorized {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Any other non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request timed out.
    #[error("request to {url} timed out")]
    Timeout {
        /// The URL that was requested.
        url: String,
    },

    /// Connection, TLS, or protocol failure.
    #[error("request to {url} failed: {reason}")]
    Failed {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
        /// Whether the failure looks transient.
        transient: bool,
    },
}

impl Transient for TransportError {
    fn is_transient(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Unauthorized { .. } => false,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } => true,
            Self::Failed { transient, .. } => *transient,
        }
    }
}

/// Map a `ureq` error to a [`TransportError`].
#[must_use]
pub fn map_ureq_error(url: &str, err: &ureq::Error) -> TransportError {
    let url = url.to_owned();
    match err {
        ureq::Error::StatusCode(404) => TransportError::NotFound { url },
        ureq::Error::StatusCode(status @ (401 | 403)) => TransportError::Unauthorized {
            url,
            status: *status,
        },
        ureq::Error::StatusCode(status) => TransportError::Status {
            url,
            status: *status,
        },
        ureq::Error::Timeout(_) => TransportError::Timeout { url },
        ureq::Error::Io(io) => TransportError::Failed {
            url,
            reason: io.to_string(),
            transient: true,
        },
        other => TransportError::Failed {
            url,
            reason: other.to_string(),
            transient: false,
        },
    }
}

/// Network timeouts, split so large downloads are not cut off by the
/// request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on resolving, connecting, sending the request, and receiving
    /// the response headers, each applied separately.
    pub request: Duration,
    /// Bound on receiving a whole response body.
    pub body: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: DEFAULT_TIMEOUT,
            body: DEFAULT_BODY_TIMEOUT,
        }
    }
}

/// An authenticated HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    token: Option<String>,
}

impl HttpClient {
    /// Build a client with the given timeouts and optional access token.
    #[must_use]
    pub fn new(timeouts: Timeouts, token: Option<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_resolve(Some(timeouts.request))
            .timeout_connect(Some(timeouts.request))
            .timeout_send_request(Some(timeouts.request))
            .timeout_recv_response(Some(timeouts.request))
            .timeout_recv_body(Some(timeouts.body))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            token,
        }
    }

    /// Issue a GET request with the given `Accept` header.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for any failure or non-success status.
    pub fn get(&self, url: &str, accept: &str) -> Result<Response<ureq::Body>, TransportError> {
        let mut request = self
            .agent
            .get(url)
            .header("Accept", accept)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {token}"));
        }
        request.call().map_err(|e| map_ureq_error(url, &e))
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(404, false)]
    #[case(401, false)]
    #[case(403, false)]
    #[case(422, false)]
    #[case(429, true)]
    #[case(500, true)]
    #[case(503, true)]
    fn status_codes_map_to_expected_transience(#[case] status: u16, #[case] transient: bool) {
        let mapped = map_ureq_error("https://example.test/x", &ureq::Error::StatusCode(status));
        assert_eq!(mapped.is_transient(), transient, "{mapped:?}");
    }

    #[test]
    fn not_found_is_distinguished() {
        let mapped = map_ureq_error("https://example.test/x", &ureq::Error::StatusCode(404));
        assert!(matches!(mapped, TransportError::NotFound { .. }));
    }

    #[test]
    fn unauthorized_mentions_token() {
        let mapped = map_ureq_error("https://example.test/x", &ureq::Error::StatusCode(401));
        assert!(mapped.to_string().contains("token"));
    }

    #[test]
    fn io_errors_are_transient() {
        let err = ureq::Error::Io(std::io::Error::other("connection reset"));
        let mapped = map_ureq_error("https://example.test/x", &err);
        assert!(mapped.is_transient());
        assert!(mapped.to_string().contains("connection reset"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let client = HttpClient::new(Timeouts::default(), Some("secret-token".to_owned()));
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-token"));
    }
}
