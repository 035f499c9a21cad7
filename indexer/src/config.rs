//! Validated run configuration.
//!
//! Turns parsed CLI arguments into an [`IndexConfig`]. Missing credentials,
//! a malformed repository slug, and an unreadable yank file are all
//! reported here, before any network traffic.

use crate::cli::Cli;
use crate::error::{IndexError, Result};
use crate::http::Timeouts;
use crate::pipeline::{BuildOptions, FailurePolicy};
use crate::retry::RetryPolicy;
use crate::source::github::RepositorySlug;
use crate::yank::YankTable;
use camino::Utf8PathBuf;
use log::debug;
use std::fmt;
use std::time::Duration;

/// Base delay before the first retry.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// An API access token that never appears in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// The raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Everything a run needs, validated.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// GitHub API access token.
    pub token: AccessToken,
    /// Repository whose releases are indexed.
    pub repository: RepositorySlug,
    /// Root of the output tree.
    pub output_dir: Utf8PathBuf,
    /// GitHub API base URL.
    pub api_url: String,
    /// Withdrawn versions.
    pub yanks: YankTable,
    /// Concurrent package downloads.
    pub jobs: usize,
    /// Network timeouts.
    pub timeouts: Timeouts,
    /// Retry policy for listing and downloads.
    pub retry: RetryPolicy,
    /// Handling of per-package failures.
    pub failure_policy: FailurePolicy,
    /// List only; download and write nothing.
    pub dry_run: bool,
}

impl IndexConfig {
    /// Validate `cli` into a run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] if the token or repository is
    /// missing or invalid, or the yank file cannot be loaded.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let token = required(cli.token.as_deref(), "GITHUB_TOKEN", "--token")?;
        let repository = required(cli.repository.as_deref(), "GITHUB_REPOSITORY", "--repository")?
            .parse::<RepositorySlug>()
            .map_err(|e| IndexError::Configuration {
                reason: e.to_string(),
            })?;

        let yanks = match &cli.yank_file {
            Some(path) => YankTable::load(path).map_err(|e| IndexError::Configuration {
                reason: error_chain(&e),
            })?,
            None => YankTable::new(),
        };
        debug!("{} package(s) with yanked versions", yanks.len());

        if cli.jobs == 0 {
            return Err(IndexError::Configuration {
                reason: "--jobs must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            token: AccessToken(token.to_owned()),
            repository,
            output_dir: cli.output_dir.clone(),
            api_url: cli.api_url.clone(),
            yanks,
            jobs: cli.jobs,
            timeouts: Timeouts {
                request: Duration::from_secs(cli.timeout_secs.max(1)),
                body: Duration::from_secs(cli.download_timeout_secs.max(1)),
            },
            retry: RetryPolicy::new(cli.retries.saturating_add(1), RETRY_BASE_DELAY),
            failure_policy: if cli.skip_failed_packages {
                FailurePolicy::SkipPackage
            } else {
                FailurePolicy::Abort
            },
            dry_run: cli.dry_run,
        })
    }

    /// Build options borrowing this configuration.
    #[must_use]
    pub fn build_options(&self) -> BuildOptions<'_> {
        BuildOptions {
            output_root: &self.output_dir,
            jobs: self.jobs,
            retry: self.retry,
            failure_policy: self.failure_policy,
        }
    }
}

fn required<'a>(value: Option<&'a str>, env: &str, flag: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IndexError::Configuration {
            reason: format!("{env} is not set (or pass {flag})"),
        })
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
