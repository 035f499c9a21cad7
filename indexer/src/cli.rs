//! CLI argument definitions for the index builder.
//!
//! This module defines the command-line interface using clap. Every option
//! that the original CI job read from the environment still falls back to
//! the same variable, so the binary drops into an Actions workflow as-is.

use crate::pipeline::DEFAULT_JOBS;
use crate::source::github::DEFAULT_API_URL;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Build a static PEP 503 simple index from GitHub release assets.
#[derive(Parser, Debug, Clone)]
#[command(name = "wheelhouse-indexer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build a static PEP 503 simple index from GitHub release assets.\n\n",
    "Every wheel (.whl) and source tarball (.tar.gz) attached to the ",
    "repository's releases is downloaded into OUTPUT_DIR/<package>/, hashed ",
    "with SHA-256, and linked from OUTPUT_DIR/<package>/index.html with a ",
    "#sha256= fragment. Versions listed in the yank file are marked with ",
    "data-yanked=\"true\".",
))]
#[command(after_help = concat!(
    "YANK FILE:\n",
    "  [yanked]\n",
    "  confluent-kafka = [\"2.11.0+gr\"]\n\n",
    "EXAMPLES:\n",
    "  Build the index for the current Actions repository:\n",
    "    $ GITHUB_TOKEN=... GITHUB_REPOSITORY=owner/repo wheelhouse-indexer\n\n",
    "  Preview which files would be published:\n",
    "    $ wheelhouse-indexer --repository owner/repo --dry-run\n",
))]
pub struct Cli {
    /// Access token for the GitHub API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Repository whose releases are indexed.
    #[arg(long, env = "GITHUB_REPOSITORY", value_name = "OWNER/NAME")]
    pub repository: Option<String>,

    /// Directory receiving the index tree.
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "dist", value_name = "DIR")]
    pub output_dir: Utf8PathBuf,

    /// TOML file listing yanked versions per package.
    #[arg(long, value_name = "PATH")]
    pub yank_file: Option<Utf8PathBuf>,

    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, value_name = "URL")]
    pub api_url: String,

    /// Number of packages downloaded concurrently.
    #[arg(short, long, default_value_t = DEFAULT_JOBS, value_name = "N")]
    pub jobs: usize,

    /// Timeout for connecting and for receiving response headers, in
    /// seconds. Body transfers are bounded by --download-timeout-secs.
    #[arg(long, default_value_t = 60, value_name = "SECS")]
    pub timeout_secs: u64,

    /// Timeout for receiving one whole response body, in seconds.
    #[arg(long, default_value_t = 1800, value_name = "SECS")]
    pub download_timeout_secs: u64,

    /// Retries after a transient network failure.
    #[arg(long, default_value_t = 2, value_name = "N")]
    pub retries: u32,

    /// Drop packages that fail to download instead of aborting.
    #[arg(long)]
    pub skip_failed_packages: bool,

    /// List what would be published and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Default log level implied by `--quiet` and `--verbose`.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
