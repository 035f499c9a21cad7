//! Wheelhouse index builder library.
//!
//! This crate turns the wheels and source distributions attached to a
//! repository's GitHub releases into a static PEP 503 "simple" index: one
//! directory per normalized package name holding the downloaded files and an
//! `index.html` linking each file with its SHA-256 digest. It is used by the
//! `wheelhouse-indexer` CLI binary and can be driven programmatically with
//! any [`source::ReleaseSource`] and [`artefact::download::ArtefactFetcher`].
//!
//! # Modules
//!
//! - [`artefact`] - Download, hashing, and atomic placement of files
//! - [`cli`] - Command-line argument definitions
//! - [`collector`] - Grouping release assets into packages
//! - [`config`] - Validation of run configuration
//! - [`error`] - Error types and exit codes
//! - [`http`] - Blocking HTTP client and transport errors
//! - [`naming`] - PEP 503 name normalization and version extraction
//! - [`output`] - Human-readable summaries
//! - [`package`] - Packages, artifacts, and deduplication
//! - [`pipeline`] - Build orchestration
//! - [`render`] - HTML index rendering
//! - [`retry`] - Retry with exponential backoff
//! - [`source`] - Release enumeration
//! - [`workers`] - Bounded worker pool
//! - [`yank`] - Yanked version table

pub mod artefact;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod http;
pub mod naming;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod render;
pub mod retry;
pub mod source;
pub mod workers;
pub mod yank;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
