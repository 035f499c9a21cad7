//! Artifact retrieval, hashing, and local storage.
//!
//! # Sub-modules
//!
//! - [`download`] - Fetcher trait and HTTP implementation.
//! - [`materialize`] - Deduplicated download into the output tree.
//! - [`sha256_digest`] - SHA-256 digest newtype and hashing writer.

pub mod download;
pub mod materialize;
pub mod sha256_digest;
