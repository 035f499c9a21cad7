//! SHA-256 digest newtype and single-pass hashing writer.
//!
//! A [`Sha256Digest`] can only be produced by hashing, so it always holds a
//! 64-character lowercase hexadecimal string. [`HashingWriter`] forwards
//! bytes to an inner writer while feeding them to a SHA-256 hasher, so a
//! download is hashed as it is written without re-reading the file.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Write};

/// Chunk size for streaming reads.
pub(crate) const CHUNK_SIZE: usize = 8192;

/// The lowercase hex SHA-256 of some bytes.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::artefact::sha256_digest::Sha256Digest;
///
/// let digest = Sha256Digest::of_bytes(b"");
/// assert_eq!(digest.as_str().len(), 64);
/// assert!(digest.as_str().starts_with("e3b0c442"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Digest of an in-memory byte slice.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(bytes))
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writer adapter that hashes everything written through it.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use wheelhouse_indexer::artefact::sha256_digest::{HashingWriter, Sha256Digest};
///
/// let mut writer = HashingWriter::new(Vec::new());
/// writer.write_all(b"hello").unwrap();
/// let (bytes, digest, len) = writer.finish();
/// assert_eq!(bytes, b"hello");
/// assert_eq!(len, 5);
/// assert_eq!(digest, Sha256Digest::of_bytes(b"hello"));
/// ```
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes_written: u64,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes_written: 0,
        }
    }

    /// Return the inner writer, the digest of everything written, and the
    /// byte count.
    pub fn finish(self) -> (W, Sha256Digest, u64) {
        (
            self.inner,
            Sha256Digest::from_hasher(self.hasher),
            self.bytes_written,
        )
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if let Some(accepted) = buf.get(..written) {
            self.hasher.update(accepted);
            self.bytes_written += accepted.len() as u64;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
