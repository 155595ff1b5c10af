// src/hash.rs

//! SHA-256 helpers for package ids and patch checksums
//!
//! Checksums in recipes use the prefixed form `sha256:<hex>`.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Prefix used for checksums written in recipes
pub const SHA256_PREFIX: &str = "sha256:";

/// Incremental SHA-256 hasher
#[derive(Default)]
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed data into the hasher
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Feed a `key=value` line into the hasher
    ///
    /// Keeps field boundaries unambiguous when hashing structured data.
    pub fn update_field(&mut self, key: &str, value: &str) {
        self.inner.update(key.as_bytes());
        self.inner.update(b"=");
        self.inner.update(value.as_bytes());
        self.inner.update(b"\n");
    }

    /// Finish and return the lowercase hex digest
    pub fn finalize(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// Hash bytes with SHA-256, returning lowercase hex
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verify a file against a prefixed checksum (`sha256:<hex>`)
pub fn verify_file_checksum(path: &Path, expected: &str) -> Result<()> {
    let expected_hash = expected.strip_prefix(SHA256_PREFIX).ok_or_else(|| {
        Error::ParseError(format!(
            "Unsupported checksum format: {} (expected sha256:...)",
            expected
        ))
    })?;

    let content = fs::read(path)?;
    let actual = sha256(&content);

    if !actual.eq_ignore_ascii_case(expected_hash) {
        return Err(Error::ChecksumMismatch {
            expected: expected_hash.to_string(),
            actual,
        });
    }

    Ok(())
}
