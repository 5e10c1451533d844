//! Content hashing helpers.
//!
//! SHA-256 everywhere: deterministic project ids, file content hashes for
//! change detection, and deterministic edge ids.

use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Hex-encoded SHA-256 of an in-memory byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 hash of a file's content via a buffered read.
///
/// # Errors
///
/// Returns an I/O error when the file cannot be opened or read.
pub fn file_sha256(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::io_with_source(format!("Failed to open file {}", path.display()), e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            Error::io_with_source(format!("Failed to read file {}", path.display()), e)
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
