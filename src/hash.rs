//! Content hashing for library files.
//!
//! A file's logical identity is the SHA-256 of its byte stream: renaming or
//! moving a file does not change what it is, and byte-identical files are the
//! same document. Hashes are recomputed on every pass and never persisted.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 8192;

/// Computes the lowercase-hex SHA-256 digest of a file's contents.
///
/// Reads in fixed-size chunks so arbitrarily large files hash in bounded
/// memory. Collisions between distinct contents are assumed not to occur.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUF_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
