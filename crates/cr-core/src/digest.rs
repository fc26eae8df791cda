//! Content digests for chart archives

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

use crate::error::Result;

/// Compute the hex SHA-256 digest of a file
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex SHA-256 digest of in-memory data
pub fn compute_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
