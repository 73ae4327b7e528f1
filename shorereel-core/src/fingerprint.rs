//! Content fingerprinting.
//!
//! The SHA-256 of a file's bytes is the unit of identity for dedup:
//! two intake files with the same digest are the same asset, whatever
//! their file names say.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::CoreResult;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Computes the lowercase hex SHA-256 digest of a file's contents.
///
/// Reads the file in fixed-size chunks so large sources never have to
/// fit in memory. Any read error propagates; a partial hash is never
/// returned.
pub fn fingerprint_file(path: &Path) -> CoreResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex_string(&hasher.finalize()))
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
