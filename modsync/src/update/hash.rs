//! Content digests for staleness detection.
//!
//! Staleness is decided by comparing an MD5 digest of the local file against
//! the digest the publisher serves next to the artifact. MD5 here is a
//! change detector, not a security boundary: the only adversary considered
//! is a network error, so a fast well-known digest is the right tool and
//! collision resistance is not a requirement.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};

use crate::error::{UpdaterError, UpdaterResult};

/// Buffer size for reading files during digest calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculate the MD5 digest of a local file.
///
/// An absent file hashes as zero bytes of content, so a missing local file
/// compares unequal to any real remote digest and triggers an update.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn local_digest(path: &Path) -> UpdaterResult<Vec<u8>> {
    let mut hasher = Md5::new();

    if path.is_file() {
        let mut file = File::open(path).map_err(|e| UpdaterError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut buffer = vec![0u8; BUFFER_SIZE];
        loop {
            let bytes_read = file
                .read(&mut buffer)
                .map_err(|e| UpdaterError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;

            if bytes_read == 0 {
                break;
            }

            hasher.update(&buffer[..bytes_read]);
        }
    }

    Ok(hasher.finalize().to_vec())
}

/// Decode a remote digest payload into raw digest bytes.
///
/// The publisher serves the digest as base64 text; surrounding whitespace
/// (trailing newlines in particular) is tolerated.
pub fn decode_remote_digest(url: &str, payload: &str) -> UpdaterResult<Vec<u8>> {
    BASE64
        .decode(payload.trim())
        .map_err(|e| UpdaterError::MalformedDigest {
            url: url.to_string(),
            reason: e.to_string(),
        })
}
