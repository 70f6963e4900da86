//! Content digests for change detection
//!
//! MD5 is used because S3-compatible stores report it as the ETag of a
//! single-part upload. It is not used for integrity or security.

use std::path::Path;

use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

use crate::error::Result;

/// Read buffer size for streaming a file through the hasher
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Hex-encoded MD5 of a file's contents, read in `CHUNK_SIZE` pieces
pub async fn file_md5(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hex-encoded MD5 of an in-memory buffer
pub fn bytes_md5(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Whether `etag` has the shape of a single-part MD5 ETag (32 hex digits)
pub fn is_md5_etag(etag: &str) -> bool {
    etag.len() == 32 && etag.bytes().all(|b| b.is_ascii_hexdigit())
}
