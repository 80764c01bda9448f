//! MD5 helpers for comparing local files against single-part etags.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read size used when streaming a file through the hasher.
pub const CHUNK_SIZE: usize = 8192;

/// Hex MD5 of a byte slice.
pub fn md5_bytes(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Hex MD5 of a file, read in `CHUNK_SIZE` pieces.
pub fn md5_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Strip the surrounding quotes S3 puts around etags.
pub fn normalize_etag(etag: &str) -> &str {
    etag.trim().trim_matches('"')
}

/// Case-insensitive comparison of a local MD5 with a remote etag.
pub fn md5_matches_etag(md5_hex: &str, etag: &str) -> bool {
    normalize_etag(etag).eq_ignore_ascii_case(md5_hex)
}
