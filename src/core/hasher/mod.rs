//! # Hasher Module
//!
//! Fingerprints file contents so a copy can be checked against its source.
//!
//! `compute_digest` always rewinds the stream before reading, so the same
//! handle can be hashed more than once: the source before copying, the
//! destination right after writing it.

mod algorithms;
mod traits;

pub use algorithms::{create_hasher, Md5Hasher, Xxh3Hasher};
pub use traits::{ContentDigest, ContentHasher, DigestAlgorithm};

use crate::error::HashError;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// Rewind `reader` and digest everything in it.
pub fn compute_digest<R>(reader: &mut R, algorithm: DigestAlgorithm) -> io::Result<ContentDigest>
where
    R: Read + Seek + ?Sized,
{
    reader.seek(SeekFrom::Start(0))?;

    let mut hasher = create_hasher(algorithm);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut bytes = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
        bytes += n as u64;
    }

    Ok(ContentDigest {
        hex: hasher.finalize_hex(),
        bytes,
    })
}

/// Open `path` and digest it
pub fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> Result<ContentDigest, HashError> {
    let mut file = File::open(path).map_err(|source| HashError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    compute_digest(&mut file, algorithm).map_err(|source| HashError::Io {
        path: path.to_path_buf(),
        source,
    })
}
