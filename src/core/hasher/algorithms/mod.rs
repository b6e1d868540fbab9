//! Digest implementations.

use super::traits::{ContentHasher, DigestAlgorithm};
use xxhash_rust::xxh3::Xxh3;

/// MD5 (backed by the md5 crate)
pub struct Md5Hasher {
    context: md5::Context,
}

impl Md5Hasher {
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
        }
    }
}

impl Default for Md5Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        format!("{:x}", self.context.compute())
    }
}

/// XXH3-128
pub struct Xxh3Hasher {
    state: Xxh3,
}

impl Xxh3Hasher {
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }
}

impl Default for Xxh3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher for Xxh3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        format!("{:032x}", self.state.digest128())
    }
}

/// Create a fresh hasher for `algorithm`
pub fn create_hasher(algorithm: DigestAlgorithm) -> Box<dyn ContentHasher> {
    match algorithm {
        DigestAlgorithm::Md5 => Box::new(Md5Hasher::new()),
        DigestAlgorithm::Xxh3 => Box::new(Xxh3Hasher::new()),
    }
}
