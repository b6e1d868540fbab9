//! Trait and value types for content digests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Incremental digest over a byte stream
pub trait ContentHasher {
    /// Feed more bytes
    fn update(&mut self, data: &[u8]);

    /// Finish and return the lowercase hex digest
    fn finalize_hex(self: Box<Self>) -> String;
}

/// Available digest algorithms.
///
/// Both are used purely to detect accidental corruption, not tampering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    /// MD5, 128-bit
    #[default]
    Md5,
    /// XXH3, 128-bit variant
    Xxh3,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Md5 => write!(f, "md5"),
            DigestAlgorithm::Xxh3 => write!(f, "xxh3"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "xxh3" => Ok(DigestAlgorithm::Xxh3),
            other => Err(format!("unknown digest algorithm '{}'", other)),
        }
    }
}

/// Digest and length of a byte stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDigest {
    /// Lowercase hex digest
    pub hex: String,
    /// Number of bytes hashed
    pub bytes: u64,
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}
