use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Digest algorithms the pipeline validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Md5,
}

impl HashAlgorithm {
    /// Expected hex digest length.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Md5 => 32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Md5 => "md5",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "md5" => Ok(HashAlgorithm::Md5),
            other => Err(CoreError::Other(format!("unknown hash algorithm: {other}"))),
        }
    }
}

/// A remote-to-local binding: one file the launcher must materialize.
///
/// Produced by an index processor's `validate`, consumed by the download
/// queue. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Stable identifier (logical asset name, Maven coordinate, file name…).
    pub id: String,
    pub url: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Expected digest, lower-case hex.
    pub hash: String,
    pub algorithm: HashAlgorithm,
    /// Absolute target path inside the common/instance trees.
    pub path: PathBuf,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        size: u64,
        hash: impl Into<String>,
        algorithm: HashAlgorithm,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            size,
            hash: hash.into().to_ascii_lowercase(),
            algorithm,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_round_trips_from_str() {
        assert_eq!("sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!(
            "SHA-256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha256
        );
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn asset_lowercases_the_expected_digest() {
        let asset = Asset::new(
            "client.jar",
            "https://example.com/client.jar",
            42,
            "ABCDEF0123",
            HashAlgorithm::Sha1,
            "/tmp/client.jar",
        );
        assert_eq!(asset.hash, "abcdef0123");
    }
}
