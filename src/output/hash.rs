//! Content hashing for binary payloads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::ReportError;

/// Digest over a byte buffer, rendered as lowercase hex
pub trait ContentHasher {
    /// Algorithm name shown before the digest
    fn name(&self) -> &str;

    fn hex_digest(&self, data: &[u8]) -> String;

    /// `NAME:hexdigest`
    fn fingerprint(&self, data: &[u8]) -> String {
        format!("{}:{}", self.name(), self.hex_digest(data))
    }
}

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }
}

fn digest_hex<D: Digest>(data: &[u8]) -> String {
    let mut hasher = D::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

impl ContentHasher for HashAlgorithm {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha224 => digest_hex::<Sha224>(data),
            HashAlgorithm::Sha256 => digest_hex::<Sha256>(data),
            HashAlgorithm::Sha384 => digest_hex::<Sha384>(data),
            HashAlgorithm::Sha512 => digest_hex::<Sha512>(data),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashAlgorithm::ALL
            .into_iter()
            .find(|algo| algo.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReportError::ConfigError {
                message: format!(
                    "Unknown hash algorithm '{}', expected one of SHA224, SHA256, SHA384, SHA512",
                    s
                ),
            })
    }
}

impl TryFrom<String> for HashAlgorithm {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HashAlgorithm> for String {
    fn from(value: HashAlgorithm) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_fingerprint() {
        assert_eq!(
            HashAlgorithm::Sha256.fingerprint(b"abc"),
            "SHA256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(HashAlgorithm::Sha224.hex_digest(b"").len(), 56);
        assert_eq!(HashAlgorithm::Sha384.hex_digest(b"").len(), 96);
        assert_eq!(HashAlgorithm::Sha512.hex_digest(b"").len(), 128);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("sha512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("SHA224".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha224);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }
}
