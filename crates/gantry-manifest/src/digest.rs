//! Tagged content digests.
//!
//! Wire form is `<algorithm>:<hexdigest>`, e.g. `sha256:9f86d0…`. Parsing
//! preserves unknown algorithm tags so they can fail *verification* loudly
//! rather than failing silently or passing unverified.

use std::fmt;

use sha2::{Digest as _, Sha256};

use crate::error::ManifestError;

/// Digest algorithm tag.
///
/// Unknown tags parse successfully into [`DigestAlgorithm::Unsupported`] and
/// then hard-fail at verification time. A checksum table may legitimately be
/// written by a newer publisher; what is never legitimate is treating bytes
/// as verified under an algorithm this client cannot compute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-256
    Sha256,
    /// An algorithm tag this client does not implement
    Unsupported(String),
}

impl DigestAlgorithm {
    /// Parse an algorithm tag (case-insensitive)
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "sha256" => Self::Sha256,
            _ => Self::Unsupported(tag.to_string()),
        }
    }

    /// Wire name of the algorithm
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sha256 => "sha256",
            Self::Unsupported(tag) => tag,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged content digest: algorithm plus lowercase hex value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Digest {
    /// Parse the wire form `<algorithm>:<hexdigest>`
    pub fn parse(value: &str) -> Result<Self, ManifestError> {
        let (tag, hex) = value
            .split_once(':')
            .ok_or_else(|| ManifestError::MalformedDigest {
                value: value.to_string(),
            })?;
        if tag.is_empty() || hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ManifestError::MalformedDigest {
                value: value.to_string(),
            });
        }
        Ok(Self {
            algorithm: DigestAlgorithm::parse(tag),
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// Compute the digest of `bytes` under `algorithm`
    pub fn of(algorithm: DigestAlgorithm, bytes: &[u8]) -> Result<Self, ManifestError> {
        let hex = compute_hex(&algorithm, bytes)?;
        Ok(Self { algorithm, hex })
    }

    /// The algorithm tag
    pub fn algorithm(&self) -> &DigestAlgorithm {
        &self.algorithm
    }

    /// The lowercase hex digest value
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Check whether `bytes` hash to this digest.
    ///
    /// Returns an error (not `false`, and never `true`) when the algorithm
    /// is unsupported.
    pub fn matches(&self, bytes: &[u8]) -> Result<bool, ManifestError> {
        Ok(compute_hex(&self.algorithm, bytes)? == self.hex)
    }

    /// Verify `bytes` against this digest, naming `path` on mismatch.
    pub fn verify(&self, bytes: &[u8], path: &str) -> Result<(), ManifestError> {
        let actual = compute_hex(&self.algorithm, bytes)?;
        if actual == self.hex {
            Ok(())
        } else {
            Err(ManifestError::DigestMismatch {
                path: path.to_string(),
                expected: self.to_string(),
                actual: format!("{}:{}", self.algorithm, actual),
            })
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

fn compute_hex(algorithm: &DigestAlgorithm, bytes: &[u8]) -> Result<String, ManifestError> {
    match algorithm {
        DigestAlgorithm::Sha256 => Ok(hex::encode(Sha256::digest(bytes))),
        DigestAlgorithm::Unsupported(tag) => Err(ManifestError::UnsupportedDigestAlgorithm {
            algorithm: tag.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let digest = Digest::parse("sha256:AB12cd34").unwrap();
        assert_eq!(digest.algorithm(), &DigestAlgorithm::Sha256);
        assert_eq!(digest.hex(), "ab12cd34");
        assert_eq!(digest.to_string(), "sha256:ab12cd34");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Digest::parse("sha256"),
            Err(ManifestError::MalformedDigest { .. })
        ));
        assert!(matches!(
            Digest::parse(":abcd"),
            Err(ManifestError::MalformedDigest { .. })
        ));
        assert!(matches!(
            Digest::parse("sha256:"),
            Err(ManifestError::MalformedDigest { .. })
        ));
        assert!(matches!(
            Digest::parse("sha256:not-hex"),
            Err(ManifestError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_verify_matches_and_flipped_byte_fails() {
        let data = b"layer height 0.2";
        let digest = Digest::of(DigestAlgorithm::Sha256, data).unwrap();
        assert!(digest.matches(data).unwrap());

        let mut tampered = data.to_vec();
        tampered[3] ^= 0x01;
        assert!(!digest.matches(&tampered).unwrap());
        assert!(matches!(
            digest.verify(&tampered, "configs/pla.json"),
            Err(ManifestError::DigestMismatch { path, .. }) if path == "configs/pla.json"
        ));
    }

    #[test]
    fn test_unsupported_algorithm_is_an_error_not_a_pass() {
        let digest = Digest::parse("md5:d41d8cd98f00b204e9800998ecf8427e").unwrap();
        assert!(matches!(
            digest.matches(b"anything"),
            Err(ManifestError::UnsupportedDigestAlgorithm { algorithm }) if algorithm == "md5"
        ));
        assert!(digest.verify(b"anything", "p").is_err());
    }
}
