//! Detached manifest signatures and the trusted keyring.
//!
//! Verification runs over the **raw manifest bytes**, never over a parsed
//! and re-serialized structure. A signature that fails to parse, a key
//! absent from the keyring, or a bad signature all yield
//! [`ManifestError::SignatureInvalid`]; callers must treat that as fatal for
//! the refresh cycle and keep whatever previously verified manifest they
//! hold.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signature, VerifyingKey};

use crate::error::ManifestError;

/// Hex-encoded public key identifier
pub type KeyId = String;

/// A set of trusted ed25519 verifying keys, keyed by hex key id.
///
/// The keyring is the trust anchor for one repository. It is populated by
/// the operator out of band (trust-pinning UX lives outside this crate) and
/// read-only during verification.
#[derive(Debug, Clone, Default)]
pub struct Keyring {
    keys: BTreeMap<KeyId, VerifyingKey>,
}

impl Keyring {
    /// Create an empty keyring
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trusted key, returning its key id
    pub fn insert(&mut self, key: VerifyingKey) -> KeyId {
        let id = hex::encode(key.as_bytes());
        self.keys.insert(id.clone(), key);
        id
    }

    /// Add a trusted key from its raw 32-byte encoding
    pub fn insert_bytes(&mut self, bytes: &[u8; 32]) -> Result<KeyId, ManifestError> {
        let key =
            VerifyingKey::from_bytes(bytes).map_err(|e| ManifestError::SignatureInvalid {
                reason: format!("invalid public key: {e}"),
            })?;
        Ok(self.insert(key))
    }

    /// Whether a key id is trusted
    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains_key(id)
    }

    /// Whether the keyring holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of trusted keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Iterate over `(key id, key)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&KeyId, &VerifyingKey)> {
        self.keys.iter()
    }
}

/// Parse a detached signature file.
///
/// Accepts the raw 64-byte signature or its base64 encoding (with
/// surrounding whitespace tolerated), which covers both common ways a
/// publisher writes the sibling `.sig` file.
fn parse_detached(bytes: &[u8]) -> Result<Signature, ManifestError> {
    if let Ok(sig) = Signature::from_slice(bytes) {
        return Ok(sig);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| ManifestError::SignatureInvalid {
        reason: "signature is neither 64 raw bytes nor base64 text".to_string(),
    })?;
    let decoded =
        BASE64
            .decode(text.trim())
            .map_err(|e| ManifestError::SignatureInvalid {
                reason: format!("signature base64 decode failed: {e}"),
            })?;
    Signature::from_slice(&decoded).map_err(|e| ManifestError::SignatureInvalid {
        reason: format!("signature parse failed: {e}"),
    })
}

/// Authenticate manifest bytes against a detached signature.
///
/// Returns the key id of the trusted key that validated the signature.
/// Every failure mode (unparseable signature, empty keyring, no validating
/// key) collapses to [`ManifestError::SignatureInvalid`]: the gate accepts
/// or rejects, it never partially trusts.
pub fn authenticate(
    manifest_bytes: &[u8],
    signature_bytes: &[u8],
    keyring: &Keyring,
) -> Result<KeyId, ManifestError> {
    let signature = parse_detached(signature_bytes)?;
    if keyring.is_empty() {
        return Err(ManifestError::SignatureInvalid {
            reason: "no trusted keys configured for this repository".to_string(),
        });
    }
    for (id, key) in keyring.iter() {
        if key.verify_strict(manifest_bytes, &signature).is_ok() {
            return Ok(id.clone());
        }
    }
    Err(ManifestError::SignatureInvalid {
        reason: "no trusted key validates the manifest signature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    fn keypair() -> (SigningKey, VerifyingKey) {
        let signing = SigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        (signing, verifying)
    }

    #[test]
    fn test_authenticate_valid_signature() {
        let (signing, verifying) = keypair();
        let manifest = br#"{"spec_version":"1.0"}"#;
        let sig = signing.sign(manifest);

        let mut keyring = Keyring::new();
        let id = keyring.insert(verifying);

        let signer = authenticate(manifest, &sig.to_bytes(), &keyring).unwrap();
        assert_eq!(signer, id);
    }

    #[test]
    fn test_authenticate_base64_signature_file() {
        let (signing, verifying) = keypair();
        let manifest = b"manifest bytes";
        let sig = signing.sign(manifest);
        let sig_file = format!("{}\n", BASE64.encode(sig.to_bytes()));

        let mut keyring = Keyring::new();
        keyring.insert(verifying);

        assert!(authenticate(manifest, sig_file.as_bytes(), &keyring).is_ok());
    }

    #[test]
    fn test_tampered_bytes_rejected() {
        let (signing, verifying) = keypair();
        let manifest = b"original manifest";
        let sig = signing.sign(manifest);

        let mut keyring = Keyring::new();
        keyring.insert(verifying);

        let err = authenticate(b"tampered manifest", &sig.to_bytes(), &keyring).unwrap_err();
        assert!(matches!(err, ManifestError::SignatureInvalid { .. }));
    }

    #[test]
    fn test_untrusted_signer_rejected() {
        let (signing, _) = keypair();
        let (_, other_verifying) = keypair();
        let manifest = b"manifest";
        let sig = signing.sign(manifest);

        let mut keyring = Keyring::new();
        keyring.insert(other_verifying);

        assert!(authenticate(manifest, &sig.to_bytes(), &keyring).is_err());
    }

    #[test]
    fn test_empty_keyring_rejected() {
        let (signing, _) = keypair();
        let manifest = b"manifest";
        let sig = signing.sign(manifest);

        assert!(authenticate(manifest, &sig.to_bytes(), &Keyring::new()).is_err());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let mut keyring = Keyring::new();
        keyring.insert(keypair().1);
        assert!(authenticate(b"manifest", b"not a signature", &keyring).is_err());
    }
}
