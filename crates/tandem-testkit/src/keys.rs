//! Deterministic key fixtures
//!
//! Tests need stable keys so signatures and fingerprints are reproducible
//! across runs; seeds are expanded the same way every time.

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use tandem_attest::{key_id_for, Ed25519Signer};

/// A signing/verifying key pair derived from a fixed seed
#[derive(Debug, Clone)]
pub struct KeyFixture {
    signing_key: SigningKey,
    key_id: String,
}

impl KeyFixture {
    /// Deterministic fixture from raw seed bytes
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let key_id = key_id_for(&signing_key.verifying_key());

        Self {
            signing_key,
            key_id,
        }
    }

    /// Deterministic fixture from a seed string
    pub fn from_seed_string(seed: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        Self::from_seed(&digest)
    }

    /// Fresh fixture from process entropy, for tests that want distinct keys
    /// without caring which
    pub fn random() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// The signing key
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// The verifying key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex fingerprint of the verifying key
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// A ready-to-use signer over this key
    pub fn signer(&self) -> Ed25519Signer {
        Ed25519Signer::new(self.signing_key.clone())
    }
}
