//! ed25519 signing and verification over codec-encoded payloads
//!
//! Signatures always cover the payload as encoded by the deployment's
//! configured codec, so a JSON vehicle and a DAG-CBOR vehicle each verify
//! against their own wire bytes without format sniffing.

use crate::envelope::{SignatureEntry, Signed};
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tandem_core::{Codec, CodecError};

/// Hex sha256 fingerprint of a verifying key
pub fn key_id_for(verifying_key: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifying_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Error type for signature verification
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The payload could not be encoded for verification
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The signature bytes are not a well-formed ed25519 signature
    #[error("malformed signature bytes: {0}")]
    MalformedSignature(String),

    /// The signature does not verify against the given key
    #[error("signature does not verify against key {key_id}")]
    SignatureMismatch {
        /// Fingerprint of the key the check ran against
        key_id: String,
    },
}

/// Verify one signature entry of a signed envelope against a known key
///
/// The payload is re-encoded with the same codec that produced the signed
/// bytes; callers pick which entry to check (single-signature protocols
/// check `signatures[0]` after asserting the count).
pub fn verify_entry<T: Serialize>(
    codec: &Codec,
    signed: &Signed<T>,
    entry: &SignatureEntry,
    verifying_key: &VerifyingKey,
) -> Result<(), VerifyError> {
    let payload = codec.encode(&signed.signed)?;
    let signature = Signature::from_slice(&entry.sig)
        .map_err(|e| VerifyError::MalformedSignature(e.to_string()))?;

    verifying_key
        .verify_strict(&payload, &signature)
        .map_err(|_| VerifyError::SignatureMismatch {
            key_id: key_id_for(verifying_key),
        })
}

/// Single-key ed25519 signer with a cached key fingerprint
#[derive(Debug, Clone)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
    key_id: String,
}

impl Ed25519Signer {
    /// Wrap a signing key, deriving its public fingerprint
    pub fn new(signing_key: SigningKey) -> Self {
        let key_id = key_id_for(&signing_key.verifying_key());
        Self {
            signing_key,
            key_id,
        }
    }

    /// Fingerprint of the corresponding verifying key
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The corresponding verifying key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a payload, producing its envelope with exactly one signature
    pub fn sign<T: Serialize>(&self, codec: &Codec, payload: T) -> Result<Signed<T>, CodecError> {
        let bytes = codec.encode(&payload)?;
        let signature = self.signing_key.sign(&bytes);

        Ok(Signed::new(
            payload,
            vec![SignatureEntry {
                key_id: self.key_id.clone(),
                sig: signature.to_bytes().to_vec(),
            }],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_attestation::TimeAttestation;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use tandem_core::{Nonce, WireFormat};

    fn signer(seed: u8) -> Ed25519Signer {
        Ed25519Signer::new(SigningKey::from_bytes(&[seed; 32]))
    }

    fn attestation() -> TimeAttestation {
        TimeAttestation::new(
            Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap(),
            vec![Nonce::new(7), Nonce::new(11)],
        )
    }

    #[test]
    fn test_signed_envelope_verifies_with_matching_key() {
        let codec = Codec::new(WireFormat::Json);
        let signer = signer(1);

        let signed = signer.sign(&codec, attestation()).unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(signed.signatures[0].key_id, signer.key_id());

        verify_entry(&codec, &signed, &signed.signatures[0], &signer.verifying_key()).unwrap();
    }

    #[test]
    fn test_wrong_key_is_a_mismatch_not_a_panic() {
        let codec = Codec::new(WireFormat::DagCbor);
        let signed = signer(1).sign(&codec, attestation()).unwrap();

        let other = signer(2);
        assert_matches!(
            verify_entry(&codec, &signed, &signed.signatures[0], &other.verifying_key()),
            Err(VerifyError::SignatureMismatch { .. })
        );
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let codec = Codec::new(WireFormat::Json);
        let signer = signer(1);
        let mut signed = signer.sign(&codec, attestation()).unwrap();

        signed.signed.nonces.push(Nonce::new(99));

        assert_matches!(
            verify_entry(&codec, &signed, &signed.signatures[0], &signer.verifying_key()),
            Err(VerifyError::SignatureMismatch { .. })
        );
    }

    #[test]
    fn test_garbage_signature_bytes_are_malformed() {
        let codec = Codec::new(WireFormat::Json);
        let signer = signer(1);
        let mut signed = signer.sign(&codec, attestation()).unwrap();

        signed.signatures[0].sig = vec![0xab; 5];

        assert_matches!(
            verify_entry(&codec, &signed, &signed.signatures[0], &signer.verifying_key()),
            Err(VerifyError::MalformedSignature(_))
        );
    }
}
