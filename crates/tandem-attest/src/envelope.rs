//! Signed envelope shared by every attested structure
//!
//! The wire shape is `{ signed: <payload>, signatures: [...] }`; signatures
//! are computed over the codec-encoded bytes of the payload alone, so the
//! envelope can be re-wrapped without invalidating anything.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One signature over a payload, tagged with the signing key's identifier
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Hex sha256 fingerprint of the verifying key
    pub key_id: String,

    /// Raw ed25519 signature bytes
    pub sig: Vec<u8>,
}

impl fmt::Debug for SignatureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureEntry")
            .field("key_id", &self.key_id)
            .field("sig", &hex::encode(&self.sig))
            .finish()
    }
}

/// A payload together with the signatures vouching for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signed<T> {
    /// The payload that was signed
    pub signed: T,

    /// Signatures over the codec-encoded payload
    pub signatures: Vec<SignatureEntry>,
}

impl<T> Signed<T> {
    /// Wrap a payload with an existing set of signatures
    pub fn new(signed: T, signatures: Vec<SignatureEntry>) -> Self {
        Self { signed, signatures }
    }
}
