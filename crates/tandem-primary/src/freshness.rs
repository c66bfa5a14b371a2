//! Nonce lifecycle and Timeserver attestation verification
//!
//! Secondaries cannot trust the Primary's clock, and the Primary cannot
//! trust the network's. Freshness comes from a challenge protocol: nonces
//! collected from Secondaries are forwarded to the Timeserver, and a signed
//! time is accepted only if it echoes every nonce still outstanding. An
//! attacker replaying an old attestation cannot know nonces issued after it
//! was signed, so the replay fails the coverage check.

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;
use tandem_attest::{verify_entry, SignedTimeAttestation, VerifyError};
use tandem_core::{Codec, CodecError, Nonce};
use tracing::{debug, warn};

/// Error type for time attestation verification
#[derive(Debug, thiserror::Error)]
pub enum TimeVerifyError {
    /// The attestation does not carry exactly one signature
    #[error("expected exactly one signature on the time attestation, found {count}")]
    UnsupportedSignatureCount {
        /// Number of signatures found
        count: usize,
    },

    /// The signature does not verify against the pinned Timeserver key
    #[error("timeserver signature did not verify against the pinned key")]
    InvalidSignature,

    /// The attestation omits at least one outstanding nonce
    #[error("attestation omits {} outstanding nonce(s); stale or replayed", missing.len())]
    StaleOrMismatchedAttestation {
        /// The outstanding nonces the attestation failed to echo
        missing: Vec<Nonce>,
    },

    /// The attestation payload could not be re-encoded for verification
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Two disjoint nonce sets tracking the challenge round trip
///
/// `pending` holds nonces received from Secondaries and not yet sent to the
/// Timeserver; `outstanding` holds the set included in the request currently
/// awaiting a response. A nonce is never in both.
#[derive(Debug, Default)]
pub struct NonceLedger {
    pending: IndexSet<Nonce>,
    outstanding: IndexSet<Nonce>,
}

impl NonceLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a nonce received from a Secondary; returns false if it was
    /// already tracked in either set
    pub fn note_pending(&mut self, nonce: Nonce) -> bool {
        if self.outstanding.contains(&nonce) {
            return false;
        }

        self.pending.insert(nonce)
    }

    /// Move all pending nonces into the outstanding set and return them
    ///
    /// The previous outstanding set is discarded. Calling this again before
    /// the in-flight Timeserver request resolves silently abandons that
    /// request's bookkeeping — request/response pairing is the caller's
    /// responsibility.
    pub fn rotate(&mut self) -> IndexSet<Nonce> {
        self.outstanding = std::mem::take(&mut self.pending);
        self.outstanding.clone()
    }

    /// Nonces awaiting the next Timeserver request
    pub fn pending(&self) -> &IndexSet<Nonce> {
        &self.pending
    }

    /// Nonces included in the request currently in flight
    pub fn outstanding(&self) -> &IndexSet<Nonce> {
        &self.outstanding
    }
}

/// Shared clock-override cell fed by verified Timeserver attestations
///
/// Anything evaluating metadata expiry (in practice, the metadata trust
/// client) holds a clone and reads the override instead of system time.
/// Freshness verification is the only writer.
#[derive(Debug, Clone, Default)]
pub struct ClockHandle(Arc<RwLock<Option<DateTime<Utc>>>>);

impl ClockHandle {
    /// The last verified Timeserver time, if any
    pub fn now_override(&self) -> Option<DateTime<Utc>> {
        *self.0.read()
    }

    fn set(&self, time: DateTime<Utc>) {
        *self.0.write() = Some(time);
    }
}

/// One verified Timeserver response: the parsed time plus the attestation
/// that produced it
#[derive(Debug, Clone)]
pub struct VerifiedTime {
    /// The attested time
    pub time: DateTime<Utc>,

    /// The full signed attestation, kept for redistribution to Secondaries
    pub attestation: SignedTimeAttestation,
}

/// Nonce ledger plus the append-only log of verified times
#[derive(Debug)]
pub struct FreshnessProtocol {
    codec: Codec,
    timeserver_key: VerifyingKey,
    ledger: NonceLedger,
    time_log: Vec<VerifiedTime>,
    clock: ClockHandle,
}

impl FreshnessProtocol {
    /// Protocol state pinned to one Timeserver key
    pub fn new(codec: Codec, timeserver_key: VerifyingKey, clock: ClockHandle) -> Self {
        Self {
            codec,
            timeserver_key,
            ledger: NonceLedger::new(),
            time_log: Vec::new(),
            clock,
        }
    }

    /// Record a nonce received from a Secondary
    pub fn note_nonce(&mut self, nonce: Nonce) -> bool {
        self.ledger.note_pending(nonce)
    }

    /// Rotate the ledger for the next Timeserver request
    pub fn rotate_nonces(&mut self) -> IndexSet<Nonce> {
        let rotated = self.ledger.rotate();
        debug!(count = rotated.len(), "rotated nonces for timeserver request");
        rotated
    }

    /// The nonce ledger
    pub fn ledger(&self) -> &NonceLedger {
        &self.ledger
    }

    /// Number of attestations verified so far
    pub fn verified_count(&self) -> usize {
        self.time_log.len()
    }

    /// The most recent verified time and attestation, if any
    pub fn latest(&self) -> Option<&VerifiedTime> {
        self.time_log.last()
    }

    /// Verify a Timeserver attestation and, on success, advance the clock
    ///
    /// Checks, in order: exactly one signature; the signature verifies
    /// against the pinned Timeserver key; every outstanding nonce appears in
    /// the attestation's nonce list. Nothing is recorded on any failure.
    pub fn verify_attestation(
        &mut self,
        attestation: SignedTimeAttestation,
    ) -> Result<(), TimeVerifyError> {
        if attestation.signatures.len() != 1 {
            return Err(TimeVerifyError::UnsupportedSignatureCount {
                count: attestation.signatures.len(),
            });
        }

        verify_entry(
            &self.codec,
            &attestation,
            &attestation.signatures[0],
            &self.timeserver_key,
        )
        .map_err(|e| match e {
            VerifyError::Codec(codec) => TimeVerifyError::Codec(codec),
            VerifyError::MalformedSignature(_) | VerifyError::SignatureMismatch { .. } => {
                TimeVerifyError::InvalidSignature
            }
        })?;

        let missing: Vec<Nonce> = self
            .ledger
            .outstanding()
            .iter()
            .filter(|nonce| !attestation.signed.covers(**nonce))
            .copied()
            .collect();

        if !missing.is_empty() {
            warn!(
                missing = missing.len(),
                "timeserver attestation omits outstanding nonces; rejecting as stale or replayed"
            );
            return Err(TimeVerifyError::StaleOrMismatchedAttestation { missing });
        }

        let time = attestation.signed.time;
        self.time_log.push(VerifiedTime { time, attestation });
        self.clock.set(time);
        debug!(%time, "verified timeserver attestation; clock override advanced");

        Ok(())
    }
}
