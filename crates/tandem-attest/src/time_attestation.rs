//! Timeserver attestation payloads
//!
//! The Timeserver signs a wall-clock time together with the exact nonce set
//! it was asked to echo. Verification (signature plus nonce coverage) lives
//! in `tandem-primary`'s freshness protocol; this module is just the shape.

use crate::envelope::Signed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tandem_core::Nonce;

/// The payload a Timeserver signs in response to a nonce challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAttestation {
    /// The time the Timeserver attests to
    pub time: DateTime<Utc>,

    /// Every nonce the Timeserver saw in the triggering request
    pub nonces: Vec<Nonce>,
}

impl TimeAttestation {
    /// Build an attestation payload over a time and nonce set
    pub fn new(time: DateTime<Utc>, nonces: Vec<Nonce>) -> Self {
        Self { time, nonces }
    }

    /// Whether the attestation echoes the given nonce
    pub fn covers(&self, nonce: Nonce) -> bool {
        self.nonces.contains(&nonce)
    }
}

/// A time attestation inside its signed envelope
pub type SignedTimeAttestation = Signed<TimeAttestation>;
