//! Core identifier types used across the Tandem workspace
//!
//! Every identifier here is assigned externally (by the fleet operator or by
//! a Secondary at install time); none of them is generated by this client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vehicle identifier, unique per vehicle and known to the Director
///
/// Conventionally a VIN, but any string the Director can resolve to one
/// vehicle works.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vin(String);

impl Vin {
    /// Create a VIN from any string-like value
    pub fn new(vin: impl Into<String>) -> Self {
        Self(vin.into())
    }

    /// Borrow the VIN as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Vin {
    fn from(vin: &str) -> Self {
        Self::new(vin)
    }
}

/// Serial number identifying one ECU (the Primary itself or a Secondary)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EcuSerial(String);

impl EcuSerial {
    /// Create an ECU serial from any string-like value
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    /// Borrow the serial as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EcuSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EcuSerial {
    fn from(serial: &str) -> Self {
        Self::new(serial)
    }
}

/// Name of a metadata authority as configured in the trust policy
///
/// Typical values are `director` and `image-repo`. The name must match what
/// the metadata trust client uses for the same repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthorityName(String);

impl AuthorityName {
    /// Create an authority name from any string-like value
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorityName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Single-use freshness token minted by a Secondary
///
/// The Primary forwards nonces to the Timeserver and requires each
/// outstanding nonce to reappear in the signed time attestation, which is
/// what makes a replayed attestation detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nonce(u64);

impl Nonce {
    /// Wrap a raw nonce value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw nonce value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The identity pair this Primary presents: its vehicle and its own serial
///
/// Immutable after construction; both halves end up inside every vehicle
/// manifest the Primary signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    vin: Vin,
    primary_ecu: EcuSerial,
}

impl VehicleIdentity {
    /// Bind a VIN to the Primary's own ECU serial
    pub fn new(vin: Vin, primary_ecu: EcuSerial) -> Self {
        Self { vin, primary_ecu }
    }

    /// The vehicle identifier
    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    /// The Primary's own ECU serial
    pub fn primary_ecu(&self) -> &EcuSerial {
        &self.primary_ecu
    }
}
