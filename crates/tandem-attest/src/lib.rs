//! Tandem Attest - signed structures exchanged with Secondaries and services
//!
//! Everything the Primary signs or verifies itself lives here: the generic
//! signed envelope, Timeserver attestations, per-ECU version reports, and
//! the aggregated vehicle manifest, together with the ed25519 helpers that
//! produce and check their signatures. Role-metadata signatures (root,
//! targets, snapshot, timestamp chains) are out of scope — those belong to
//! the metadata trust client behind `tandem_core::effects`.

#![forbid(unsafe_code)]

/// Signed envelope and signature entries
pub mod envelope;

/// Timeserver attestation payloads
pub mod time_attestation;

/// Per-ECU version reports
pub mod report;

/// Aggregated vehicle manifest
pub mod manifest;

/// ed25519 signing and verification over codec-encoded payloads
pub mod signing;

pub use envelope::{SignatureEntry, Signed};
pub use manifest::{SignedVehicleManifest, VehicleManifest};
pub use report::{EcuVersionReport, InstalledImage, SignedEcuReport};
pub use signing::{key_id_for, verify_entry, Ed25519Signer, VerifyError};
pub use time_attestation::{SignedTimeAttestation, TimeAttestation};
