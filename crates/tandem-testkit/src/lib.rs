//! Tandem Testkit - fixtures and scripted collaborators
//!
//! Deterministic signing keys, a scriptable stand-in for the metadata trust
//! client, and builders for the signed structures the test suites exercise.
//! Everything here is test support; nothing ships in a vehicle.

#![forbid(unsafe_code)]

/// Deterministic key fixtures
pub mod keys;

/// Scripted metadata trust client
pub mod mock_trust;

/// Builders for targets, attestations, and reports
pub mod builders;

pub use builders::{
    directed_target, fileinfo_for, seed_metadata_store, sha256_hex, signed_ecu_report,
    signed_time_attestation,
};
pub use keys::KeyFixture;
pub use mock_trust::ScriptedTrustClient;
