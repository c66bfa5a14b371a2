//! Tandem Core - shared foundation for the Primary update client
//!
//! This crate provides the identifier newtypes, target-file data model, wire
//! codec, and effect interfaces shared by the rest of the Tandem workspace.
//! It contains no Primary-role logic: the orchestration, freshness, and
//! publication machinery live in `tandem-primary`, and signed-structure
//! types live in `tandem-attest`.

#![forbid(unsafe_code)]

/// Vehicle, ECU, authority, and nonce identifier types
pub mod identifiers;

/// Target file paths and per-authority file metadata
pub mod target;

/// Wire codec selected by configuration (JSON or DAG-CBOR)
pub mod codec;

/// Effect interfaces consumed from external collaborators
pub mod effects;

pub use codec::{Codec, CodecError, WireFormat};
pub use identifiers::{AuthorityName, EcuSerial, Nonce, VehicleIdentity, Vin};
pub use target::{DirectedTarget, TargetCustom, TargetFileInfo, TargetPath};
