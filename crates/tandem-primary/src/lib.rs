//! Tandem Primary - the vehicle-resident update validation core
//!
//! A Primary ECU sits between two independent update authorities and the
//! vehicle's Secondary ECUs. It refuses to trust either authority alone:
//! the Director says *what to install where*, the Image Repository
//! independently vouches for *which bytes are genuine*, and only targets
//! both agree on are assigned, downloaded, and republished for Secondaries.
//! Alongside that it keeps trustworthy time via a nonce challenge against a
//! Timeserver and aggregates Secondary attestations into one signed vehicle
//! manifest for the Director.
//!
//! The entry point is [`Primary`], constructed once per process with a
//! [`config::PrimaryConfig`], a metadata trust client implementing
//! [`tandem_core::effects::MetadataTrustEffects`], the Primary's signing
//! key, and the pinned Timeserver key.

#![forbid(unsafe_code)]

/// Client configuration
pub mod config;

/// Multi-authority target validation
pub mod consensus;

/// The update cycle state machine
pub mod cycle;

/// Nonce lifecycle and Timeserver attestation verification
pub mod freshness;

/// ECU report buffering for manifest aggregation
pub mod manifest;

/// The long-lived Primary instance
pub mod primary;

/// Distribution artifact construction and atomic swap
pub mod publish;

/// Secondary registration and assignment state
pub mod registry;

pub use config::{ConfigError, PrimaryConfig};
pub use consensus::{ConsensusError, ConsensusTargetInfo};
pub use cycle::{CycleError, CycleReport};
pub use freshness::{ClockHandle, FreshnessProtocol, NonceLedger, TimeVerifyError, VerifiedTime};
pub use manifest::{ManifestBuffer, RegistrationError};
pub use primary::Primary;
pub use publish::{PublishError, Publisher};
pub use registry::{QueryError, SecondaryRegistry};
