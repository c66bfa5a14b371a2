//! Effect interfaces consumed from external collaborators
//!
//! The Primary's trust logic never talks to the network itself. Everything
//! network-shaped — refreshing role metadata, resolving multi-authority
//! consensus, downloading images — is reached through the narrow trait in
//! [`metadata`], implemented elsewhere by the repository-metadata trust
//! client. This keeps the validation core testable against scripted
//! implementations and keeps retry/cancellation policy out of the core.

pub mod metadata;

pub use metadata::{MetadataTrustEffects, MetadataTrustError};
