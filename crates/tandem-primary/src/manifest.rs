//! ECU report buffering for vehicle manifest aggregation
//!
//! Reports accumulate between vehicle manifests and are drained exactly
//! when one is produced. The drain happens only after signing succeeds:
//! losing a buffered report would deprive the Director of attack evidence,
//! whereas reporting one twice is harmless.

use indexmap::IndexMap;
use tandem_attest::SignedEcuReport;
use tandem_core::{EcuSerial, Vin};

/// Error type for ECU report registration
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The report claims a vehicle this Primary does not serve
    #[error("report claims vehicle {claimed}, this primary serves {ours}")]
    UnknownVehicle {
        /// VIN named by the caller
        claimed: Vin,
        /// VIN this Primary serves
        ours: Vin,
    },

    /// The reporting ECU is not a registered Secondary
    #[error("ECU {0} is not a registered secondary of this primary")]
    UnknownEcu(EcuSerial),

    /// The transport-level identity differs from the signed payload's
    #[error("transport identity {transport} does not match signed report identity {signed}")]
    Spoofing {
        /// ECU serial presented at the transport layer
        transport: EcuSerial,
        /// ECU serial embedded in the signed payload
        signed: EcuSerial,
    },

    /// The report bytes could not be decoded as a signed ECU report
    #[error("could not decode signed ECU report: {0}")]
    MalformedReport(String),
}

/// Buffered ECU reports awaiting the next vehicle manifest
///
/// Append-only between manifest generations. ECU keys keep first-arrival
/// order; each ECU's reports keep their own arrival order, and multiple
/// reports per ECU per cycle are expected.
#[derive(Debug, Default)]
pub struct ManifestBuffer {
    reports: IndexMap<EcuSerial, Vec<SignedEcuReport>>,
}

impl ManifestBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report for an ECU, preserving everything already buffered
    pub fn append(&mut self, ecu: EcuSerial, report: SignedEcuReport) {
        self.reports.entry(ecu).or_default().push(report);
    }

    /// Total number of buffered reports across all ECUs
    pub fn report_count(&self) -> usize {
        self.reports.values().map(Vec::len).sum()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Clone the buffered reports for inclusion in a manifest
    pub fn snapshot(&self) -> IndexMap<EcuSerial, Vec<SignedEcuReport>> {
        self.reports.clone()
    }

    /// Drop everything buffered; called only after a manifest covering the
    /// snapshot has been signed
    pub fn clear(&mut self) {
        self.reports.clear();
    }
}
