//! Aggregated vehicle manifest
//!
//! One signed report per reporting cycle covering the whole vehicle: every
//! buffered ECU report, grouped by ECU in registration-arrival order, with
//! per-ECU reports kept in the order they arrived. The Director untangles
//! conflicting or suspicious reports; the Primary never filters them.

use crate::envelope::Signed;
use crate::report::SignedEcuReport;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tandem_core::{EcuSerial, Vin};

/// The payload the Primary signs when reporting the whole vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleManifest {
    /// The vehicle this manifest describes
    pub vin: Vin,

    /// The Primary that assembled and signed the manifest
    pub primary_ecu_serial: EcuSerial,

    /// All buffered reports, per ECU, arrival order preserved both between
    /// and within ECUs
    pub ecu_version_reports: IndexMap<EcuSerial, Vec<SignedEcuReport>>,
}

impl VehicleManifest {
    /// Total number of individual ECU reports in the manifest
    pub fn report_count(&self) -> usize {
        self.ecu_version_reports.values().map(Vec::len).sum()
    }

    /// Whether the manifest carries no ECU reports at all
    pub fn is_empty(&self) -> bool {
        self.ecu_version_reports.is_empty()
    }
}

/// A vehicle manifest inside its signed envelope
pub type SignedVehicleManifest = Signed<VehicleManifest>;
