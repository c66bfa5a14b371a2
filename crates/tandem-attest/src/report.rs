//! Per-ECU version reports
//!
//! A Secondary periodically reports what it is running. The Primary does
//! not verify the Secondary's signature on these — a compromised ECU's lies
//! are themselves diagnostic signal — it only checks that the transport
//! identity matches the identity embedded in the signed payload, then
//! forwards everything to the Director inside the next vehicle manifest.

use crate::envelope::Signed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tandem_core::{EcuSerial, TargetFileInfo, TargetPath};

/// The image an ECU claims to currently run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledImage {
    /// Repository-relative path of the installed file
    pub filepath: TargetPath,

    /// The fileinfo the ECU validated at install time
    pub fileinfo: TargetFileInfo,
}

/// The payload a Secondary signs when reporting its state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcuVersionReport {
    /// The reporting ECU's own serial
    pub ecu_serial: EcuSerial,

    /// What the ECU claims to be running, if it knows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_image: Option<InstalledImage>,

    /// Free-text self-reported attack observations; empty means none
    #[serde(default)]
    pub attacks_detected: String,

    /// The last Timeserver time the ECU accepted, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeserver_time: Option<DateTime<Utc>>,
}

impl EcuVersionReport {
    /// Minimal report carrying only the ECU's identity
    pub fn new(ecu_serial: EcuSerial) -> Self {
        Self {
            ecu_serial,
            installed_image: None,
            attacks_detected: String::new(),
            timeserver_time: None,
        }
    }

    /// Whether the ECU reported any detected attacks
    pub fn reports_attacks(&self) -> bool {
        !self.attacks_detected.is_empty()
    }
}

/// An ECU version report inside its signed envelope
pub type SignedEcuReport = Signed<EcuVersionReport>;
