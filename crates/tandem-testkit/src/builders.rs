//! Builders for targets, attestations, and reports
//!
//! Small composable helpers so integration tests read as scenarios rather
//! than as struct assembly.

use crate::keys::KeyFixture;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;
use tandem_attest::{
    EcuVersionReport, SignedEcuReport, SignedTimeAttestation, TimeAttestation,
};
use tandem_core::{
    AuthorityName, Codec, DirectedTarget, EcuSerial, Nonce, TargetCustom, TargetFileInfo,
    TargetPath,
};

/// Lowercase hex sha256 of a byte string
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Fileinfo describing exactly these bytes, with no custom block
pub fn fileinfo_for(bytes: &[u8]) -> TargetFileInfo {
    TargetFileInfo::with_sha256(bytes.len() as u64, sha256_hex(bytes))
}

/// The Director's view of a target: fileinfo for the bytes plus the ECU
/// assignment in the custom block
pub fn directed_target(path: &str, bytes: &[u8], ecu: &EcuSerial) -> DirectedTarget {
    let mut fileinfo = fileinfo_for(bytes);
    fileinfo.custom = Some(TargetCustom::assigned_to(ecu.clone()));
    DirectedTarget::new(TargetPath::new(path), fileinfo)
}

/// A signed Timeserver attestation over the given time and nonce set
pub fn signed_time_attestation(
    timeserver: &KeyFixture,
    codec: &Codec,
    time: DateTime<Utc>,
    nonces: Vec<Nonce>,
) -> SignedTimeAttestation {
    timeserver
        .signer()
        .sign(codec, TimeAttestation::new(time, nonces))
        .unwrap_or_else(|e| panic!("failed to sign test attestation: {e}"))
}

/// A signed ECU version report with the given attack observations
pub fn signed_ecu_report(
    secondary: &KeyFixture,
    codec: &Codec,
    ecu: &EcuSerial,
    attacks_detected: &str,
) -> SignedEcuReport {
    let mut report = EcuVersionReport::new(ecu.clone());
    report.attacks_detected = attacks_detected.to_string();

    secondary
        .signer()
        .sign(codec, report)
        .unwrap_or_else(|e| panic!("failed to sign test report: {e}"))
}

/// Seed a local metadata store with the four top-level role files for every
/// authority, the way the trust client leaves it after a refresh
pub fn seed_metadata_store(metadata_root: &Path, authorities: &[AuthorityName], extension: &str) {
    for authority in authorities {
        let current = metadata_root.join(authority.as_str()).join("current");
        std::fs::create_dir_all(&current)
            .unwrap_or_else(|e| panic!("failed to create metadata store: {e}"));

        for role in ["root", "targets", "snapshot", "timestamp"] {
            let path = current.join(format!("{role}.{extension}"));
            let content = format!("{{\"_type\":\"{role}\",\"authority\":\"{authority}\"}}");
            std::fs::write(&path, content)
                .unwrap_or_else(|e| panic!("failed to seed role file: {e}"));
        }
    }
}
