//! Target file paths and per-authority file metadata
//!
//! A target is a file the Director wants installed somewhere in the vehicle.
//! Authorities describe a target with [`TargetFileInfo`]; two authorities
//! are in consensus on a target when their fileinfo agrees on length and on
//! every hash, while the `custom` block is deliberately excluded from the
//! comparison — only the Director is entitled to put an ECU assignment
//! there, so `custom` legitimately differs between authorities.

use crate::identifiers::EcuSerial;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Repository-relative path of a target file
///
/// Always interpreted relative to a repository root or the local targets
/// directory; containment against the local directory is enforced at
/// assignment time, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetPath(String);

impl TargetPath {
    /// Create a target path from any string-like value
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Borrow the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Authority-specific extension block inside a target's fileinfo
///
/// The Director uses this to carry the ECU assignment; other authorities
/// leave it empty. Unknown keys are preserved round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCustom {
    /// The ECU the Director has assigned this target to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecu_serial: Option<EcuSerial>,

    /// Any further authority-specific fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TargetCustom {
    /// Custom block carrying only an ECU assignment
    pub fn assigned_to(ecu: EcuSerial) -> Self {
        Self {
            ecu_serial: Some(ecu),
            extra: BTreeMap::new(),
        }
    }
}

/// One authority's description of a target file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFileInfo {
    /// Exact file length in bytes
    pub length: u64,

    /// Hash algorithm name mapped to the lowercase hex digest
    pub hashes: BTreeMap<String, String>,

    /// Authority-specific extension block, excluded from consensus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<TargetCustom>,
}

impl TargetFileInfo {
    /// Fileinfo with a single sha256 digest and no custom block
    pub fn with_sha256(length: u64, digest: impl Into<String>) -> Self {
        let mut hashes = BTreeMap::new();
        hashes.insert("sha256".to_string(), digest.into());
        Self {
            length,
            hashes,
            custom: None,
        }
    }

    /// The sha256 digest, if the authority supplied one
    pub fn sha256(&self) -> Option<&str> {
        self.hashes.get("sha256").map(String::as_str)
    }

    /// The ECU assignment in the custom block, if any
    pub fn assigned_ecu(&self) -> Option<&EcuSerial> {
        self.custom.as_ref().and_then(|c| c.ecu_serial.as_ref())
    }

    /// Whether two authorities agree on this file
    ///
    /// Agreement covers length and the full hash map; the `custom` block is
    /// excluded because only the Director populates it.
    pub fn matches_consensus(&self, other: &Self) -> bool {
        self.length == other.length && self.hashes == other.hashes
    }
}

/// One entry from the Director's current targets declaration
///
/// Transient: recomputed on every update cycle and validated against the
/// other authorities before anything downstream may trust it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedTarget {
    /// Repository-relative path of the file
    pub filepath: TargetPath,

    /// The Director's asserted fileinfo, including the ECU assignment
    pub fileinfo: TargetFileInfo,
}

impl DirectedTarget {
    /// Pair a path with the Director's fileinfo for it
    pub fn new(filepath: TargetPath, fileinfo: TargetFileInfo) -> Self {
        Self { filepath, fileinfo }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(length: u64, digest: &str) -> TargetFileInfo {
        TargetFileInfo::with_sha256(length, digest)
    }

    #[test]
    fn test_consensus_ignores_custom_block() {
        let mut director = info(128, "aa".repeat(32).as_str());
        director.custom = Some(TargetCustom::assigned_to(EcuSerial::new("ecuA")));
        let image_repo = info(128, "aa".repeat(32).as_str());

        assert!(director.matches_consensus(&image_repo));
        assert!(image_repo.matches_consensus(&director));
    }

    #[test]
    fn test_consensus_rejects_hash_or_length_drift() {
        let director = info(128, "aa".repeat(32).as_str());

        let wrong_hash = info(128, "bb".repeat(32).as_str());
        assert!(!director.matches_consensus(&wrong_hash));

        let wrong_length = info(129, "aa".repeat(32).as_str());
        assert!(!director.matches_consensus(&wrong_length));
    }
}
