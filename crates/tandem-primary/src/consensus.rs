//! Multi-authority target validation
//!
//! The Director alone must never be able to direct an installation. A
//! directed target becomes trustworthy only when every authority the trust
//! policy requires has vouched for the same bytes, and the only fileinfo
//! the rest of the system ever sees for it is built here, after that check.

use tandem_core::effects::MetadataTrustEffects;
use tandem_core::{AuthorityName, DirectedTarget, EcuSerial, TargetFileInfo, TargetPath};
use tracing::debug;

/// The outcome of validating one directed target against all required
/// authorities
///
/// Constructed exclusively by [`validate_directed_target`]; holding one is
/// proof that every required authority agreed on hash and length and that
/// the Director assigned the file to exactly one ECU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusTargetInfo {
    filepath: TargetPath,
    fileinfo: TargetFileInfo,
    assigned_ecu: EcuSerial,
}

impl ConsensusTargetInfo {
    pub(crate) fn new(filepath: TargetPath, fileinfo: TargetFileInfo, assigned_ecu: EcuSerial) -> Self {
        Self {
            filepath,
            fileinfo,
            assigned_ecu,
        }
    }

    /// Repository-relative path of the validated file
    pub fn filepath(&self) -> &TargetPath {
        &self.filepath
    }

    /// The Director's fileinfo, corroborated by every required authority
    pub fn fileinfo(&self) -> &TargetFileInfo {
        &self.fileinfo
    }

    /// The ECU the Director assigned the file to
    pub fn assigned_ecu(&self) -> &EcuSerial {
        &self.assigned_ecu
    }
}

/// Error type for consensus validation
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    /// Authorities disagree on the target or one was unreachable; the
    /// caller skips this target and carries on
    #[error("no multi-authority consensus for {filepath}: {reason}")]
    Rejected {
        /// The target that failed validation
        filepath: TargetPath,
        /// Human-readable failure description
        reason: String,
    },

    /// The consensus result does not include the Director at all, meaning
    /// the trust policy lets targets validate without Director approval
    #[error("director absent from consensus result for {filepath}; trust policy misconfigured")]
    DirectorAbsent {
        /// The target whose consensus result omitted the Director
        filepath: TargetPath,
    },

    /// The Director vouched for the file but assigned it to no ECU
    #[error("director entry for {filepath} carries no ECU assignment")]
    MissingEcuAssignment {
        /// The target with no assignment
        filepath: TargetPath,
    },
}

impl ConsensusError {
    /// Whether the caller may skip this target and continue the cycle
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConsensusError::Rejected { .. })
    }
}

/// Validate one directed target against every required authority
///
/// On success the returned info is the Director's entry — the only one
/// carrying an ECU assignment — corroborated on hash and length by every
/// other authority in the consensus result.
pub(crate) async fn validate_directed_target<M: MetadataTrustEffects>(
    trust: &M,
    director: &AuthorityName,
    target: &DirectedTarget,
) -> Result<ConsensusTargetInfo, ConsensusError> {
    let by_authority = trust
        .resolve_consensus(&target.filepath)
        .await
        .map_err(|e| ConsensusError::Rejected {
            filepath: target.filepath.clone(),
            reason: e.to_string(),
        })?;

    let director_info = by_authority
        .get(director)
        .ok_or_else(|| ConsensusError::DirectorAbsent {
            filepath: target.filepath.clone(),
        })?;

    // The trust client already required agreement; re-check here so a buggy
    // client cannot hand us uncorroborated fileinfo.
    for (authority, fileinfo) in &by_authority {
        if !fileinfo.matches_consensus(director_info) {
            return Err(ConsensusError::Rejected {
                filepath: target.filepath.clone(),
                reason: format!("authority {authority} disagrees on hash or length"),
            });
        }
    }

    let assigned_ecu = director_info
        .assigned_ecu()
        .cloned()
        .ok_or_else(|| ConsensusError::MissingEcuAssignment {
            filepath: target.filepath.clone(),
        })?;

    debug!(
        filepath = %target.filepath,
        ecu = %assigned_ecu,
        authorities = by_authority.len(),
        "directed target validated by all required authorities"
    );

    Ok(ConsensusTargetInfo::new(
        target.filepath.clone(),
        director_info.clone(),
        assigned_ecu,
    ))
}
