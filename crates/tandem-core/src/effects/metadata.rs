//! Metadata trust client interface
//!
//! The trust client owns role-metadata verification (root/targets/snapshot/
//! timestamp chains), mirror selection, and download integrity checking.
//! The Primary consumes those capabilities through [`MetadataTrustEffects`]
//! and layers vehicle-specific policy — ECU assignment extraction, path
//! containment, publication — on top.

use crate::identifiers::AuthorityName;
use crate::target::{DirectedTarget, TargetFileInfo, TargetPath};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Error type for metadata trust operations
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum MetadataTrustError {
    /// Root-of-trust metadata for an authority expired, or the authority
    /// could not be reached at all
    #[error("metadata for {authority} expired or unreachable: {reason}")]
    ExpiredOrUnreachable {
        /// The authority whose refresh failed
        authority: AuthorityName,
        /// Human-readable failure description
        reason: String,
    },

    /// The required authorities did not produce matching fileinfo for a
    /// target, or one of them had no listing for it
    #[error("no multi-authority consensus for {filepath}: {reason}")]
    ConsensusRejected {
        /// The target path that failed consensus
        filepath: TargetPath,
        /// Human-readable failure description
        reason: String,
    },

    /// Every configured mirror failed to produce a file matching the
    /// validated fileinfo
    #[error("no working mirror for {filepath}")]
    MirrorFailure {
        /// The target path that could not be downloaded
        filepath: TargetPath,
        /// Mirror identifier paired with the error it produced
        per_mirror: Vec<(String, String)>,
    },
}

/// Narrow interface onto the repository-metadata trust client
///
/// Implementations perform full cryptographic verification before returning
/// anything; callers treat every returned value as already trusted at the
/// metadata layer. None of these methods is retried by the caller — a
/// failure is surfaced once and retry cadence is the driver's decision.
#[async_trait]
pub trait MetadataTrustEffects: Send + Sync {
    /// Refresh the top-level signed roles for one authority
    async fn refresh(&self, authority: &AuthorityName) -> Result<(), MetadataTrustError>;

    /// Enumerate the targets a role on the given authority currently signs
    ///
    /// An empty declaration is a valid outcome, not an error.
    async fn directed_targets(
        &self,
        role: &str,
        authority: &AuthorityName,
    ) -> Result<Vec<DirectedTarget>, MetadataTrustError>;

    /// Resolve one target path against every authority the trust policy
    /// requires for it
    ///
    /// Succeeds only when all required authorities returned fileinfo
    /// agreeing on hash and length; the per-authority map is returned so the
    /// caller can extract authority-specific custom fields.
    async fn resolve_consensus(
        &self,
        filepath: &TargetPath,
    ) -> Result<BTreeMap<AuthorityName, TargetFileInfo>, MetadataTrustError>;

    /// Download a validated target into `dest_dir`, preserving its relative
    /// path, keeping the file only if it matches `fileinfo`
    async fn download(
        &self,
        filepath: &TargetPath,
        fileinfo: &TargetFileInfo,
        dest_dir: &Path,
    ) -> Result<(), MetadataTrustError>;
}

#[async_trait]
impl<T: MetadataTrustEffects + ?Sized> MetadataTrustEffects for Arc<T> {
    async fn refresh(&self, authority: &AuthorityName) -> Result<(), MetadataTrustError> {
        (**self).refresh(authority).await
    }

    async fn directed_targets(
        &self,
        role: &str,
        authority: &AuthorityName,
    ) -> Result<Vec<DirectedTarget>, MetadataTrustError> {
        (**self).directed_targets(role, authority).await
    }

    async fn resolve_consensus(
        &self,
        filepath: &TargetPath,
    ) -> Result<BTreeMap<AuthorityName, TargetFileInfo>, MetadataTrustError> {
        (**self).resolve_consensus(filepath).await
    }

    async fn download(
        &self,
        filepath: &TargetPath,
        fileinfo: &TargetFileInfo,
        dest_dir: &Path,
    ) -> Result<(), MetadataTrustError> {
        (**self).download(filepath, fileinfo, dest_dir).await
    }
}
