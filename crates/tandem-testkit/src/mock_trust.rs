//! Scripted metadata trust client
//!
//! Implements `MetadataTrustEffects` over an in-memory script: tests decide
//! which authorities vouch for which fileinfo, which refreshes fail, and
//! which downloads find no working mirror. Downloads write scripted bytes
//! under the destination directory the way the real client deposits
//! verified images.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tandem_core::effects::{MetadataTrustEffects, MetadataTrustError};
use tandem_core::{AuthorityName, DirectedTarget, TargetFileInfo, TargetPath};

#[derive(Debug, Default)]
struct ScriptState {
    directed: Vec<DirectedTarget>,
    vouched: HashMap<TargetPath, BTreeMap<AuthorityName, TargetFileInfo>>,
    refresh_failures: HashMap<AuthorityName, String>,
    consensus_failures: HashMap<TargetPath, String>,
    download_failures: HashMap<TargetPath, Vec<(String, String)>>,
    payloads: HashMap<TargetPath, Vec<u8>>,
    refreshed: Vec<AuthorityName>,
}

/// Scriptable stand-in for the repository-metadata trust client
#[derive(Debug, Default)]
pub struct ScriptedTrustClient {
    state: Mutex<ScriptState>,
}

impl ScriptedTrustClient {
    /// Empty script: no directed targets, everything reachable
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the Director's targets declaration
    pub fn direct(&self, target: DirectedTarget) {
        self.state.lock().directed.push(target);
    }

    /// Record one authority's fileinfo for a target path
    pub fn vouch(&self, filepath: TargetPath, authority: AuthorityName, fileinfo: TargetFileInfo) {
        self.state
            .lock()
            .vouched
            .entry(filepath)
            .or_default()
            .insert(authority, fileinfo);
    }

    /// Make refresh fail for one authority
    pub fn fail_refresh(&self, authority: AuthorityName, reason: impl Into<String>) {
        self.state.lock().refresh_failures.insert(authority, reason.into());
    }

    /// Force consensus resolution to fail for a path regardless of vouching
    pub fn fail_consensus(&self, filepath: TargetPath, reason: impl Into<String>) {
        self.state.lock().consensus_failures.insert(filepath, reason.into());
    }

    /// Make every mirror fail for a path's download
    pub fn fail_download(&self, filepath: TargetPath, per_mirror: Vec<(String, String)>) {
        self.state.lock().download_failures.insert(filepath, per_mirror);
    }

    /// Bytes to deposit when a path downloads successfully
    pub fn payload(&self, filepath: TargetPath, bytes: Vec<u8>) {
        self.state.lock().payloads.insert(filepath, bytes);
    }

    /// Authorities refreshed so far, in call order
    pub fn refresh_log(&self) -> Vec<AuthorityName> {
        self.state.lock().refreshed.clone()
    }
}

#[async_trait]
impl MetadataTrustEffects for ScriptedTrustClient {
    async fn refresh(&self, authority: &AuthorityName) -> Result<(), MetadataTrustError> {
        let mut state = self.state.lock();
        state.refreshed.push(authority.clone());

        match state.refresh_failures.get(authority) {
            Some(reason) => Err(MetadataTrustError::ExpiredOrUnreachable {
                authority: authority.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn directed_targets(
        &self,
        _role: &str,
        _authority: &AuthorityName,
    ) -> Result<Vec<DirectedTarget>, MetadataTrustError> {
        Ok(self.state.lock().directed.clone())
    }

    async fn resolve_consensus(
        &self,
        filepath: &TargetPath,
    ) -> Result<BTreeMap<AuthorityName, TargetFileInfo>, MetadataTrustError> {
        let state = self.state.lock();

        if let Some(reason) = state.consensus_failures.get(filepath) {
            return Err(MetadataTrustError::ConsensusRejected {
                filepath: filepath.clone(),
                reason: reason.clone(),
            });
        }

        let vouched = state.vouched.get(filepath).ok_or_else(|| {
            MetadataTrustError::ConsensusRejected {
                filepath: filepath.clone(),
                reason: "no authority lists this target".to_string(),
            }
        })?;

        // The real client only returns a map when every required authority
        // agrees; emulate that by rejecting any pairwise disagreement.
        let mut entries = vouched.iter();
        if let Some((_, first)) = entries.next() {
            for (authority, fileinfo) in entries {
                if !fileinfo.matches_consensus(first) {
                    return Err(MetadataTrustError::ConsensusRejected {
                        filepath: filepath.clone(),
                        reason: format!("authority {authority} disagrees on hash or length"),
                    });
                }
            }
        }

        Ok(vouched.clone())
    }

    async fn download(
        &self,
        filepath: &TargetPath,
        _fileinfo: &TargetFileInfo,
        dest_dir: &Path,
    ) -> Result<(), MetadataTrustError> {
        let bytes = {
            let state = self.state.lock();

            if let Some(per_mirror) = state.download_failures.get(filepath) {
                return Err(MetadataTrustError::MirrorFailure {
                    filepath: filepath.clone(),
                    per_mirror: per_mirror.clone(),
                });
            }

            state
                .payloads
                .get(filepath)
                .cloned()
                .unwrap_or_else(|| b"image-bytes".to_vec())
        };

        let dest = dest_dir.join(filepath.as_str());
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MetadataTrustError::MirrorFailure {
                filepath: filepath.clone(),
                per_mirror: vec![("local".to_string(), e.to_string())],
            })?;
        }
        std::fs::write(&dest, bytes).map_err(|e| MetadataTrustError::MirrorFailure {
            filepath: filepath.clone(),
            per_mirror: vec![("local".to_string(), e.to_string())],
        })?;

        Ok(())
    }
}
