//! The update cycle state machine
//!
//! One invocation drives a full pass: refresh every authority's metadata,
//! enumerate the Director's instructions, validate each against the full
//! authority set, assign validated targets to registered Secondaries,
//! download, and republish distribution artifacts. Per-target failures of
//! the expected adversarial kinds (consensus rejection, mirror failure,
//! unknown assignee) are logged and skipped; policy violations and local
//! store corruption abort the cycle.

use crate::consensus::{validate_directed_target, ConsensusError};
use crate::primary::Primary;
use crate::publish::PublishError;
use std::path::{Component, Path, PathBuf};
use tandem_core::effects::{MetadataTrustEffects, MetadataTrustError};
use tandem_core::{AuthorityName, EcuSerial, TargetPath};
use tracing::{debug, info, warn};

/// Error type for a failed update cycle
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// Another cycle is still running; concurrent cycles are not supported
    #[error("an update cycle is already in progress")]
    CycleInProgress,

    /// Top-level metadata for an authority could not be refreshed
    #[error("failed to refresh metadata for {authority}")]
    Refresh {
        /// The authority whose refresh failed
        authority: AuthorityName,
        /// The trust client's failure
        #[source]
        source: MetadataTrustError,
    },

    /// The Director's targets declaration could not be read
    #[error("could not enumerate director targets")]
    Enumerate(#[source] MetadataTrustError),

    /// A fatal policy violation from consensus validation
    #[error(transparent)]
    Policy(ConsensusError),

    /// A directed path would resolve outside the targets directory
    #[error("directed path {filepath} escapes the targets directory")]
    PathEscape {
        /// The offending directed path
        filepath: TargetPath,
    },

    /// Distribution artifacts could not be rebuilt or swapped
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Filesystem failure preparing the targets directory
    #[error("could not prepare targets directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of one completed update cycle
///
/// "Assigned" and "downloaded" are deliberately independent: an entry in
/// `download_failures` still has its assignment recorded, and a Secondary
/// asking about it will see "update assigned" with no bytes on disk yet.
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    /// Number of targets the Director directed this cycle
    pub directed: usize,

    /// Targets validated by all required authorities and assigned
    pub validated: Vec<TargetPath>,

    /// Targets skipped because multi-authority consensus failed
    pub consensus_rejected: Vec<TargetPath>,

    /// Targets skipped because the assignee is not a registered Secondary
    pub unknown_assignee: Vec<(TargetPath, EcuSerial)>,

    /// Targets whose images were downloaded and verified
    pub downloaded: Vec<TargetPath>,

    /// Targets assigned but not retrievable from any mirror
    pub download_failures: Vec<(TargetPath, String)>,
}

impl<M: MetadataTrustEffects> Primary<M> {
    /// Run one full update cycle
    ///
    /// Fails fast on refresh errors, policy violations, path containment
    /// violations, and publication errors; continues past per-target
    /// consensus rejections, unknown assignees, and download failures.
    /// Publication runs unconditionally at the end of a surviving cycle so
    /// Secondaries always see the latest validated Director metadata.
    pub async fn run_update_cycle(&self) -> Result<CycleReport, CycleError> {
        let _cycle = self
            .cycle_guard
            .try_lock()
            .map_err(|_| CycleError::CycleInProgress)?;

        let director = self.config().director.clone();
        let mut report = CycleReport::default();

        // Refresh the Director first, then every other authority.
        debug!("refreshing top-level metadata for all authorities");
        self.trust
            .refresh(&director)
            .await
            .map_err(|source| CycleError::Refresh {
                authority: director.clone(),
                source,
            })?;

        for authority in &self.config().authorities {
            if *authority == director {
                continue;
            }
            self.trust
                .refresh(authority)
                .await
                .map_err(|source| CycleError::Refresh {
                    authority: authority.clone(),
                    source,
                })?;
        }

        let directed = self
            .trust
            .directed_targets("targets", &director)
            .await
            .map_err(CycleError::Enumerate)?;
        report.directed = directed.len();

        if directed.is_empty() {
            info!("director reports no updates to install for this vehicle");
        } else {
            info!(
                count = directed.len(),
                targets = ?directed.iter().map(|t| t.filepath.as_str()).collect::<Vec<_>>(),
                "director directs updates for this vehicle"
            );
        }

        let targets_dir = self.config().targets_dir();
        std::fs::create_dir_all(&targets_dir)?;

        for target in &directed {
            let validated = match validate_directed_target(&self.trust, &director, target).await {
                Ok(validated) => validated,
                Err(error) if error.is_recoverable() => {
                    warn!(
                        filepath = %target.filepath,
                        %error,
                        "directed target failed multi-authority validation; skipping"
                    );
                    report.consensus_rejected.push(target.filepath.clone());
                    continue;
                }
                Err(policy) => return Err(CycleError::Policy(policy)),
            };

            let ecu = validated.assigned_ecu().clone();
            if !self.registry.lock().is_registered(&ecu) {
                warn!(
                    filepath = %validated.filepath(),
                    %ecu,
                    "director assigned a target to an ECU unknown to this primary; disregarding"
                );
                report
                    .unknown_assignee
                    .push((validated.filepath().clone(), ecu));
                continue;
            }

            let resolved = contained_target_path(&targets_dir, validated.filepath())
                .ok_or_else(|| CycleError::PathEscape {
                    filepath: validated.filepath().clone(),
                })?;
            debug!(%ecu, image = %resolved.display(), "target contained within the targets directory");

            self.registry.lock().assign(validated.clone());
            report.validated.push(validated.filepath().clone());

            match self
                .trust
                .download(validated.filepath(), validated.fileinfo(), &targets_dir)
                .await
            {
                Ok(()) => {
                    info!(filepath = %validated.filepath(), "downloaded trustworthy image");
                    report.downloaded.push(validated.filepath().clone());
                }
                Err(error) => {
                    warn!(
                        filepath = %validated.filepath(),
                        %error,
                        "no mirror provided a trustworthy image; assignment retained without bytes"
                    );
                    report
                        .download_failures
                        .push((validated.filepath().clone(), error.to_string()));
                }
            }
        }

        // Publish even when every target was skipped: Secondaries must see
        // the latest validated Director targets metadata promptly.
        self.publisher.publish()?;

        info!(
            directed = report.directed,
            validated = report.validated.len(),
            downloaded = report.downloaded.len(),
            "update cycle complete"
        );
        Ok(report)
    }
}

/// Resolve a directed path inside the targets directory, or refuse
///
/// Purely lexical: only plain components are accepted, so `..`, absolute
/// paths, and drive prefixes can never step outside `targets_dir` no matter
/// what the Director signed.
pub(crate) fn contained_target_path(targets_dir: &Path, filepath: &TargetPath) -> Option<PathBuf> {
    let mut resolved = targets_dir.to_path_buf();
    let mut any_component = false;

    for component in Path::new(filepath.as_str()).components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                any_component = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    any_component.then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jail() -> PathBuf {
        PathBuf::from("/var/lib/tandem/targets")
    }

    #[test]
    fn test_plain_relative_paths_resolve_inside_the_jail() {
        let resolved = contained_target_path(&jail(), &TargetPath::new("pkg/v2.bin")).unwrap();
        assert_eq!(resolved, jail().join("pkg/v2.bin"));
    }

    #[test]
    fn test_parent_traversal_is_refused() {
        assert!(contained_target_path(&jail(), &TargetPath::new("../../etc/passwd")).is_none());
        assert!(contained_target_path(&jail(), &TargetPath::new("pkg/../../../etc/passwd")).is_none());
    }

    #[test]
    fn test_absolute_paths_are_refused() {
        assert!(contained_target_path(&jail(), &TargetPath::new("/etc/passwd")).is_none());
    }

    #[test]
    fn test_empty_and_dot_only_paths_are_refused() {
        assert!(contained_target_path(&jail(), &TargetPath::new("")).is_none());
        assert!(contained_target_path(&jail(), &TargetPath::new("./.")).is_none());
    }
}
