//! Distribution artifact construction and atomic swap
//!
//! Secondaries fetch two artifacts from the Primary: a full archive of
//! every authority's current role metadata (for full-verification clients)
//! and the Director's targets file alone (for partial-verification
//! clients). Requests arrive asynchronously with respect to rebuilds, so
//! each artifact is built at a co-located temporary path and moved into
//! place with a same-volume rename; a reader sees the old complete file or
//! the new complete file, never a truncated one.

use crate::config::PrimaryConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tandem_core::AuthorityName;
use tracing::{debug, info};

/// Error type for artifact publication
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A file with an unexpected extension (or a non-file entry) sits in a
    /// metadata `current` directory — evidence the local store is corrupted
    /// or tampered with, so nothing is shipped
    #[error("unexpected entry in local metadata store: {path} (expecting only .{expected} role files)")]
    ForeignFileInStore {
        /// The offending entry
        path: PathBuf,
        /// The extension every role file must carry
        expected: String,
    },

    /// The Director's targets role file is missing from the local store
    #[error("director targets file missing at {path}")]
    DirectorTargetsMissing {
        /// Where the file was expected
        path: PathBuf,
    },

    /// Filesystem failure while building or swapping an artifact
    #[error("publication I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for the two distribution artifacts
#[derive(Debug)]
pub struct Publisher {
    metadata_root: PathBuf,
    director: AuthorityName,
    metadata_extension: String,
    archive_tmp: PathBuf,
    archive_path: PathBuf,
    partial_tmp: PathBuf,
    partial_path: PathBuf,
}

impl Publisher {
    /// Derive all artifact paths from the client configuration
    pub fn new(config: &PrimaryConfig) -> Self {
        let metadata_root = config.metadata_root();
        let extension = config.wire_format.metadata_extension();

        Self {
            director: config.director.clone(),
            metadata_extension: extension.to_string(),
            archive_tmp: metadata_root.join("temp_full_metadata_archive.tar"),
            archive_path: metadata_root.join("full_metadata_archive.tar"),
            partial_tmp: metadata_root.join(format!("temp_director_targets.{extension}")),
            partial_path: metadata_root.join(format!("director_targets.{extension}")),
            metadata_root,
        }
    }

    /// Published path of the full metadata archive
    ///
    /// Does not exist until the first successful cycle completes.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Published path of the Director-targets-only file
    ///
    /// Does not exist until the first successful cycle completes.
    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    /// Rebuild both artifacts and swap them into place
    ///
    /// Both are staged fully before either rename, so a failure while
    /// staging leaves the previously published generation untouched.
    pub fn publish(&self) -> Result<(), PublishError> {
        fs::create_dir_all(&self.metadata_root)?;
        self.build_archive()?;
        self.stage_partial()?;

        fs::rename(&self.archive_tmp, &self.archive_path)?;
        fs::rename(&self.partial_tmp, &self.partial_path)?;

        info!(
            archive = %self.archive_path.display(),
            partial = %self.partial_path.display(),
            "distribution artifacts published"
        );
        Ok(())
    }

    /// Archive every authority's current role files at the temporary path
    ///
    /// Entries are laid out as `<authority>/metadata/<role file>` so an
    /// expanded archive resembles repository structure rather than this
    /// client's directory layout.
    fn build_archive(&self) -> Result<(), PublishError> {
        let file = fs::File::create(&self.archive_tmp)?;
        let mut archive = tar::Builder::new(file);

        let mut authority_dirs: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&self.metadata_root)? {
            let path = entry?.path();
            if path.is_dir() {
                authority_dirs.push(path);
            }
        }
        authority_dirs.sort();

        for authority_dir in authority_dirs {
            let current = authority_dir.join("current");
            if !current.is_dir() {
                continue;
            }

            let authority = authority_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut role_files: Vec<PathBuf> = Vec::new();
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();

                let well_formed = entry.file_type()?.is_file()
                    && path.extension().and_then(|e| e.to_str())
                        == Some(self.metadata_extension.as_str());
                if !well_formed {
                    return Err(PublishError::ForeignFileInStore {
                        path,
                        expected: self.metadata_extension.clone(),
                    });
                }

                role_files.push(path);
            }
            role_files.sort();

            for path in role_files {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                archive.append_path_with_name(&path, format!("{authority}/metadata/{file_name}"))?;
            }

            debug!(%authority, "authority metadata archived");
        }

        archive.into_inner()?.sync_all()?;
        Ok(())
    }

    /// Copy the Director's targets role file to the partial temporary path
    fn stage_partial(&self) -> Result<(), PublishError> {
        let source = self
            .metadata_root
            .join(self.director.as_str())
            .join("current")
            .join(format!("targets.{}", self.metadata_extension));

        if !source.is_file() {
            return Err(PublishError::DirectorTargetsMissing { path: source });
        }

        fs::copy(&source, &self.partial_tmp)?;
        Ok(())
    }
}
