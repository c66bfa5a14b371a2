//! Primary client configuration
//!
//! One TOML file (or an in-code literal in tests) fixes the client
//! directory layout, the vehicle identity, the authority set, and the wire
//! format for the life of the process. The Director must appear in the
//! authority list — a Director that is not party to consensus is a policy
//! misconfiguration caught here rather than mid-cycle.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tandem_core::{AuthorityName, EcuSerial, Vin, WireFormat};

/// Error type for configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("could not read config file {path}: {source}")]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("could not parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// The configuration is structurally valid but semantically wrong
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration
        reason: String,
    },
}

/// Static configuration for one Primary client instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryConfig {
    /// Root directory for all client state (metadata stores, images,
    /// distribution artifacts)
    pub client_dir: PathBuf,

    /// This vehicle's identifier
    pub vin: Vin,

    /// This Primary's own ECU serial
    pub primary_ecu_serial: EcuSerial,

    /// The authority whose targets declaration drives update cycles
    pub director: AuthorityName,

    /// Every authority the trust policy knows, Director included
    pub authorities: Vec<AuthorityName>,

    /// Wire format for signed payloads and role metadata files
    #[serde(default)]
    pub wire_format: WireFormat,
}

impl PrimaryConfig {
    /// Load and validate a configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate identifier and authority-set consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vin.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "vin must not be empty".to_string(),
            });
        }

        if self.primary_ecu_serial.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "primary_ecu_serial must not be empty".to_string(),
            });
        }

        if self.authorities.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "at least one authority must be configured".to_string(),
            });
        }

        if !self.authorities.contains(&self.director) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "director authority {} is not in the configured authority list",
                    self.director
                ),
            });
        }

        Ok(())
    }

    /// Root of the per-authority metadata stores
    pub fn metadata_root(&self) -> PathBuf {
        self.client_dir.join("metadata")
    }

    /// The `current` role-file directory for one authority
    pub fn authority_current_dir(&self, authority: &AuthorityName) -> PathBuf {
        self.metadata_root().join(authority.as_str()).join("current")
    }

    /// Directory downloaded images land in
    pub fn targets_dir(&self) -> PathBuf {
        self.client_dir.join("targets")
    }
}
