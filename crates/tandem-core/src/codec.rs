//! Wire codec for signed structures and role metadata
//!
//! The deployment chooses one encoding at startup — human-readable JSON or
//! compact DAG-CBOR — and every signed payload, ECU report, and published
//! metadata file uses that one format. This module is the only place the
//! format branch exists; everything else goes through [`Codec`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Encoding used for signed payloads and role metadata files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireFormat {
    /// Human-readable JSON
    #[default]
    Json,
    /// Canonical DAG-CBOR
    DagCbor,
}

impl WireFormat {
    /// File extension used for role metadata files in this format
    pub fn metadata_extension(&self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::DagCbor => "cbor",
        }
    }
}

/// Unified error type for codec operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(String),

    /// DAG-CBOR encoding/decoding error
    #[error("DAG-CBOR error: {0}")]
    DagCbor(String),
}

/// Configured encoder/decoder pair
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    format: WireFormat,
}

impl Codec {
    /// Create a codec for the given wire format
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    /// The configured wire format
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Encode any serde-compatible value to bytes in the configured format
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self.format {
            WireFormat::Json => {
                serde_json::to_vec(value).map_err(|e| CodecError::Json(e.to_string()))
            }
            WireFormat::DagCbor => {
                serde_ipld_dagcbor::to_vec(value).map_err(|e| CodecError::DagCbor(e.to_string()))
            }
        }
    }

    /// Decode bytes in the configured format to any serde-compatible value
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self.format {
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| CodecError::Json(e.to_string()))
            }
            WireFormat::DagCbor => {
                serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::DagCbor(e.to_string()))
            }
        }
    }
}
