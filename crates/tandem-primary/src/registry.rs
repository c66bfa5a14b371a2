//! Secondary registration and assignment state
//!
//! The registry is the membership authority inside the Primary: nothing —
//! not a manifest, not an assignment, not a query — is accepted for an ECU
//! that has not been registered first. Assignments live here too so that a
//! single lock covers the registered-set check and the assignment write.

use crate::consensus::ConsensusTargetInfo;
use indexmap::IndexSet;
use std::collections::HashMap;
use tandem_core::EcuSerial;

/// Error type for Secondary-facing queries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The queried ECU is not a registered Secondary of this Primary
    #[error("ECU {0} is not a registered secondary of this primary")]
    UnknownEcu(EcuSerial),
}

/// Known Secondaries and their currently assigned targets
#[derive(Debug, Default)]
pub struct SecondaryRegistry {
    secondaries: IndexSet<EcuSerial>,
    assigned: HashMap<EcuSerial, ConsensusTargetInfo>,
}

impl SecondaryRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Secondary; returns false if it was already known
    ///
    /// Re-registering is a no-op, never an error: in a vehicle, Secondaries
    /// re-announce themselves after every power cycle.
    pub fn register(&mut self, ecu: EcuSerial) -> bool {
        self.secondaries.insert(ecu)
    }

    /// Whether the ECU has been registered
    pub fn is_registered(&self, ecu: &EcuSerial) -> bool {
        self.secondaries.contains(ecu)
    }

    /// Number of registered Secondaries
    pub fn secondary_count(&self) -> usize {
        self.secondaries.len()
    }

    /// Record a validated assignment, replacing any prior one for that ECU
    pub fn assign(&mut self, info: ConsensusTargetInfo) -> Option<ConsensusTargetInfo> {
        self.assigned.insert(info.assigned_ecu().clone(), info)
    }

    /// The current assignment for an ECU, if any
    pub fn assignment(&self, ecu: &EcuSerial) -> Option<&ConsensusTargetInfo> {
        self.assigned.get(ecu)
    }

    /// Whether the Director has assigned an update to the ECU
    pub fn has_assignment(&self, ecu: &EcuSerial) -> Result<bool, QueryError> {
        if !self.is_registered(ecu) {
            return Err(QueryError::UnknownEcu(ecu.clone()));
        }

        Ok(self.assigned.contains_key(ecu))
    }
}
