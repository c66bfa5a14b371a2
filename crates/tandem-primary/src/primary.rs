//! The long-lived Primary instance
//!
//! One `Primary` owns every piece of shared state for the process lifetime:
//! the Secondary registry and assignments, the ECU report buffer, and the
//! freshness protocol, each behind its own lock. Secondary-facing calls and
//! the update cycle run concurrently; no method here awaits the network
//! while holding a state lock.

use crate::config::{ConfigError, PrimaryConfig};
use crate::freshness::{ClockHandle, FreshnessProtocol, TimeVerifyError};
use crate::manifest::{ManifestBuffer, RegistrationError};
use crate::publish::Publisher;
use crate::registry::{QueryError, SecondaryRegistry};
use ed25519_dalek::VerifyingKey;
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::path::PathBuf;
use tandem_attest::{
    Ed25519Signer, SignedEcuReport, SignedTimeAttestation, SignedVehicleManifest, VehicleManifest,
};
use tandem_core::effects::MetadataTrustEffects;
use tandem_core::{Codec, CodecError, EcuSerial, Nonce, VehicleIdentity, Vin};
use tracing::{debug, info, warn};

/// Primary ECU update client
///
/// Generic over the metadata trust client so deployments can plug in their
/// repository implementation and tests can script one.
pub struct Primary<M> {
    identity: VehicleIdentity,
    config: PrimaryConfig,
    codec: Codec,
    pub(crate) trust: M,
    signer: Ed25519Signer,
    pub(crate) registry: Mutex<SecondaryRegistry>,
    manifests: Mutex<ManifestBuffer>,
    freshness: Mutex<FreshnessProtocol>,
    pub(crate) publisher: Publisher,
    pub(crate) cycle_guard: tokio::sync::Mutex<()>,
    clock: ClockHandle,
}

impl<M: MetadataTrustEffects> Primary<M> {
    /// Build a Primary from validated configuration
    pub fn new(
        config: PrimaryConfig,
        trust: M,
        signer: Ed25519Signer,
        timeserver_key: VerifyingKey,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let codec = Codec::new(config.wire_format);
        let clock = ClockHandle::default();
        let identity = VehicleIdentity::new(config.vin.clone(), config.primary_ecu_serial.clone());
        let publisher = Publisher::new(&config);

        info!(
            vin = %identity.vin(),
            primary_ecu = %identity.primary_ecu(),
            director = %config.director,
            "primary initialized"
        );

        Ok(Self {
            identity,
            codec,
            trust,
            signer,
            registry: Mutex::new(SecondaryRegistry::new()),
            manifests: Mutex::new(ManifestBuffer::new()),
            freshness: Mutex::new(FreshnessProtocol::new(codec, timeserver_key, clock.clone())),
            publisher,
            cycle_guard: tokio::sync::Mutex::new(()),
            clock,
            config,
        })
    }

    /// This Primary's vehicle identity
    pub fn identity(&self) -> &VehicleIdentity {
        &self.identity
    }

    /// The static configuration the Primary was built from
    pub fn config(&self) -> &PrimaryConfig {
        &self.config
    }

    /// The wire codec selected by configuration
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Clock-override handle for expiry evaluation
    ///
    /// Share a clone with whatever checks metadata expiry; it reads the last
    /// verified Timeserver time.
    pub fn clock(&self) -> ClockHandle {
        self.clock.clone()
    }

    // === Secondary-facing interface ===

    /// Register a Secondary ECU; re-registration is a no-op
    pub fn register_secondary(&self, ecu: EcuSerial) {
        let newly_added = self.registry.lock().register(ecu.clone());
        if newly_added {
            debug!(%ecu, "registered new secondary");
        } else {
            debug!(%ecu, "secondary already registered");
        }
    }

    /// Whether the Director has assigned an update to the ECU
    pub fn has_assignment(&self, ecu: &EcuSerial) -> Result<bool, QueryError> {
        self.registry.lock().has_assignment(ecu)
    }

    /// Local path of the image assigned to the ECU, if any
    ///
    /// An assignment may exist while its download has failed; callers must
    /// treat "assigned" and "bytes on disk" as independent facts.
    pub fn resolve_image_path(&self, ecu: &EcuSerial) -> Result<Option<PathBuf>, QueryError> {
        let registry = self.registry.lock();
        if !registry.is_registered(ecu) {
            return Err(QueryError::UnknownEcu(ecu.clone()));
        }

        Ok(registry.assignment(ecu).and_then(|info| {
            crate::cycle::contained_target_path(&self.config.targets_dir(), info.filepath())
        }))
    }

    /// Published path of the full metadata archive
    ///
    /// The file does not exist before the first successful update cycle.
    pub fn full_metadata_archive_path(&self) -> PathBuf {
        self.publisher.archive_path().to_path_buf()
    }

    /// Published path of the Director-targets-only metadata file
    ///
    /// The file does not exist before the first successful update cycle.
    pub fn partial_metadata_path(&self) -> PathBuf {
        self.publisher.partial_path().to_path_buf()
    }

    /// The most recent verified Timeserver attestation, if any
    pub fn latest_time_attestation(&self) -> Option<SignedTimeAttestation> {
        self.freshness
            .lock()
            .latest()
            .map(|verified| verified.attestation.clone())
    }

    /// Accept a Secondary's signed version report
    ///
    /// The Secondary's signature is not verified here: bogus reports from a
    /// compromised ECU are evidence the Director wants to see, so everything
    /// well-formed from a registered ECU of this vehicle is buffered. The
    /// transport identity must match the identity inside the signed payload,
    /// which stops one Secondary impersonating another at the transport
    /// layer.
    pub fn register_ecu_report(
        &self,
        vin: &Vin,
        ecu: &EcuSerial,
        nonce: Nonce,
        report: SignedEcuReport,
    ) -> Result<(), RegistrationError> {
        if !self.registry.lock().is_registered(ecu) {
            return Err(RegistrationError::UnknownEcu(ecu.clone()));
        }

        if vin != self.identity.vin() {
            return Err(RegistrationError::UnknownVehicle {
                claimed: vin.clone(),
                ours: self.identity.vin().clone(),
            });
        }

        if report.signed.ecu_serial != *ecu {
            return Err(RegistrationError::Spoofing {
                transport: ecu.clone(),
                signed: report.signed.ecu_serial.clone(),
            });
        }

        if report.signed.reports_attacks() {
            warn!(
                %ecu,
                attacks = %report.signed.attacks_detected,
                "secondary reports detected attacks; forwarding to director unfiltered"
            );
        }

        self.manifests.lock().append(ecu.clone(), report);
        self.freshness.lock().note_nonce(nonce);
        debug!(%ecu, %nonce, "buffered ECU report");

        Ok(())
    }

    /// Accept a Secondary's report from its wire encoding
    pub fn register_ecu_report_bytes(
        &self,
        vin: &Vin,
        ecu: &EcuSerial,
        nonce: Nonce,
        report_bytes: &[u8],
    ) -> Result<(), RegistrationError> {
        let report: SignedEcuReport = self
            .codec
            .decode(report_bytes)
            .map_err(|e| RegistrationError::MalformedReport(e.to_string()))?;

        self.register_ecu_report(vin, ecu, nonce, report)
    }

    // === Driver-facing interface ===

    /// Rotate the nonce ledger for the next Timeserver request
    ///
    /// Returns the set to include in that request. Must be paired with the
    /// Timeserver round trip: rotating again before the response arrives
    /// replaces the outstanding set and orphans the in-flight request.
    pub fn rotate_nonces(&self) -> IndexSet<Nonce> {
        self.freshness.lock().rotate_nonces()
    }

    /// Verify a Timeserver response and advance the vehicle's trusted time
    pub fn submit_time_attestation(
        &self,
        attestation: SignedTimeAttestation,
    ) -> Result<(), TimeVerifyError> {
        self.freshness.lock().verify_attestation(attestation)
    }

    /// Sign a vehicle manifest over everything buffered, then drain the
    /// buffer
    ///
    /// The buffer lock is held across signing so a report arriving
    /// mid-production lands cleanly in the next manifest instead of being
    /// drained unsigned; the buffer is cleared only after signing succeeds.
    pub fn produce_vehicle_manifest(&self) -> Result<SignedVehicleManifest, CodecError> {
        let mut manifests = self.manifests.lock();

        let payload = VehicleManifest {
            vin: self.identity.vin().clone(),
            primary_ecu_serial: self.identity.primary_ecu().clone(),
            ecu_version_reports: manifests.snapshot(),
        };
        let report_count = payload.report_count();

        let signed = self.signer.sign(&self.codec, payload)?;
        manifests.clear();

        info!(report_count, "vehicle manifest produced and buffer drained");
        Ok(signed)
    }
}
