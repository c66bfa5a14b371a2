//! Shared harness for Primary integration tests

// Each test binary uses its own subset of the harness.
#![allow(dead_code)]

use std::sync::Arc;
use tandem_core::{AuthorityName, Codec, EcuSerial, Vin, WireFormat};
use tandem_primary::{Primary, PrimaryConfig};
use tandem_testkit::{seed_metadata_store, KeyFixture, ScriptedTrustClient};
use tempfile::TempDir;

pub const VIN: &str = "vin11111";
pub const PRIMARY_ECU: &str = "primary-ecu";

pub fn director() -> AuthorityName {
    AuthorityName::new("director")
}

pub fn image_repo() -> AuthorityName {
    AuthorityName::new("image-repo")
}

pub struct Harness {
    // Held for the lifetime of the test so the client directory survives.
    #[allow(dead_code)]
    pub dir: TempDir,
    pub trust: Arc<ScriptedTrustClient>,
    pub primary: Primary<Arc<ScriptedTrustClient>>,
    pub primary_key: KeyFixture,
    pub timeserver: KeyFixture,
    pub codec: Codec,
}

pub fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let dir = tempfile::tempdir().unwrap();

    let config = PrimaryConfig {
        client_dir: dir.path().to_path_buf(),
        vin: Vin::new(VIN),
        primary_ecu_serial: EcuSerial::new(PRIMARY_ECU),
        director: director(),
        authorities: vec![director(), image_repo()],
        wire_format: WireFormat::Json,
    };

    // The trust client would normally populate this on refresh; seed it so
    // publication has role files to ship.
    seed_metadata_store(&config.metadata_root(), &config.authorities, "json");

    let trust = Arc::new(ScriptedTrustClient::new());
    let primary_key = KeyFixture::from_seed_string("primary-signing-key");
    let timeserver = KeyFixture::from_seed_string("timeserver-key");

    let primary = Primary::new(
        config,
        Arc::clone(&trust),
        primary_key.signer(),
        timeserver.verifying_key(),
    )
    .unwrap();

    Harness {
        dir,
        trust,
        primary,
        primary_key,
        timeserver,
        codec: Codec::new(WireFormat::Json),
    }
}
