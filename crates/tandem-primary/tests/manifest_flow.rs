//! ECU report registration and vehicle manifest production

mod common;

use assert_matches::assert_matches;
use common::{harness, PRIMARY_ECU, VIN};
use tandem_attest::verify_entry;
use tandem_core::{EcuSerial, Nonce, Vin};
use tandem_primary::RegistrationError;
use tandem_testkit::{signed_ecu_report, KeyFixture};

#[tokio::test]
async fn test_manifest_covers_all_buffered_reports_and_drains() {
    let h = harness();
    let ecu_a = EcuSerial::new("ecuA");
    let ecu_b = EcuSerial::new("ecuB");
    h.primary.register_secondary(ecu_a.clone());
    h.primary.register_secondary(ecu_b.clone());

    let vin = Vin::new(VIN);
    let key_a = KeyFixture::from_seed_string("secondary-a");
    let key_b = KeyFixture::from_seed_string("secondary-b");

    // Two reports from A and one from B; per-ECU order must survive.
    for nonce in [1, 2] {
        h.primary
            .register_ecu_report(
                &vin,
                &ecu_a,
                Nonce::new(nonce),
                signed_ecu_report(&key_a, &h.codec, &ecu_a, ""),
            )
            .unwrap();
    }
    h.primary
        .register_ecu_report(
            &vin,
            &ecu_b,
            Nonce::new(3),
            signed_ecu_report(&key_b, &h.codec, &ecu_b, ""),
        )
        .unwrap();

    let manifest = h.primary.produce_vehicle_manifest().unwrap();

    assert_eq!(manifest.signed.vin, vin);
    assert_eq!(manifest.signed.primary_ecu_serial, EcuSerial::new(PRIMARY_ECU));
    assert_eq!(manifest.signed.report_count(), 3);
    assert_eq!(manifest.signed.ecu_version_reports[&ecu_a].len(), 2);

    // Signed by the Primary's key over the configured wire encoding.
    assert_eq!(manifest.signatures.len(), 1);
    verify_entry(
        &h.codec,
        &manifest,
        &manifest.signatures[0],
        &h.primary_key.verifying_key(),
    )
    .unwrap();

    // The buffer drained exactly once: an immediate second manifest is empty.
    let empty = h.primary.produce_vehicle_manifest().unwrap();
    assert!(empty.signed.is_empty());
}

#[tokio::test]
async fn test_report_for_a_different_vehicle_is_rejected() {
    let h = harness();
    let ecu = EcuSerial::new("ecuA");
    h.primary.register_secondary(ecu.clone());

    let key = KeyFixture::from_seed_string("secondary-a");
    let result = h.primary.register_ecu_report(
        &Vin::new("someone-elses-vin"),
        &ecu,
        Nonce::new(1),
        signed_ecu_report(&key, &h.codec, &ecu, ""),
    );

    assert_matches!(result, Err(RegistrationError::UnknownVehicle { .. }));
    assert!(h.primary.produce_vehicle_manifest().unwrap().signed.is_empty());
}

#[tokio::test]
async fn test_report_from_unregistered_ecu_is_rejected() {
    let h = harness();
    let ghost = EcuSerial::new("ghost");

    let key = KeyFixture::from_seed_string("ghost-key");
    let result = h.primary.register_ecu_report(
        &Vin::new(VIN),
        &ghost,
        Nonce::new(1),
        signed_ecu_report(&key, &h.codec, &ghost, ""),
    );

    assert_matches!(result, Err(RegistrationError::UnknownEcu(_)));
}

#[tokio::test]
async fn test_transport_identity_mismatch_is_spoofing() {
    let h = harness();
    let ecu_a = EcuSerial::new("ecuA");
    let ecu_b = EcuSerial::new("ecuB");
    h.primary.register_secondary(ecu_a.clone());
    h.primary.register_secondary(ecu_b.clone());

    let key = KeyFixture::from_seed_string("secondary-b");
    // Arrives over A's transport channel but the signed payload says B.
    let result = h.primary.register_ecu_report(
        &Vin::new(VIN),
        &ecu_a,
        Nonce::new(1),
        signed_ecu_report(&key, &h.codec, &ecu_b, ""),
    );

    assert_matches!(
        result,
        Err(RegistrationError::Spoofing { transport, signed })
            if transport == ecu_a && signed == ecu_b
    );
}

#[tokio::test]
async fn test_self_reported_attacks_are_accepted_not_filtered() {
    let h = harness();
    let ecu = EcuSerial::new("ecuA");
    h.primary.register_secondary(ecu.clone());

    let key = KeyFixture::from_seed_string("secondary-a");
    h.primary
        .register_ecu_report(
            &Vin::new(VIN),
            &ecu,
            Nonce::new(1),
            signed_ecu_report(&key, &h.codec, &ecu, "rollback attempt observed"),
        )
        .unwrap();

    let manifest = h.primary.produce_vehicle_manifest().unwrap();
    assert_eq!(
        manifest.signed.ecu_version_reports[&ecu][0].signed.attacks_detected,
        "rollback attempt observed"
    );
}

#[tokio::test]
async fn test_undecodable_report_bytes_are_malformed() {
    let h = harness();
    let ecu = EcuSerial::new("ecuA");
    h.primary.register_secondary(ecu.clone());

    let result = h.primary.register_ecu_report_bytes(
        &Vin::new(VIN),
        &ecu,
        Nonce::new(1),
        b"\xff not a signed report",
    );

    assert_matches!(result, Err(RegistrationError::MalformedReport(_)));
}

#[tokio::test]
async fn test_report_nonces_feed_the_next_rotation_once() {
    let h = harness();
    let ecu = EcuSerial::new("ecuA");
    h.primary.register_secondary(ecu.clone());

    let key = KeyFixture::from_seed_string("secondary-a");
    for _ in 0..2 {
        // The same nonce resubmitted is tracked once.
        h.primary
            .register_ecu_report(
                &Vin::new(VIN),
                &ecu,
                Nonce::new(42),
                signed_ecu_report(&key, &h.codec, &ecu, ""),
            )
            .unwrap();
    }

    let rotated = h.primary.rotate_nonces();
    assert_eq!(rotated.len(), 1);
    assert!(rotated.contains(&Nonce::new(42)));

    // Rotation is a partition: nothing pending afterwards.
    assert!(h.primary.rotate_nonces().is_empty());
}
