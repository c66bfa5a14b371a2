//! Timeserver round-trip scenarios

mod common;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use common::{harness, VIN};
use tandem_core::{EcuSerial, Nonce, Vin};
use tandem_primary::TimeVerifyError;
use tandem_testkit::{signed_ecu_report, signed_time_attestation, KeyFixture};

#[tokio::test]
async fn test_full_nonce_round_trip_updates_vehicle_time() {
    let h = harness();
    let ecu = EcuSerial::new("ecuA");
    h.primary.register_secondary(ecu.clone());

    let key = KeyFixture::from_seed_string("secondary-a");
    h.primary
        .register_ecu_report(
            &Vin::new(VIN),
            &ecu,
            Nonce::new(7),
            signed_ecu_report(&key, &h.codec, &ecu, ""),
        )
        .unwrap();

    let rotated = h.primary.rotate_nonces();
    assert!(rotated.contains(&Nonce::new(7)));

    let time = Utc.with_ymd_and_hms(2026, 8, 5, 9, 30, 0).unwrap();
    let attestation = signed_time_attestation(
        &h.timeserver,
        &h.codec,
        time,
        rotated.iter().copied().collect(),
    );

    h.primary.submit_time_attestation(attestation.clone()).unwrap();

    assert_eq!(h.primary.clock().now_override(), Some(time));
    assert_eq!(h.primary.latest_time_attestation(), Some(attestation));
}

#[tokio::test]
async fn test_attestation_omitting_an_issued_nonce_is_rejected() {
    let h = harness();
    let ecu = EcuSerial::new("ecuA");
    h.primary.register_secondary(ecu.clone());

    let key = KeyFixture::from_seed_string("secondary-a");
    for nonce in [7, 8] {
        h.primary
            .register_ecu_report(
                &Vin::new(VIN),
                &ecu,
                Nonce::new(nonce),
                signed_ecu_report(&key, &h.codec, &ecu, ""),
            )
            .unwrap();
    }
    h.primary.rotate_nonces();

    // Correctly signed, but echoes only one of the two outstanding nonces —
    // exactly what a replayed attestation looks like.
    let stale = signed_time_attestation(
        &h.timeserver,
        &h.codec,
        Utc.with_ymd_and_hms(2026, 8, 5, 9, 30, 0).unwrap(),
        vec![Nonce::new(7)],
    );

    let result = h.primary.submit_time_attestation(stale);

    assert_matches!(
        result,
        Err(TimeVerifyError::StaleOrMismatchedAttestation { missing })
            if missing == vec![Nonce::new(8)]
    );
    assert!(h.primary.latest_time_attestation().is_none());
    assert!(h.primary.clock().now_override().is_none());
}

#[tokio::test]
async fn test_attestation_signed_by_the_wrong_key_is_rejected() {
    let h = harness();

    let imposter = KeyFixture::from_seed_string("not-the-timeserver");
    let forged = signed_time_attestation(
        &imposter,
        &h.codec,
        Utc.with_ymd_and_hms(2026, 8, 5, 9, 30, 0).unwrap(),
        vec![],
    );

    assert_matches!(
        h.primary.submit_time_attestation(forged),
        Err(TimeVerifyError::InvalidSignature)
    );
    assert!(h.primary.latest_time_attestation().is_none());
}

#[tokio::test]
async fn test_attestation_with_no_outstanding_nonces_is_accepted() {
    let h = harness();

    // Nothing outstanding yet (e.g. first boot before any Secondary report):
    // nonce coverage is vacuously satisfied and the signature decides.
    let attestation = signed_time_attestation(
        &h.timeserver,
        &h.codec,
        Utc.with_ymd_and_hms(2026, 8, 5, 6, 0, 0).unwrap(),
        vec![],
    );

    h.primary.submit_time_attestation(attestation).unwrap();
    assert!(h.primary.latest_time_attestation().is_some());
}

#[tokio::test]
async fn test_verified_times_append_in_order() {
    let h = harness();

    let first = Utc.with_ymd_and_hms(2026, 8, 5, 6, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2026, 8, 5, 7, 0, 0).unwrap();

    for time in [first, second] {
        let attestation = signed_time_attestation(&h.timeserver, &h.codec, time, vec![]);
        h.primary.submit_time_attestation(attestation).unwrap();
    }

    // The latest verified attestation is current time for expiry checks.
    assert_eq!(h.primary.clock().now_override(), Some(second));
    assert_eq!(
        h.primary.latest_time_attestation().unwrap().signed.time,
        second
    );
}
