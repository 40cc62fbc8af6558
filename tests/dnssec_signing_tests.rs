//! Sign/verify round trips through the signature engine across the
//! supported algorithm set, plus the failure modes a resolver would hit.

mod common;

use std::sync::Arc;

use tyr::config::SigningConfig;
use tyr::dnssec::{Algorithm, KeyRole, SignatureEngine, SignatureValidity, SigningKey};
use tyr::error::DnssecError;
use tyr::record::{RecordType, ResourceRecord};
use tyr::store::ZoneId;

use common::a_record;

fn engine() -> SignatureEngine {
    SignatureEngine::new(Arc::new(SigningConfig::default()))
}

fn engine_at(time: u32) -> SignatureEngine {
    let mut engine = engine();
    engine.set_current_time(time);
    engine
}

fn zsk(algorithm: Algorithm, bits: u32) -> SigningKey {
    SigningKey::generate(ZoneId::from("zone-1"), KeyRole::Zsk, algorithm, bits).unwrap()
}

#[test]
fn test_round_trip_all_supported_algorithms() {
    let engine = engine();
    let records = vec![
        a_record("example.com", 3600, "93.184.216.34"),
        a_record("example.com", 3600, "93.184.216.35"),
    ];

    for (algorithm, bits) in [
        (Algorithm::RsaSha1, 1024),
        (Algorithm::RsaSha256, 2048),
        (Algorithm::RsaSha512, 2048),
        (Algorithm::EcdsaP256Sha256, 256),
        (Algorithm::EcdsaP384Sha384, 384),
        (Algorithm::Ed25519, 256),
    ] {
        let key = zsk(algorithm, bits);
        let rrsig = engine
            .sign_rrset("example.com", &records, &key, "example.com", None)
            .unwrap();
        assert_eq!(rrsig.algorithm, algorithm);
        assert!(
            engine
                .verify_rrset("example.com", &records, &rrsig, &key.public_key)
                .unwrap(),
            "round trip failed for {}",
            algorithm
        );
    }
}

#[test]
fn test_flipped_signature_byte_fails_verification() {
    let engine = engine();
    let key = zsk(Algorithm::RsaSha256, 2048);
    let records = vec![a_record("example.com", 3600, "93.184.216.34")];
    let rrsig = engine
        .sign_rrset("example.com", &records, &key, "example.com", None)
        .unwrap();

    for index in [0, rrsig.signature.len() / 2, rrsig.signature.len() - 1] {
        let mut tampered = rrsig.clone();
        tampered.signature[index] ^= 0x80;
        assert!(!engine
            .verify_rrset("example.com", &records, &tampered, &key.public_key)
            .unwrap());
    }
}

#[test]
fn test_ttl_mismatch_fails_verification() {
    let engine = engine();
    let key = zsk(Algorithm::EcdsaP256Sha256, 256);
    let records = vec![a_record("example.com", 3600, "93.184.216.34")];
    let rrsig = engine
        .sign_rrset("example.com", &records, &key, "example.com", None)
        .unwrap();

    // The verifier trusts the RRSIG's original TTL; changing it breaks the
    // reconstructed byte stream.
    let mut altered = rrsig.clone();
    altered.original_ttl = 7200;
    assert!(!engine
        .verify_rrset("example.com", &records, &altered, &key.public_key)
        .unwrap());
}

#[test]
fn test_record_order_does_not_affect_signature() {
    let engine = engine();
    let key = zsk(Algorithm::Ed25519, 256);
    let a = a_record("example.com", 300, "192.0.2.1");
    let b = a_record("example.com", 300, "192.0.2.2");

    let rrsig = engine
        .sign_rrset("example.com", &[a.clone(), b.clone()], &key, "example.com", None)
        .unwrap();
    assert!(engine
        .verify_rrset("example.com", &[b, a], &rrsig, &key.public_key)
        .unwrap());
}

#[test]
fn test_validity_window_scenario() {
    // Sign at T with a 30-day window, verify at T+100, then at T+2592001.
    let t: u32 = 1_700_000_000;
    let records = vec![a_record("example.com", 3600, "93.184.216.34")];
    let key = zsk(Algorithm::RsaSha256, 2048);

    let signer = engine_at(t);
    let rrsig = signer
        .sign_rrset(
            "example.com",
            &records,
            &key,
            "example.com",
            Some(SignatureValidity {
                inception: t,
                expiration: t + 2_592_000,
            }),
        )
        .unwrap();

    let fresh = engine_at(t + 100);
    assert!(fresh
        .verify_rrset("example.com", &records, &rrsig, &key.public_key)
        .unwrap());

    let stale = engine_at(t + 2_592_001);
    assert_eq!(
        stale.verify_rrset("example.com", &records, &rrsig, &key.public_key),
        Err(DnssecError::Expired {
            expiration: t + 2_592_000,
            now: t + 2_592_001,
        })
    );

    let early = engine_at(t - 1);
    assert_eq!(
        early.verify_rrset("example.com", &records, &rrsig, &key.public_key),
        Err(DnssecError::NotYetValid {
            inception: t,
            now: t - 1,
        })
    );
}

#[test]
fn test_window_enforcement_can_be_disabled() {
    let t: u32 = 1_700_000_000;
    let key = zsk(Algorithm::Ed25519, 256);
    let records = vec![a_record("example.com", 3600, "93.184.216.34")];

    let signer = engine_at(t);
    let rrsig = signer
        .sign_rrset(
            "example.com",
            &records,
            &key,
            "example.com",
            Some(SignatureValidity {
                inception: t,
                expiration: t + 60,
            }),
        )
        .unwrap();

    let config = SigningConfig {
        enforce_validity_window: false,
        ..SigningConfig::default()
    };
    let mut lenient = SignatureEngine::new(Arc::new(config));
    lenient.set_current_time(t + 120);
    assert!(lenient
        .verify_rrset("example.com", &records, &rrsig, &key.public_key)
        .unwrap());
}

#[test]
fn test_wildcard_expansion_verifies() {
    let engine = engine();
    let key = zsk(Algorithm::EcdsaP256Sha256, 256);
    // Signed at the wildcard: the RRSIG label count is that of
    // *.example.com, while the queried owner has three labels.
    let wildcard_records = vec![a_record("*.example.com", 300, "192.0.2.9")];
    let rrsig = engine
        .sign_rrset("*.example.com", &wildcard_records, &key, "example.com", None)
        .unwrap();
    assert_eq!(rrsig.labels, 2);

    let expanded = vec![a_record("host.example.com", 300, "192.0.2.9")];
    assert!(engine
        .verify_rrset("host.example.com", &expanded, &rrsig, &key.public_key)
        .unwrap());
}

#[test]
fn test_srv_rrset_signs_with_structured_fields() {
    let engine = engine();
    let key = zsk(Algorithm::Ed25519, 256);
    let mut srv = ResourceRecord::new("_sip._tcp.example.com", RecordType::SRV, 300, "");
    srv.priority = Some(10);
    srv.weight = Some(60);
    srv.port = Some(5060);
    srv.target = Some("sip.example.com".to_string());

    let records = vec![srv];
    let rrsig = engine
        .sign_rrset("_sip._tcp.example.com", &records, &key, "example.com", None)
        .unwrap();
    assert!(engine
        .verify_rrset("_sip._tcp.example.com", &records, &rrsig, &key.public_key)
        .unwrap());
}

#[test]
fn test_malformed_record_is_a_structural_error() {
    let engine = engine();
    let key = zsk(Algorithm::Ed25519, 256);
    let broken = vec![ResourceRecord::new(
        "example.com",
        RecordType::A,
        300,
        "not-an-address",
    )];
    let err = engine
        .sign_rrset("example.com", &broken, &key, "example.com", None)
        .unwrap_err();
    assert!(matches!(err, DnssecError::MalformedRecord { .. }));
}
