//! Key rollover semantics through the service facade: overlapping active
//! keys, one RRSIG per key, explicit deactivation.

mod common;

use tyr::config::SigningConfig;
use tyr::dnssec::KeyRole;
use tyr::error::DnssecError;
use tyr::record::RecordType;
use tyr::service::DnssecService;
use tyr::store::ZoneId;

use common::{a_record, MemoryRecordStore, StaticDirectory};

fn service(zone: &ZoneId) -> DnssecService<MemoryRecordStore, StaticDirectory> {
    let store = MemoryRecordStore::new();
    store.seed(zone, a_record("example.com", 3600, "93.184.216.34"));
    let directory = StaticDirectory::single(zone, "example.com");
    DnssecService::new(store, directory, SigningConfig::default())
}

#[tokio::test]
async fn test_rollover_overlap_signs_with_both_keys() {
    let zone = ZoneId::from("zone-1");
    let service = service(&zone);

    let old = service
        .generate_key_pair(&zone, KeyRole::Zsk, 15, 256)
        .await
        .unwrap();
    let new = service
        .generate_key_pair(&zone, KeyRole::Zsk, 15, 256)
        .await
        .unwrap();

    // Both keys stay active until the caller ends the overlap.
    let active = service.active_keys(&zone, KeyRole::Zsk);
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|k| k.active));

    let rrsigs = service
        .sign_record_set(&zone, "example.com", RecordType::A, KeyRole::Zsk)
        .await
        .unwrap();
    assert_eq!(rrsigs.len(), 2);
    let tags: Vec<u16> = rrsigs.iter().map(|s| s.key_tag).collect();
    assert!(tags.contains(&old.key_tag));
    assert!(tags.contains(&new.key_tag));
}

#[tokio::test]
async fn test_deactivation_ends_overlap() {
    let zone = ZoneId::from("zone-1");
    let service = service(&zone);

    let old = service
        .generate_key_pair(&zone, KeyRole::Zsk, 15, 256)
        .await
        .unwrap();
    let new = service
        .generate_key_pair(&zone, KeyRole::Zsk, 15, 256)
        .await
        .unwrap();

    assert!(service.deactivate_key(&zone, old.id));
    // Idempotent: a second deactivation is a no-op.
    assert!(!service.deactivate_key(&zone, old.id));

    let rrsigs = service
        .sign_record_set(&zone, "example.com", RecordType::A, KeyRole::Zsk)
        .await
        .unwrap();
    assert_eq!(rrsigs.len(), 1);
    assert_eq!(rrsigs[0].key_tag, new.key_tag);
}

#[tokio::test]
async fn test_signing_without_active_key_fails_cleanly() {
    let zone = ZoneId::from("zone-1");
    let service = service(&zone);

    let key = service
        .generate_key_pair(&zone, KeyRole::Zsk, 15, 256)
        .await
        .unwrap();
    service.deactivate_key(&zone, key.id);

    let err = service
        .sign_record_set(&zone, "example.com", RecordType::A, KeyRole::Zsk)
        .await
        .unwrap_err();
    assert!(matches!(err, DnssecError::KeyNotActive(_)));
}

#[tokio::test]
async fn test_roles_do_not_substitute_for_each_other() {
    let zone = ZoneId::from("zone-1");
    let service = service(&zone);

    service
        .generate_key_pair(&zone, KeyRole::Ksk, 15, 256)
        .await
        .unwrap();

    // A KSK does not satisfy a ZSK signing request.
    let err = service
        .sign_record_set(&zone, "example.com", RecordType::A, KeyRole::Zsk)
        .await
        .unwrap_err();
    assert!(matches!(err, DnssecError::KeyNotActive(_)));
}

#[tokio::test]
async fn test_invalid_generation_requests() {
    let zone = ZoneId::from("zone-1");
    let service = service(&zone);

    assert_eq!(
        service
            .generate_key_pair(&zone, KeyRole::Zsk, 99, 2048)
            .await
            .unwrap_err(),
        DnssecError::UnsupportedAlgorithm(99)
    );
    // GOST is in the registry but deprecated, so default policy refuses it.
    assert_eq!(
        service
            .generate_key_pair(&zone, KeyRole::Zsk, 12, 512)
            .await
            .unwrap_err(),
        DnssecError::UnsupportedAlgorithm(12)
    );
    assert!(matches!(
        service
            .generate_key_pair(&zone, KeyRole::Zsk, 8, 1000)
            .await
            .unwrap_err(),
        DnssecError::InvalidKeySize { bits: 1000, .. }
    ));
}
