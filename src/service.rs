use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SigningConfig;
use crate::dnssec::{
    ds_digest, DigestType, DsRecord, KeyInfo, KeyRole, KeyStore, Nsec3Param, Rrsig,
    SignatureEngine, SignatureValidity, SigningKey,
};
use crate::dnssec::nsec3;
use crate::error::{DnssecError, Result};
use crate::record::{RecordType, ResourceRecord};
use crate::store::{DomainDirectory, RecordStore, ZoneId};

/// The outward face of the DNSSEC core.
///
/// Ties the key store and signature engine to the external record store and
/// domain directory: derived DNSKEY/DS/NSEC3PARAM/RRSIG records flow out to
/// the store, record sets to sign flow in. Ownership and permission checks
/// stay on the directory's side; only the opaque zone id and the apex name
/// cross the boundary.
pub struct DnssecService<S, D> {
    records: S,
    domains: D,
    keys: KeyStore,
    engine: SignatureEngine,
    config: Arc<SigningConfig>,
}

impl<S: RecordStore, D: DomainDirectory> DnssecService<S, D> {
    pub fn new(records: S, domains: D, config: SigningConfig) -> Self {
        let config = Arc::new(config);
        Self {
            records,
            domains,
            keys: KeyStore::new(config.clone()),
            engine: SignatureEngine::new(config.clone()),
            config,
        }
    }

    /// Pin the signing clock (test fixtures with fixed time).
    pub fn set_current_time(&mut self, time: u32) {
        self.engine.set_current_time(time);
    }

    pub fn engine(&self) -> &SignatureEngine {
        &self.engine
    }

    /// Generate a key pair for a zone and persist its public artifacts.
    ///
    /// The DNSKEY record is always stored; KSKs additionally produce a DS
    /// record, and the first key of a zone establishes its NSEC3PARAM.
    /// Only the public projection of the key leaves this call.
    pub async fn generate_key_pair(
        &self,
        zone: &ZoneId,
        role: KeyRole,
        algorithm_id: u8,
        bits: u32,
    ) -> Result<KeyInfo> {
        let apex = self.domains.zone_apex(zone).await?;
        let first_key_for_zone = self.keys.keys(zone).is_empty();

        let key = self.keys.generate(zone, role, algorithm_id, bits).await?;
        let ttl = self.config.default_record_ttl;

        self.records
            .create_record(
                zone,
                ResourceRecord::new(&apex, RecordType::DNSKEY, ttl, key.dnskey_presentation()),
            )
            .await?;

        if role == KeyRole::Ksk {
            let ds = self.ds_record(&apex, &key)?;
            self.records
                .create_record(
                    zone,
                    ResourceRecord::new(&apex, RecordType::DS, ttl, ds.presentation()),
                )
                .await?;
        }

        if first_key_for_zone {
            let param = Nsec3Param::new(
                nsec3::generate_salt(self.config.nsec3_salt_length),
                self.config.nsec3_iterations,
            );
            self.records
                .create_record(
                    zone,
                    ResourceRecord::new(&apex, RecordType::NSEC3PARAM, ttl, param.presentation()),
                )
                .await?;
        }

        info!(zone = %zone, role = %role, key_tag = key.key_tag, "key pair provisioned");
        Ok(key.info())
    }

    /// Sign the RRset at `(owner, rtype)` with every active key of `role`,
    /// persisting and returning one RRSIG per key.
    pub async fn sign_record_set(
        &self,
        zone: &ZoneId,
        owner: &str,
        rtype: RecordType,
        role: KeyRole,
    ) -> Result<Vec<Rrsig>> {
        self.sign_record_set_with(zone, owner, rtype, role, None).await
    }

    /// As `sign_record_set`, with an explicit validity window.
    pub async fn sign_record_set_with(
        &self,
        zone: &ZoneId,
        owner: &str,
        rtype: RecordType,
        role: KeyRole,
        validity: Option<SignatureValidity>,
    ) -> Result<Vec<Rrsig>> {
        let apex = self.domains.zone_apex(zone).await?;
        let records = self.records.find_rrset(zone, owner, rtype).await?;
        if records.is_empty() {
            return Err(DnssecError::MalformedRecord {
                name: owner.to_string(),
                rtype: rtype.to_string(),
                reason: "no records to sign".to_string(),
            });
        }

        // Snapshot taken once; a concurrent rollover cannot change the set
        // of keys this call signs with.
        let active = self.keys.active_keys(zone, role);
        if active.is_empty() {
            return Err(DnssecError::KeyNotActive(format!(
                "zone {} has no active {}",
                zone, role
            )));
        }

        let mut rrsigs = Vec::with_capacity(active.len());
        for key in &active {
            let rrsig = self.engine.sign_rrset(owner, &records, key, &apex, validity)?;
            self.records
                .create_record(
                    zone,
                    ResourceRecord::new(owner, RecordType::RRSIG, rrsig.original_ttl, rrsig.presentation()),
                )
                .await?;
            rrsigs.push(rrsig);
        }

        debug!(zone = %zone, owner, rtype = %rtype, signatures = rrsigs.len(), "RRset signed");
        Ok(rrsigs)
    }

    /// Verify an RRSIG against a record set and a DNSKEY public key.
    pub fn verify_record_set(
        &self,
        owner: &str,
        records: &[ResourceRecord],
        rrsig: &Rrsig,
        public_key: &[u8],
    ) -> Result<bool> {
        self.engine.verify_rrset(owner, records, rrsig, public_key)
    }

    /// Derive the DS record for a zone's key, addressed by key tag.
    pub async fn derive_ds_record(&self, zone: &ZoneId, key_tag: u16) -> Result<DsRecord> {
        let key = self.keys.find_by_tag(zone, key_tag).ok_or_else(|| {
            DnssecError::KeyNotActive(format!("zone {} has no key with tag {}", zone, key_tag))
        })?;
        let apex = self.domains.zone_apex(zone).await?;
        self.ds_record(&apex, &key)
    }

    /// Derive NSEC3 parameters, enforcing the iteration cap.
    pub fn derive_nsec3_param(&self, salt: Vec<u8>, iterations: u16) -> Result<Nsec3Param> {
        if iterations > self.config.nsec3_max_iterations {
            return Err(DnssecError::IterationCountTooHigh {
                requested: iterations,
                max: self.config.nsec3_max_iterations,
            });
        }
        Ok(Nsec3Param::new(salt, iterations))
    }

    /// Hash an owner name with a zone's NSEC3 parameters.
    pub fn hash_owner_name(&self, name: &str, param: &Nsec3Param) -> Result<String> {
        nsec3::hash_owner_name(name, param, self.config.nsec3_max_iterations)
    }

    /// Active keys of a role, public projections only.
    pub fn active_keys(&self, zone: &ZoneId, role: KeyRole) -> Vec<KeyInfo> {
        self.keys
            .active_keys(zone, role)
            .iter()
            .map(SigningKey::info)
            .collect()
    }

    /// Deactivate a key; idempotent. The overlap window of a rollover ends
    /// here and nowhere else.
    pub fn deactivate_key(&self, zone: &ZoneId, key_id: Uuid) -> bool {
        self.keys.deactivate(zone, key_id)
    }

    fn ds_record(&self, apex: &str, key: &SigningKey) -> Result<DsRecord> {
        let digest_type = DigestType::lookup(self.config.ds_digest_type)?;
        let digest = ds_digest(apex, &key.dnskey_rdata(), digest_type)?;
        Ok(DsRecord {
            key_tag: key.key_tag,
            algorithm: key.algorithm.to_u8(),
            digest_type,
            digest,
        })
    }
}
