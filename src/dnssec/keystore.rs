use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::keys::{KeyRole, SigningKey};
use super::Algorithm;
use crate::config::SigningConfig;
use crate::error::{DnssecError, Result};
use crate::store::ZoneId;

/// Per-zone signing key state.
///
/// The key lists are the only shared mutable state in the core. Each zone's
/// list sits behind its own lock; mutation (generate, deactivate) takes the
/// write side while signing reads a cloned snapshot, so an in-flight sign
/// either sees a consistent set of active keys or none at all — never a mix
/// of stale and fresh state.
pub struct KeyStore {
    config: Arc<SigningConfig>,
    zones: DashMap<ZoneId, Arc<RwLock<Vec<SigningKey>>>>,
}

impl KeyStore {
    pub fn new(config: Arc<SigningConfig>) -> Self {
        Self {
            config,
            zones: DashMap::new(),
        }
    }

    /// Generate a key pair and register it as active for the zone.
    ///
    /// An existing active key of the same role stays active: rollover
    /// windows with two signing keys are legitimate, and ending the overlap
    /// is the caller's explicit `deactivate`. Generation runs on a blocking
    /// thread; cancelling the future discards the partial pair without
    /// touching the store.
    pub async fn generate(
        &self,
        zone: &ZoneId,
        role: KeyRole,
        algorithm_id: u8,
        bits: u32,
    ) -> Result<SigningKey> {
        let algorithm = Algorithm::lookup(algorithm_id)?;
        if algorithm.is_deprecated() && !self.config.allow_deprecated_algorithms {
            return Err(DnssecError::UnsupportedAlgorithm(algorithm_id));
        }
        algorithm.validate_key_size(bits)?;

        let task_zone = zone.clone();
        let key = tokio::task::spawn_blocking(move || {
            SigningKey::generate(task_zone, role, algorithm, bits)
        })
        .await
        .map_err(|e| DnssecError::KeyMaterialInvalid(format!("key generation task: {}", e)))??;

        let entry = self.zones.entry(zone.clone()).or_default().value().clone();
        entry.write().push(key.clone());

        info!(
            zone = %zone,
            role = %role,
            algorithm = %algorithm,
            key_tag = key.key_tag,
            "generated signing key"
        );
        Ok(key)
    }

    /// Snapshot of the currently active keys of a role, oldest first.
    pub fn active_keys(&self, zone: &ZoneId, role: KeyRole) -> Vec<SigningKey> {
        let Some(entry) = self.zones.get(zone) else {
            return Vec::new();
        };
        let keys = entry.value().read();
        let mut active: Vec<SigningKey> = keys
            .iter()
            .filter(|k| k.active && k.role == role)
            .cloned()
            .collect();
        active.sort_by_key(|k| k.created_at);
        active
    }

    /// All keys ever registered for a zone, active or not.
    pub fn keys(&self, zone: &ZoneId) -> Vec<SigningKey> {
        self.zones
            .get(zone)
            .map(|entry| entry.value().read().clone())
            .unwrap_or_default()
    }

    /// Look up a key by its tag.
    pub fn find_by_tag(&self, zone: &ZoneId, key_tag: u16) -> Option<SigningKey> {
        self.zones
            .get(zone)?
            .value()
            .read()
            .iter()
            .find(|k| k.key_tag == key_tag)
            .cloned()
    }

    /// Deactivate a key. Idempotent; returns whether the state changed.
    /// The key is retained (deletion is a record-store concern).
    pub fn deactivate(&self, zone: &ZoneId, key_id: Uuid) -> bool {
        let Some(entry) = self.zones.get(zone) else {
            return false;
        };
        let keys = entry.value().clone();
        drop(entry);

        let mut keys = keys.write();
        for key in keys.iter_mut() {
            if key.id == key_id && key.active {
                key.active = false;
                key.revoked_at = Some(Utc::now());
                debug!(zone = %zone, key_tag = key.key_tag, "deactivated signing key");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> KeyStore {
        KeyStore::new(Arc::new(SigningConfig::default()))
    }

    #[tokio::test]
    async fn test_generate_leaves_prior_key_active() {
        let store = store();
        let zone = ZoneId::from("zone-1");
        let first = store.generate(&zone, KeyRole::Zsk, 15, 256).await.unwrap();
        let second = store.generate(&zone, KeyRole::Zsk, 15, 256).await.unwrap();

        let active = store.active_keys(&zone, KeyRole::Zsk);
        assert_eq!(active.len(), 2);
        // Oldest first.
        assert_eq!(active[0].id, first.id);
        assert_eq!(active[1].id, second.id);
    }

    #[tokio::test]
    async fn test_deactivate_is_idempotent() {
        let store = store();
        let zone = ZoneId::from("zone-1");
        let key = store.generate(&zone, KeyRole::Ksk, 15, 256).await.unwrap();

        assert!(store.deactivate(&zone, key.id));
        assert!(!store.deactivate(&zone, key.id));
        assert!(store.active_keys(&zone, KeyRole::Ksk).is_empty());

        let retained = store.keys(&zone);
        assert_eq!(retained.len(), 1);
        assert!(retained[0].revoked_at.is_some());
    }

    #[tokio::test]
    async fn test_generate_rejects_deprecated_by_default() {
        let store = store();
        let zone = ZoneId::from("zone-1");
        let err = store.generate(&zone, KeyRole::Zsk, 12, 512).await.unwrap_err();
        assert_eq!(err, DnssecError::UnsupportedAlgorithm(12));
    }

    #[tokio::test]
    async fn test_roles_are_tracked_separately() {
        let store = store();
        let zone = ZoneId::from("zone-1");
        store.generate(&zone, KeyRole::Ksk, 15, 256).await.unwrap();
        store.generate(&zone, KeyRole::Zsk, 15, 256).await.unwrap();

        assert_eq!(store.active_keys(&zone, KeyRole::Ksk).len(), 1);
        assert_eq!(store.active_keys(&zone, KeyRole::Zsk).len(), 1);
        assert!(store
            .active_keys(&ZoneId::from("other"), KeyRole::Zsk)
            .is_empty());
    }
}
