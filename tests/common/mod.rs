//! Common test utilities: in-memory stand-ins for the external record store
//! and domain directory.

#![allow(dead_code)] // These helpers are shared across several test files

use async_trait::async_trait;
use parking_lot::Mutex;

use tyr::error::{DnssecError, Result};
use tyr::record::{RecordType, ResourceRecord};
use tyr::store::{DomainDirectory, RecordStore, ZoneId};

/// In-memory record store capturing everything the core persists.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<(ZoneId, ResourceRecord)>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without going through the async trait.
    pub fn seed(&self, zone: &ZoneId, record: ResourceRecord) {
        self.records.lock().push((zone.clone(), record));
    }

    pub fn records_of_type(&self, zone: &ZoneId, rtype: RecordType) -> Vec<ResourceRecord> {
        self.records
            .lock()
            .iter()
            .filter(|(z, r)| z == zone && r.rtype == rtype)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn all_records(&self) -> Vec<ResourceRecord> {
        self.records.lock().iter().map(|(_, r)| r.clone()).collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_rrset(
        &self,
        zone: &ZoneId,
        name: &str,
        rtype: RecordType,
    ) -> Result<Vec<ResourceRecord>> {
        let wanted = name.trim_end_matches('.').to_ascii_lowercase();
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|(z, r)| {
                z == zone
                    && r.rtype == rtype
                    && r.name.trim_end_matches('.').to_ascii_lowercase() == wanted
            })
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(&self, zone: &ZoneId, record: ResourceRecord) -> Result<()> {
        self.records.lock().push((zone.clone(), record));
        Ok(())
    }

    async fn remove_by_zone(&self, zone: &ZoneId) -> Result<u64> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|(z, _)| z != zone);
        Ok((before - records.len()) as u64)
    }
}

/// Domain directory with a fixed zone table.
pub struct StaticDirectory {
    zones: Vec<(ZoneId, String)>,
}

impl StaticDirectory {
    pub fn single(zone: &ZoneId, apex: &str) -> Self {
        Self {
            zones: vec![(zone.clone(), apex.to_string())],
        }
    }
}

#[async_trait]
impl DomainDirectory for StaticDirectory {
    async fn zone_apex(&self, zone: &ZoneId) -> Result<String> {
        self.zones
            .iter()
            .find(|(z, _)| z == zone)
            .map(|(_, apex)| apex.clone())
            .ok_or_else(|| DnssecError::ZoneNotFound(zone.to_string()))
    }
}

pub fn a_record(name: &str, ttl: u32, addr: &str) -> ResourceRecord {
    ResourceRecord::new(name, RecordType::A, ttl, addr)
}
