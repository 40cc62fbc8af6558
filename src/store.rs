use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{RecordType, ResourceRecord};

/// Opaque zone identifier issued by the domain directory.
///
/// The core never interprets it; ownership and permission checks happen on
/// the directory's side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The external record store: owns persisted resource records.
///
/// The core reads record sets to sign and hands back derived DNSKEY, DS,
/// NSEC3PARAM, and RRSIG records for persistence. Deleting records is the
/// store's concern, not the core's.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records for `(name, rtype)` within a zone.
    async fn find_rrset(
        &self,
        zone: &ZoneId,
        name: &str,
        rtype: RecordType,
    ) -> Result<Vec<ResourceRecord>>;

    /// Persist a derived record.
    async fn create_record(&self, zone: &ZoneId, record: ResourceRecord) -> Result<()>;

    /// Remove every record of a zone; returns the number removed.
    async fn remove_by_zone(&self, zone: &ZoneId) -> Result<u64>;
}

/// The external domain directory: owns zone identity.
///
/// The core only ever asks for a zone's canonical apex name, which becomes
/// the RRSIG signer name and the owner of derived apex records.
#[async_trait]
pub trait DomainDirectory: Send + Sync {
    async fn zone_apex(&self, zone: &ZoneId) -> Result<String>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    async fn find_rrset(
        &self,
        zone: &ZoneId,
        name: &str,
        rtype: RecordType,
    ) -> Result<Vec<ResourceRecord>> {
        (**self).find_rrset(zone, name, rtype).await
    }

    async fn create_record(&self, zone: &ZoneId, record: ResourceRecord) -> Result<()> {
        (**self).create_record(zone, record).await
    }

    async fn remove_by_zone(&self, zone: &ZoneId) -> Result<u64> {
        (**self).remove_by_zone(zone).await
    }
}

#[async_trait]
impl<T: DomainDirectory + ?Sized> DomainDirectory for std::sync::Arc<T> {
    async fn zone_apex(&self, zone: &ZoneId) -> Result<String> {
        (**self).zone_apex(zone).await
    }
}
