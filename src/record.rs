use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DnssecError;

/// Resource record types handled by the signing core.
///
/// This mirrors the record store's schema; the core only reads records, it
/// never mutates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordType {
    #[default]
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    TLSA,
    CAA,
    DS,
    DNSKEY,
    NSEC,
    NSEC3,
    NSEC3PARAM,
    RRSIG,
}

impl RecordType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::A),
            2 => Some(Self::NS),
            5 => Some(Self::CNAME),
            6 => Some(Self::SOA),
            12 => Some(Self::PTR),
            15 => Some(Self::MX),
            16 => Some(Self::TXT),
            28 => Some(Self::AAAA),
            33 => Some(Self::SRV),
            52 => Some(Self::TLSA),
            257 => Some(Self::CAA),
            43 => Some(Self::DS),
            48 => Some(Self::DNSKEY),
            47 => Some(Self::NSEC),
            50 => Some(Self::NSEC3),
            51 => Some(Self::NSEC3PARAM),
            46 => Some(Self::RRSIG),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::A => 1,
            Self::NS => 2,
            Self::CNAME => 5,
            Self::SOA => 6,
            Self::PTR => 12,
            Self::MX => 15,
            Self::TXT => 16,
            Self::AAAA => 28,
            Self::SRV => 33,
            Self::TLSA => 52,
            Self::CAA => 257,
            Self::DS => 43,
            Self::DNSKEY => 48,
            Self::NSEC => 47,
            Self::NSEC3 => 50,
            Self::NSEC3PARAM => 51,
            Self::RRSIG => 46,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::PTR => "PTR",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::SRV => "SRV",
            Self::TLSA => "TLSA",
            Self::CAA => "CAA",
            Self::DS => "DS",
            Self::DNSKEY => "DNSKEY",
            Self::NSEC => "NSEC",
            Self::NSEC3 => "NSEC3",
            Self::NSEC3PARAM => "NSEC3PARAM",
            Self::RRSIG => "RRSIG",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RecordType {
    type Err = DnssecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "NS" => Ok(Self::NS),
            "CNAME" => Ok(Self::CNAME),
            "SOA" => Ok(Self::SOA),
            "PTR" => Ok(Self::PTR),
            "MX" => Ok(Self::MX),
            "TXT" => Ok(Self::TXT),
            "AAAA" => Ok(Self::AAAA),
            "SRV" => Ok(Self::SRV),
            "TLSA" => Ok(Self::TLSA),
            "CAA" => Ok(Self::CAA),
            "DS" => Ok(Self::DS),
            "DNSKEY" => Ok(Self::DNSKEY),
            "NSEC" => Ok(Self::NSEC),
            "NSEC3" => Ok(Self::NSEC3),
            "NSEC3PARAM" => Ok(Self::NSEC3PARAM),
            "RRSIG" => Ok(Self::RRSIG),
            other => Err(DnssecError::MalformedRecord {
                name: String::new(),
                rtype: other.to_string(),
                reason: "unknown record type".to_string(),
            }),
        }
    }
}

/// Resource record classes. Zones managed here are always `IN` in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordClass {
    #[default]
    IN,
    CS,
    CH,
    HS,
}

impl RecordClass {
    pub fn to_u16(self) -> u16 {
        match self {
            Self::IN => 1,
            Self::CS => 2,
            Self::CH => 3,
            Self::HS => 4,
        }
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::IN),
            2 => Some(Self::CS),
            3 => Some(Self::CH),
            4 => Some(Self::HS),
            _ => None,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IN => "IN",
            Self::CS => "CS",
            Self::CH => "CH",
            Self::HS => "HS",
        };
        write!(f, "{}", name)
    }
}

/// A resource record as handed over by the external record store.
///
/// `data` carries the primary presentation value (an address, a target name,
/// a text value, or a whitespace-separated rdata string depending on the
/// type); the optional fields mirror the store's structured columns for the
/// types that have them (MX priority, SRV weight/port/target, CAA flag/tag,
/// SOA timers). The canonical serializer reads these fields to build wire
/// format rdata and reports `MalformedRecord` when a required field is
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: String,
    #[serde(default)]
    pub priority: Option<u16>,
    #[serde(default)]
    pub weight: Option<u16>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub flag: Option<u8>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub admin: Option<String>,
    #[serde(default)]
    pub serial: Option<u32>,
    #[serde(default)]
    pub refresh: Option<u32>,
    #[serde(default)]
    pub retry: Option<u32>,
    #[serde(default)]
    pub expire: Option<u32>,
    #[serde(default)]
    pub minimum: Option<u32>,
}

impl ResourceRecord {
    /// Create a record with the fields every type carries. Type-specific
    /// fields are filled in through struct update syntax.
    pub fn new(
        name: impl Into<String>,
        rtype: RecordType,
        ttl: u32,
        data: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rtype,
            class: RecordClass::IN,
            ttl,
            data: data.into(),
            ..Self::default()
        }
    }
}
