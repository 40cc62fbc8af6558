use std::fmt;

use serde::{Deserialize, Serialize};

use super::canonical;
use crate::error::{DnssecError, Result};

/// DS digest type numbers (RFC 4034, 4509, 6605).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DigestType {
    /// SHA-1 (RFC 3658)
    Sha1 = 1,
    /// SHA-256 (RFC 4509)
    Sha256 = 2,
    /// SHA-384 (RFC 6605)
    Sha384 = 4,
}

impl DigestType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha256),
            4 => Some(Self::Sha384),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn lookup(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(DnssecError::UnsupportedDigestType(value))
    }

    /// Expected digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
        }
    }

    /// Digest raw bytes with this hash function.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        use ring::digest;
        let algorithm = match self {
            Self::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => &digest::SHA256,
            Self::Sha384 => &digest::SHA384,
        };
        digest::digest(algorithm, data).as_ref().to_vec()
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
        };
        write!(f, "{}", name)
    }
}

/// A DS record derived from a DNSKEY: Hash(canonical owner name || DNSKEY
/// RDATA) plus the identifying key tag and algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DsRecord {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: DigestType,
    pub digest: Vec<u8>,
}

impl DsRecord {
    /// Presentation format for the record store's `data` field, e.g.
    /// `60485 5 2 D4B7D520...`.
    pub fn presentation(&self) -> String {
        format!(
            "{} {} {} {}",
            self.key_tag,
            self.algorithm,
            self.digest_type.to_u8(),
            hex::encode_upper(&self.digest)
        )
    }
}

/// Compute the DS digest of a DNSKEY.
///
/// `owner_name` is the zone apex the DNSKEY lives at; `dnskey_rdata` is the
/// full RDATA (flags || protocol || algorithm || public key).
pub fn ds_digest(owner_name: &str, dnskey_rdata: &[u8], digest_type: DigestType) -> Result<Vec<u8>> {
    let mut data = canonical::encode_name(owner_name)?;
    data.extend_from_slice(dnskey_rdata);
    Ok(digest_type.digest(&data))
}
