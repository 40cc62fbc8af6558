use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DnssecError, Result};

/// DNSSEC algorithm numbers (RFC 4034, 5155, 5702, 5933, 6605, 8080, 8624).
///
/// The registry is closed: every supported algorithm carries its IANA number
/// explicitly, and lookups go through `lookup` rather than positional
/// indexing. Deprecated entries remain representable so that foreign DNSKEY
/// records can be named in errors, but default policy rejects them for key
/// generation and signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Algorithm {
    /// RSA/MD5 (deprecated, RFC 4034)
    RsaMd5 = 1,
    /// Diffie-Hellman (deprecated)
    Dh = 2,
    /// DSA/SHA-1 (deprecated, RFC 2536)
    Dsa = 3,
    /// RSA/SHA-1 (RFC 3110)
    RsaSha1 = 5,
    /// DSA-NSEC3-SHA1 (deprecated, RFC 5155)
    DsaNsec3Sha1 = 6,
    /// RSASHA1-NSEC3-SHA1 (RFC 5155)
    RsaSha1Nsec3Sha1 = 7,
    /// RSA/SHA-256 (RFC 5702)
    RsaSha256 = 8,
    /// RSA/SHA-512 (RFC 5702)
    RsaSha512 = 10,
    /// GOST R 34.10-2001 (deprecated, RFC 5933)
    EccGost = 12,
    /// ECDSA Curve P-256 with SHA-256 (RFC 6605)
    EcdsaP256Sha256 = 13,
    /// ECDSA Curve P-384 with SHA-384 (RFC 6605)
    EcdsaP384Sha384 = 14,
    /// Ed25519 (RFC 8080)
    Ed25519 = 15,
}

/// Key sizes accepted for the RSA family. 4096 is what we hand out for new
/// KSKs; 1024 survives for verifying legacy zones only.
pub const RSA_KEY_SIZES: &[u32] = &[1024, 2048, 4096];

impl Algorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RsaMd5),
            2 => Some(Self::Dh),
            3 => Some(Self::Dsa),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Resolve an algorithm number, failing for ids outside the registry.
    pub fn lookup(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(DnssecError::UnsupportedAlgorithm(value))
    }

    /// Whether this algorithm can be used for key generation and signing.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RsaSha1
                | Self::RsaSha1Nsec3Sha1
                | Self::RsaSha256
                | Self::RsaSha512
                | Self::EcdsaP256Sha256
                | Self::EcdsaP384Sha384
                | Self::Ed25519
        )
    }

    /// Deprecated algorithms are kept in the registry for error reporting
    /// but rejected by default policy.
    pub fn is_deprecated(&self) -> bool {
        matches!(
            self,
            Self::RsaMd5 | Self::Dh | Self::Dsa | Self::DsaNsec3Sha1 | Self::EccGost
        )
    }

    /// RFC 8624 signing recommendations.
    pub fn is_recommended(&self) -> bool {
        matches!(
            self,
            Self::RsaSha256 | Self::EcdsaP256Sha256 | Self::Ed25519
        )
    }

    /// Algorithm 1 computes its key tag from the last two octets of the
    /// public key instead of the RFC 4034 Appendix B word sum.
    pub fn legacy_key_tag(&self) -> bool {
        matches!(self, Self::RsaMd5)
    }

    pub fn is_rsa(&self) -> bool {
        matches!(
            self,
            Self::RsaMd5 | Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 | Self::RsaSha256 | Self::RsaSha512
        )
    }

    pub fn is_ecdsa(&self) -> bool {
        matches!(self, Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384)
    }

    /// Fixed key size in bits for non-RSA algorithms.
    pub fn fixed_key_size(&self) -> Option<u32> {
        match self {
            Self::EcdsaP256Sha256 => Some(256),
            Self::EcdsaP384Sha384 => Some(384),
            Self::Ed25519 => Some(256),
            _ => None,
        }
    }

    /// ECDSA coordinate width in bytes; also the width of each half of a
    /// wire-format ECDSA signature.
    pub fn ecdsa_coordinate_len(&self) -> Option<usize> {
        match self {
            Self::EcdsaP256Sha256 => Some(32),
            Self::EcdsaP384Sha384 => Some(48),
            _ => None,
        }
    }

    /// Check a requested key size against the registry.
    ///
    /// RSA accepts 1024/2048/4096; the curve algorithms have exactly one
    /// size each and any other request is an error.
    pub fn validate_key_size(&self, bits: u32) -> Result<()> {
        let ok = if self.is_rsa() {
            RSA_KEY_SIZES.contains(&bits)
        } else {
            self.fixed_key_size() == Some(bits)
        };
        if ok {
            Ok(())
        } else {
            Err(DnssecError::InvalidKeySize {
                algorithm: self.to_string(),
                bits,
            })
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RsaMd5 => "RSAMD5",
            Self::Dh => "DH",
            Self::Dsa => "DSA",
            Self::RsaSha1 => "RSASHA1",
            Self::DsaNsec3Sha1 => "DSA-NSEC3-SHA1",
            Self::RsaSha1Nsec3Sha1 => "RSASHA1-NSEC3-SHA1",
            Self::RsaSha256 => "RSASHA256",
            Self::RsaSha512 => "RSASHA512",
            Self::EccGost => "ECC-GOST",
            Self::EcdsaP256Sha256 => "ECDSAP256SHA256",
            Self::EcdsaP384Sha384 => "ECDSAP384SHA384",
            Self::Ed25519 => "ED25519",
        };
        write!(f, "{}", name)
    }
}
