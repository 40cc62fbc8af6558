use std::fmt;
use std::str::FromStr;

use base64::Engine;
use chrono::{DateTime, Utc};
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::{DNSKEY_PROTOCOL, FLAGS_KSK, FLAGS_ZSK};
use super::{calculate_key_tag, Algorithm};
use crate::error::{DnssecError, Result};
use crate::store::ZoneId;

/// DNSSEC key roles. A KSK signs the DNSKEY set, a ZSK everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyRole {
    Ksk,
    Zsk,
}

impl KeyRole {
    /// DNSKEY flags field: 257 (zone key + SEP) for KSK, 256 for ZSK.
    pub fn flags(&self) -> u16 {
        match self {
            Self::Ksk => FLAGS_KSK,
            Self::Zsk => FLAGS_ZSK,
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ksk => write!(f, "KSK"),
            Self::Zsk => write!(f, "ZSK"),
        }
    }
}

impl FromStr for KeyRole {
    type Err = DnssecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KSK" => Ok(Self::Ksk),
            "ZSK" => Ok(Self::Zsk),
            other => Err(DnssecError::Config(format!("unknown key role: {}", other))),
        }
    }
}

/// Private key material in a PKCS#8 PEM container.
///
/// Access is limited to the signature engine inside this module tree; the
/// material never reaches logs, the record store, or `Debug` output.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    pem: String,
}

impl PrivateKeyMaterial {
    pub(crate) fn new(pem: String) -> Self {
        Self { pem }
    }

    pub(crate) fn pem(&self) -> &str {
        &self.pem
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyMaterial(<redacted>)")
    }
}

/// One asymmetric key pair bound to one zone.
#[derive(Debug, Clone)]
pub struct SigningKey {
    pub id: Uuid,
    pub zone: ZoneId,
    pub role: KeyRole,
    pub algorithm: Algorithm,
    pub key_size: u32,
    /// Public key in DNSKEY wire format (RFC 3110 for RSA, raw curve
    /// points for ECDSA/Ed25519).
    pub public_key: Vec<u8>,
    /// Public key in an SPKI PEM container, as persisted externally.
    pub public_key_pem: String,
    pub(crate) private_key: PrivateKeyMaterial,
    pub flags: u16,
    pub protocol: u8,
    /// Always derived from (flags, protocol, algorithm, public key).
    pub key_tag: u16,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SigningKey {
    /// Generate a fresh key pair.
    ///
    /// CPU-heavy for large RSA sizes; callers that care should run this on
    /// a blocking thread (the key store does).
    pub fn generate(zone: ZoneId, role: KeyRole, algorithm: Algorithm, bits: u32) -> Result<Self> {
        if !algorithm.is_supported() {
            return Err(DnssecError::UnsupportedAlgorithm(algorithm.to_u8()));
        }
        algorithm.validate_key_size(bits)?;

        let (pkey, public_key) = generate_pair(algorithm, bits)?;
        let public_key_pem = pem_string(pkey.public_key_to_pem()?)?;
        let private_key = PrivateKeyMaterial::new(pem_string(pkey.private_key_to_pem_pkcs8()?)?);

        let flags = role.flags();
        let key_tag = calculate_key_tag(flags, DNSKEY_PROTOCOL, algorithm.to_u8(), &public_key);

        Ok(Self {
            id: Uuid::new_v4(),
            zone,
            role,
            algorithm,
            key_size: bits,
            public_key,
            public_key_pem,
            private_key,
            flags,
            protocol: DNSKEY_PROTOCOL,
            key_tag,
            active: true,
            created_at: Utc::now(),
            revoked_at: None,
        })
    }

    /// DNSKEY RDATA: flags || protocol || algorithm || public key.
    pub fn dnskey_rdata(&self) -> Vec<u8> {
        let mut rdata = Vec::with_capacity(4 + self.public_key.len());
        rdata.extend_from_slice(&self.flags.to_be_bytes());
        rdata.push(self.protocol);
        rdata.push(self.algorithm.to_u8());
        rdata.extend_from_slice(&self.public_key);
        rdata
    }

    /// DNSKEY presentation format, e.g. `256 3 8 AwEAAa...`.
    pub fn dnskey_presentation(&self) -> String {
        format!(
            "{} {} {} {}",
            self.flags,
            self.protocol,
            self.algorithm.to_u8(),
            base64::engine::general_purpose::STANDARD.encode(&self.public_key)
        )
    }

    /// Outward-visible projection; carries no private material.
    pub fn info(&self) -> KeyInfo {
        KeyInfo {
            id: self.id,
            zone: self.zone.clone(),
            role: self.role,
            algorithm: self.algorithm,
            key_size: self.key_size,
            key_tag: self.key_tag,
            flags: self.flags,
            protocol: self.protocol,
            public_key: self.public_key.clone(),
            public_key_pem: self.public_key_pem.clone(),
            active: self.active,
            created_at: self.created_at,
            revoked_at: self.revoked_at,
        }
    }
}

/// Public view of a signing key, safe to serialize across the zone
/// management boundary.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    pub id: Uuid,
    pub zone: ZoneId,
    pub role: KeyRole,
    pub algorithm: Algorithm,
    pub key_size: u32,
    pub key_tag: u16,
    pub flags: u16,
    pub protocol: u8,
    /// DNSKEY wire-format public key.
    pub public_key: Vec<u8>,
    pub public_key_pem: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

fn pem_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|_| DnssecError::KeyMaterialInvalid("PEM container is not UTF-8".to_string()))
}

fn generate_pair(algorithm: Algorithm, bits: u32) -> Result<(PKey<Private>, Vec<u8>)> {
    match algorithm {
        Algorithm::RsaSha1
        | Algorithm::RsaSha1Nsec3Sha1
        | Algorithm::RsaSha256
        | Algorithm::RsaSha512 => {
            let rsa = Rsa::generate(bits)?;
            let exponent = rsa.e().to_vec();
            let modulus = rsa.n().to_vec();

            // RFC 3110 wire layout: exponent length, exponent, modulus.
            let mut wire = Vec::with_capacity(3 + exponent.len() + modulus.len());
            if exponent.len() < 256 {
                wire.push(exponent.len() as u8);
            } else {
                wire.push(0);
                wire.extend_from_slice(&(exponent.len() as u16).to_be_bytes());
            }
            wire.extend_from_slice(&exponent);
            wire.extend_from_slice(&modulus);
            Ok((PKey::from_rsa(rsa)?, wire))
        }
        Algorithm::EcdsaP256Sha256 | Algorithm::EcdsaP384Sha384 => {
            let (nid, coord_len) = match algorithm {
                Algorithm::EcdsaP256Sha256 => (Nid::X9_62_PRIME256V1, 32),
                _ => (Nid::SECP384R1, 48),
            };
            let group = EcGroup::from_curve_name(nid)?;
            let ec = EcKey::generate(&group)?;

            // Wire format is the uncompressed point without the 0x04 prefix.
            let mut ctx = BigNumContext::new()?;
            let mut x = BigNum::new()?;
            let mut y = BigNum::new()?;
            ec.public_key().affine_coordinates(&group, &mut x, &mut y, &mut ctx)?;
            let mut wire = x.to_vec_padded(coord_len)?;
            wire.extend_from_slice(&y.to_vec_padded(coord_len)?);
            Ok((PKey::from_ec_key(ec)?, wire))
        }
        Algorithm::Ed25519 => {
            let pkey = PKey::generate_ed25519()?;
            let wire = pkey.raw_public_key()?;
            Ok((pkey, wire))
        }
        other => Err(DnssecError::UnsupportedAlgorithm(other.to_u8())),
    }
}
