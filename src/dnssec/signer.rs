use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use chrono::DateTime;
use openssl::ecdsa::EcdsaSig;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use ring::signature as ring_sig;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::keys::SigningKey;
use super::{canonical, Algorithm};
use crate::config::SigningConfig;
use crate::error::{DnssecError, Result};
use crate::record::{RecordType, ResourceRecord};

/// A completed RRSIG, produced fresh on every signing call and handed back
/// to the caller for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rrsig {
    pub type_covered: RecordType,
    pub algorithm: Algorithm,
    pub labels: u8,
    pub original_ttl: u32,
    /// Absolute expiration, seconds since the epoch.
    pub expiration: u32,
    /// Absolute inception, seconds since the epoch.
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

impl Rrsig {
    /// RRSIG RDATA up to and excluding the signature field; this prefix is
    /// what gets signed together with the canonical RRset.
    pub fn rdata_without_signature(&self) -> Result<Vec<u8>> {
        let mut rdata = Vec::with_capacity(18 + self.signer_name.len() + 2);
        rdata.extend_from_slice(&self.type_covered.to_u16().to_be_bytes());
        rdata.push(self.algorithm.to_u8());
        rdata.push(self.labels);
        rdata.extend_from_slice(&self.original_ttl.to_be_bytes());
        rdata.extend_from_slice(&self.expiration.to_be_bytes());
        rdata.extend_from_slice(&self.inception.to_be_bytes());
        rdata.extend_from_slice(&self.key_tag.to_be_bytes());
        rdata.extend_from_slice(&canonical::encode_name(&self.signer_name)?);
        Ok(rdata)
    }

    /// Full RRSIG RDATA including the signature.
    pub fn rdata(&self) -> Result<Vec<u8>> {
        let mut rdata = self.rdata_without_signature()?;
        rdata.extend_from_slice(&self.signature);
        Ok(rdata)
    }

    /// Presentation format for the record store's `data` field, with the
    /// signature in base64 as zone files expect.
    pub fn presentation(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {}. {}",
            self.type_covered,
            self.algorithm.to_u8(),
            self.labels,
            self.original_ttl,
            sig_time(self.expiration),
            sig_time(self.inception),
            self.key_tag,
            self.signer_name.trim_end_matches('.'),
            base64::engine::general_purpose::STANDARD.encode(&self.signature)
        )
    }
}

/// `YYYYMMDDHHmmSS` signature timestamps (RFC 4034 section 3.2).
fn sig_time(epoch: u32) -> String {
    DateTime::from_timestamp(i64::from(epoch), 0)
        .map(|t| t.format("%Y%m%d%H%M%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

/// An inception/expiration window for a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureValidity {
    pub inception: u32,
    pub expiration: u32,
}

impl SignatureValidity {
    /// The policy default window anchored at `now`.
    pub fn window(now: u32, config: &SigningConfig) -> Self {
        Self {
            inception: now.saturating_sub(config.inception_backdate_secs as u32),
            expiration: now.saturating_add(config.signature_validity_secs as u32),
        }
    }
}

/// Builds, signs, and verifies RRSIGs.
///
/// Signing uses the key's private material through openssl; verification
/// only ever needs DNSKEY wire-format public bytes and goes through ring.
/// Both directions are pure functions over their inputs and safe to run in
/// parallel across zones.
pub struct SignatureEngine {
    config: Arc<SigningConfig>,
    /// Fixed clock for verification tests.
    current_time: Option<u32>,
}

impl SignatureEngine {
    pub fn new(config: Arc<SigningConfig>) -> Self {
        Self {
            config,
            current_time: None,
        }
    }

    /// Pin the engine clock (test fixtures).
    pub fn set_current_time(&mut self, time: u32) {
        self.current_time = Some(time);
    }

    fn now(&self) -> u32 {
        self.current_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }

    /// Sign an RRset with one key, returning the completed RRSIG.
    ///
    /// `signer_name` is the zone apex the key belongs to. With no explicit
    /// `validity` the policy window anchored at the engine clock applies.
    pub fn sign_rrset(
        &self,
        owner: &str,
        records: &[ResourceRecord],
        key: &SigningKey,
        signer_name: &str,
        validity: Option<SignatureValidity>,
    ) -> Result<Rrsig> {
        if !key.active {
            return Err(DnssecError::KeyNotActive(format!(
                "key {} (tag {}) for zone {} is not active",
                key.id, key.key_tag, key.zone
            )));
        }
        if key.algorithm.is_deprecated() && !self.config.allow_deprecated_algorithms {
            return Err(DnssecError::UnsupportedAlgorithm(key.algorithm.to_u8()));
        }
        let Some(first) = records.first() else {
            return Err(DnssecError::MalformedRecord {
                name: owner.to_string(),
                rtype: "-".to_string(),
                reason: "empty RRset".to_string(),
            });
        };

        let validity = validity.unwrap_or_else(|| SignatureValidity::window(self.now(), &self.config));
        if validity.inception > validity.expiration {
            return Err(DnssecError::ClockSkew {
                inception: validity.inception,
                expiration: validity.expiration,
            });
        }

        let mut rrsig = Rrsig {
            type_covered: first.rtype,
            algorithm: key.algorithm,
            labels: canonical::label_count(owner),
            original_ttl: first.ttl,
            expiration: validity.expiration,
            inception: validity.inception,
            key_tag: key.key_tag,
            signer_name: signer_name.trim_end_matches('.').to_ascii_lowercase(),
            signature: Vec::new(),
        };

        let mut signed = rrsig.rdata_without_signature()?;
        signed.extend_from_slice(&canonical::rrset_bytes(
            owner,
            first.rtype,
            first.class,
            rrsig.original_ttl,
            records,
        )?);
        rrsig.signature = sign_bytes(key, &signed)?;

        debug!(
            owner,
            rtype = %rrsig.type_covered,
            key_tag = key.key_tag,
            expiration = rrsig.expiration,
            "signed RRset"
        );
        Ok(rrsig)
    }

    /// Verify an RRSIG over an RRset against a DNSKEY public key.
    ///
    /// The signed bytes are reconstructed from the RRSIG's own fields — the
    /// algorithm and original TTL come from the record, not from any caller
    /// assumption. Returns `Ok(false)` for a cryptographically invalid
    /// signature; errors are reserved for structural problems and for the
    /// validity window when enforcement is on.
    pub fn verify_rrset(
        &self,
        owner: &str,
        records: &[ResourceRecord],
        rrsig: &Rrsig,
        public_key: &[u8],
    ) -> Result<bool> {
        if !rrsig.algorithm.is_supported()
            && !(rrsig.algorithm.is_deprecated() && self.config.allow_deprecated_algorithms)
        {
            return Err(DnssecError::UnsupportedAlgorithm(rrsig.algorithm.to_u8()));
        }
        let Some(first) = records.first() else {
            return Err(DnssecError::MalformedRecord {
                name: owner.to_string(),
                rtype: "-".to_string(),
                reason: "empty RRset".to_string(),
            });
        };

        if self.config.enforce_validity_window {
            let now = self.now();
            if now < rrsig.inception {
                return Err(DnssecError::NotYetValid {
                    inception: rrsig.inception,
                    now,
                });
            }
            if now > rrsig.expiration {
                return Err(DnssecError::Expired {
                    expiration: rrsig.expiration,
                    now,
                });
            }
        }

        // A label count below the owner's means the signature covers the
        // wildcard expansion (RFC 4035 section 5.3.2).
        let owner_name = wildcard_owner(owner, rrsig.labels);
        trace!(owner = %owner_name, key_tag = rrsig.key_tag, "rebuilding signed data");

        let mut signed = rrsig.rdata_without_signature()?;
        signed.extend_from_slice(&canonical::rrset_bytes(
            &owner_name,
            rrsig.type_covered,
            first.class,
            rrsig.original_ttl,
            records,
        )?);

        let ok = verify_bytes(rrsig.algorithm, public_key, &signed, &rrsig.signature)?;
        if !ok {
            warn!(owner, key_tag = rrsig.key_tag, "signature verification failed");
        }
        Ok(ok)
    }
}

fn wildcard_owner(owner: &str, rrsig_labels: u8) -> String {
    let labels: Vec<&str> = owner
        .trim_end_matches('.')
        .split('.')
        .filter(|l| !l.is_empty())
        .collect();
    if usize::from(rrsig_labels) >= labels.len() {
        return owner.to_string();
    }
    let suffix = &labels[labels.len() - usize::from(rrsig_labels)..];
    format!("*.{}", suffix.join("."))
}

/// Sign raw bytes with the key's private material.
///
/// ECDSA signatures leave openssl in DER and are rewritten to the
/// fixed-width `r || s` wire form (RFC 6605); RSA is PKCS#1 v1.5.
fn sign_bytes(key: &SigningKey, data: &[u8]) -> Result<Vec<u8>> {
    let pkey = PKey::private_key_from_pem(key.private_key.pem().as_bytes())?;
    match key.algorithm {
        Algorithm::RsaSha1 | Algorithm::RsaSha1Nsec3Sha1 => {
            rsa_sign(MessageDigest::sha1(), &pkey, data)
        }
        Algorithm::RsaSha256 => rsa_sign(MessageDigest::sha256(), &pkey, data),
        Algorithm::RsaSha512 => rsa_sign(MessageDigest::sha512(), &pkey, data),
        Algorithm::EcdsaP256Sha256 => ecdsa_sign(MessageDigest::sha256(), &pkey, data, 32),
        Algorithm::EcdsaP384Sha384 => ecdsa_sign(MessageDigest::sha384(), &pkey, data, 48),
        Algorithm::Ed25519 => {
            let mut signer = Signer::new_without_digest(&pkey)?;
            Ok(signer.sign_oneshot_to_vec(data)?)
        }
        other => Err(DnssecError::UnsupportedAlgorithm(other.to_u8())),
    }
}

fn rsa_sign(
    digest: MessageDigest,
    pkey: &PKey<openssl::pkey::Private>,
    data: &[u8],
) -> Result<Vec<u8>> {
    let mut signer = Signer::new(digest, pkey)?;
    signer.update(data)?;
    Ok(signer.sign_to_vec()?)
}

fn ecdsa_sign(
    digest: MessageDigest,
    pkey: &PKey<openssl::pkey::Private>,
    data: &[u8],
    coord_len: i32,
) -> Result<Vec<u8>> {
    let mut signer = Signer::new(digest, pkey)?;
    signer.update(data)?;
    let der = signer.sign_to_vec()?;
    let sig = EcdsaSig::from_der(&der)?;
    let mut wire = sig.r().to_vec_padded(coord_len)?;
    wire.extend_from_slice(&sig.s().to_vec_padded(coord_len)?);
    Ok(wire)
}

/// Verify raw signed bytes against a DNSKEY wire-format public key.
fn verify_bytes(
    algorithm: Algorithm,
    public_key: &[u8],
    signed: &[u8],
    signature: &[u8],
) -> Result<bool> {
    match algorithm {
        Algorithm::RsaSha1 | Algorithm::RsaSha1Nsec3Sha1 => rsa_verify(
            &ring_sig::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
            public_key,
            signed,
            signature,
        ),
        Algorithm::RsaSha256 => rsa_verify(
            &ring_sig::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
            public_key,
            signed,
            signature,
        ),
        Algorithm::RsaSha512 => rsa_verify(
            &ring_sig::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
            public_key,
            signed,
            signature,
        ),
        Algorithm::EcdsaP256Sha256 | Algorithm::EcdsaP384Sha384 => {
            let params: &'static dyn ring_sig::VerificationAlgorithm =
                if algorithm == Algorithm::EcdsaP256Sha256 {
                    &ring_sig::ECDSA_P256_SHA256_FIXED
                } else {
                    &ring_sig::ECDSA_P384_SHA384_FIXED
                };
            // ring expects the uncompressed-point prefix the DNSKEY omits.
            let mut point = Vec::with_capacity(public_key.len() + 1);
            point.push(0x04);
            point.extend_from_slice(public_key);
            Ok(ring_sig::UnparsedPublicKey::new(params, &point)
                .verify(signed, signature)
                .is_ok())
        }
        Algorithm::Ed25519 => Ok(
            ring_sig::UnparsedPublicKey::new(&ring_sig::ED25519, public_key)
                .verify(signed, signature)
                .is_ok(),
        ),
        other => Err(DnssecError::UnsupportedAlgorithm(other.to_u8())),
    }
}

/// Split an RFC 3110 RSA public key into exponent and modulus.
fn rsa_components(public_key: &[u8]) -> Result<(&[u8], &[u8])> {
    let invalid = || DnssecError::KeyMaterialInvalid("truncated RSA public key".to_string());
    if public_key.len() <= 3 {
        return Err(invalid());
    }
    let (offset, exp_len) = match public_key[0] {
        0 => (
            3,
            (usize::from(public_key[1]) << 8) | usize::from(public_key[2]),
        ),
        len => (1, usize::from(len)),
    };
    if exp_len == 0 || public_key.len() <= offset + exp_len {
        return Err(invalid());
    }
    Ok(public_key[offset..].split_at(exp_len))
}

fn rsa_verify(
    params: &'static ring_sig::RsaParameters,
    public_key: &[u8],
    signed: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let (e, n) = rsa_components(public_key)?;
    let key = ring_sig::RsaPublicKeyComponents { n, e };
    Ok(key.verify(params, signed, signature).is_ok())
}
