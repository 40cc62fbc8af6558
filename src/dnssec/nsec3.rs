use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::canonical;
use crate::error::{DnssecError, Result};

/// NSEC3 hash algorithm number; SHA-1 is the only one defined (RFC 5155).
pub const NSEC3_HASH_SHA1: u8 = 1;

/// NSEC3 hashing parameters, shared between the persisted NSEC3PARAM record
/// and the hash generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nsec3Param {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

impl Nsec3Param {
    pub fn new(salt: Vec<u8>, iterations: u16) -> Self {
        Self {
            hash_algorithm: NSEC3_HASH_SHA1,
            flags: 0,
            iterations,
            salt,
        }
    }

    /// Presentation format for the record store's `data` field, e.g.
    /// `1 0 1 aabbccdd` (`-` for an empty salt).
    pub fn presentation(&self) -> String {
        let salt = if self.salt.is_empty() {
            "-".to_string()
        } else {
            hex::encode(&self.salt)
        };
        format!(
            "{} {} {} {}",
            self.hash_algorithm, self.flags, self.iterations, salt
        )
    }
}

/// Generate a random NSEC3 salt of the given length.
pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Hash an owner name for NSEC3 (RFC 5155 section 5).
///
/// `H0 = SHA1(canonical_wire_name || salt)`, then
/// `Hi = SHA1(H(i-1) || salt)` for each additional iteration. The result is
/// the final digest rendered as lower-case base32hex without padding, ready
/// for use as an NSEC3 owner label. Iterations above `iteration_cap` are
/// refused to bound CPU cost.
pub fn hash_owner_name(name: &str, param: &Nsec3Param, iteration_cap: u16) -> Result<String> {
    if param.iterations > iteration_cap {
        return Err(DnssecError::IterationCountTooHigh {
            requested: param.iterations,
            max: iteration_cap,
        });
    }

    use ring::digest;
    let mut input = canonical::encode_name(name)?;
    input.extend_from_slice(&param.salt);
    let mut hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &input);

    for _ in 0..param.iterations {
        let mut next = hash.as_ref().to_vec();
        next.extend_from_slice(&param.salt);
        hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &next);
    }

    Ok(base32::encode(
        base32::Alphabet::Rfc4648Hex { padding: false },
        hash.as_ref(),
    )
    .to_ascii_lowercase())
}
