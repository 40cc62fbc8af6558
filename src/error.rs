use thiserror::Error;

/// Errors produced by the DNSSEC core.
///
/// All variants are deterministic given their inputs; none are retried
/// internally. A signature that fails cryptographic verification is reported
/// as `Ok(false)` by the engine, never as an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DnssecError {
    #[error("unsupported DNSSEC algorithm: {0}")]
    UnsupportedAlgorithm(u8),

    #[error("invalid key size {bits} for algorithm {algorithm}")]
    InvalidKeySize { algorithm: String, bits: u32 },

    #[error("record {name} {rtype} cannot be canonicalized: {reason}")]
    MalformedRecord {
        name: String,
        rtype: String,
        reason: String,
    },

    #[error("no usable signing key: {0}")]
    KeyNotActive(String),

    #[error("signature inception {inception} is after expiration {expiration}")]
    ClockSkew { inception: u32, expiration: u32 },

    #[error("signature expired at {expiration} (now {now})")]
    Expired { expiration: u32, now: u32 },

    #[error("signature not valid before {inception} (now {now})")]
    NotYetValid { inception: u32, now: u32 },

    #[error("unsupported DS digest type: {0}")]
    UnsupportedDigestType(u8),

    #[error("NSEC3 iteration count {requested} exceeds the policy maximum {max}")]
    IterationCountTooHigh { requested: u16, max: u16 },

    #[error("key material is invalid: {0}")]
    KeyMaterialInvalid(String),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<openssl::error::ErrorStack> for DnssecError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        DnssecError::KeyMaterialInvalid(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DnssecError>;
