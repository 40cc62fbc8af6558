use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DnssecError, Result};

/// Signing policy configuration.
///
/// Values come from `Default`, a TOML file, or `TYR_*` environment
/// variables, in that order of precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// How long a fresh RRSIG stays valid (default 30 days).
    pub signature_validity_secs: u64,

    /// Seconds to backdate signature inception to absorb resolver clock
    /// skew (default 0: inception = now).
    pub inception_backdate_secs: u64,

    /// TTL for derived DNSKEY/DS/NSEC3PARAM/RRSIG records handed to the
    /// record store.
    pub default_record_ttl: u32,

    /// NSEC3 iteration count used when deriving a zone's NSEC3PARAM.
    pub nsec3_iterations: u16,

    /// Hard cap on NSEC3 iterations accepted for hashing.
    pub nsec3_max_iterations: u16,

    /// Length in bytes of generated NSEC3 salts.
    pub nsec3_salt_length: usize,

    /// Digest type for derived DS records (2 = SHA-256).
    pub ds_digest_type: u8,

    /// Accept deprecated algorithms (RSA/MD5, DSA, GOST) for signing.
    pub allow_deprecated_algorithms: bool,

    /// Enforce the inception/expiration window during verification. Test
    /// fixtures with a fixed clock can turn this off.
    pub enforce_validity_window: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            signature_validity_secs: 30 * 24 * 3600,
            inception_backdate_secs: 0,
            default_record_ttl: 3600,
            nsec3_iterations: 1,
            nsec3_max_iterations: 150,
            nsec3_salt_length: 8,
            ds_digest_type: 2,
            allow_deprecated_algorithms: false,
            enforce_validity_window: true,
        }
    }
}

impl SigningConfig {
    pub fn signature_validity(&self) -> Duration {
        Duration::from_secs(self.signature_validity_secs)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DnssecError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        toml::from_str(&raw).map_err(|e| DnssecError::Config(e.to_string()))
    }

    /// Apply `TYR_*` environment variable overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok()?.parse().ok()
        }

        if let Some(v) = parse_env("TYR_SIGNATURE_VALIDITY_SECS") {
            self.signature_validity_secs = v;
        }
        if let Some(v) = parse_env("TYR_INCEPTION_BACKDATE_SECS") {
            self.inception_backdate_secs = v;
        }
        if let Some(v) = parse_env("TYR_DEFAULT_RECORD_TTL") {
            self.default_record_ttl = v;
        }
        if let Some(v) = parse_env("TYR_NSEC3_ITERATIONS") {
            self.nsec3_iterations = v;
        }
        if let Some(v) = parse_env("TYR_NSEC3_MAX_ITERATIONS") {
            self.nsec3_max_iterations = v;
        }
        if let Some(v) = parse_env("TYR_NSEC3_SALT_LENGTH") {
            self.nsec3_salt_length = v;
        }
        if let Some(v) = parse_env("TYR_DS_DIGEST_TYPE") {
            self.ds_digest_type = v;
        }
        if let Some(v) = parse_env("TYR_ALLOW_DEPRECATED_ALGORITHMS") {
            self.allow_deprecated_algorithms = v;
        }
        if let Some(v) = parse_env("TYR_ENFORCE_VALIDITY_WINDOW") {
            self.enforce_validity_window = v;
        }
        self
    }
}
