pub mod algorithm;
pub mod canonical;
pub mod digest;
pub mod key_tag;
pub mod keys;
pub mod keystore;
pub mod nsec3;
pub mod signer;

pub use algorithm::Algorithm;
pub use digest::{ds_digest, DigestType, DsRecord};
pub use key_tag::calculate_key_tag;
pub use keys::{KeyInfo, KeyRole, SigningKey};
pub use keystore::KeyStore;
pub use nsec3::Nsec3Param;
pub use signer::{Rrsig, SignatureEngine, SignatureValidity};

/// DNSSEC constants
pub mod constants {
    /// DNSKEY protocol field, always 3 (RFC 4034)
    pub const DNSKEY_PROTOCOL: u8 = 3;

    /// DNSKEY flags for a zone-signing key
    pub const FLAGS_ZSK: u16 = 256;

    /// DNSKEY flags for a key-signing key (zone key + SEP bit)
    pub const FLAGS_KSK: u16 = 257;
}
