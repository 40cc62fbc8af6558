use super::Algorithm;

/// Calculate the key tag for a DNSKEY (RFC 4034 Appendix B).
///
/// The tag is a checksum over the DNSKEY RDATA, summed as big-endian 16-bit
/// words with the carry folded back in. Algorithm 1 instead takes the
/// historical value from the last two octets of the public key. The tag is
/// always derived here from the key material; callers never supply one.
pub fn calculate_key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    if Algorithm::from_u8(algorithm).is_some_and(|a| a.legacy_key_tag()) {
        return match public_key {
            [.., hi, lo] => u16::from_be_bytes([*hi, *lo]),
            _ => 0,
        };
    }

    let mut rdata = Vec::with_capacity(4 + public_key.len());
    rdata.extend_from_slice(&flags.to_be_bytes());
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(public_key);

    let mut acc: u32 = 0;
    for pair in rdata.chunks(2) {
        let hi = u32::from(pair[0]) << 8;
        let lo = pair.get(1).copied().map(u32::from).unwrap_or(0);
        acc = acc.wrapping_add(hi + lo);
    }
    acc += acc >> 16;
    (acc & 0xffff) as u16
}
