use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use base64::Engine;

use crate::error::{DnssecError, Result};
use crate::record::{RecordClass, RecordType, ResourceRecord};

/// Canonical RRset serialization per RFC 4034 section 3.1.8.1.
///
/// The output of `rrset_bytes` is the exact byte sequence a signature
/// covers: lower-cased uncompressed owner name, the RRSIG's original TTL
/// substituted for every record, RDATA in canonical wire form, records
/// sorted by RDATA with exact duplicates collapsed.

/// Encode a domain name in canonical (lower-cased, uncompressed) wire form.
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let trimmed = name.trim().trim_end_matches('.');
    let mut wire = Vec::with_capacity(trimmed.len() + 2);
    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(name_error(name, "empty label"));
            }
            if label.len() > 63 {
                return Err(name_error(name, "label exceeds 63 octets"));
            }
            wire.push(label.len() as u8);
            wire.extend(label.bytes().map(|b| b.to_ascii_lowercase()));
        }
    }
    wire.push(0);
    if wire.len() > 255 {
        return Err(name_error(name, "name exceeds 255 octets"));
    }
    Ok(wire)
}

/// Number of labels in a name, excluding the root and a leading wildcard
/// (the RRSIG Labels field, RFC 4034 section 3.1.3).
pub fn label_count(name: &str) -> u8 {
    name.trim_end_matches('.')
        .split('.')
        .filter(|l| !l.is_empty() && *l != "*")
        .count() as u8
}

fn name_error(name: &str, reason: &str) -> DnssecError {
    DnssecError::MalformedRecord {
        name: name.to_string(),
        rtype: "-".to_string(),
        reason: reason.to_string(),
    }
}

fn malformed(record: &ResourceRecord, reason: impl Into<String>) -> DnssecError {
    DnssecError::MalformedRecord {
        name: record.name.clone(),
        rtype: record.rtype.to_string(),
        reason: reason.into(),
    }
}

/// Serialize an RRset into the byte sequence covered by a signature.
///
/// Every record must share `owner`, `rtype`, and `class`; `original_ttl`
/// replaces each record's stored TTL. The input order of `records` does not
/// affect the output.
pub fn rrset_bytes(
    owner: &str,
    rtype: RecordType,
    class: RecordClass,
    original_ttl: u32,
    records: &[ResourceRecord],
) -> Result<Vec<u8>> {
    if rtype == RecordType::RRSIG {
        return Err(name_error(owner, "RRSIG rrsets are not themselves signed"));
    }
    let owner_wire = encode_name(owner)?;

    let mut rdatas = Vec::with_capacity(records.len());
    for record in records {
        if record.rtype != rtype {
            return Err(malformed(record, format!("type mismatch in {} RRset", rtype)));
        }
        rdatas.push(encode_rdata(record)?);
    }
    rdatas.sort();
    rdatas.dedup();

    let mut out = Vec::new();
    for rdata in &rdatas {
        out.extend_from_slice(&owner_wire);
        out.extend_from_slice(&rtype.to_u16().to_be_bytes());
        out.extend_from_slice(&class.to_u16().to_be_bytes());
        out.extend_from_slice(&original_ttl.to_be_bytes());
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(rdata);
    }
    Ok(out)
}

/// Encode a record's RDATA in canonical wire form.
///
/// Domain names embedded in RDATA are lower-cased and never compressed.
pub fn encode_rdata(record: &ResourceRecord) -> Result<Vec<u8>> {
    match record.rtype {
        RecordType::A => encode_a(record),
        RecordType::AAAA => encode_aaaa(record),
        RecordType::NS | RecordType::CNAME | RecordType::PTR => encode_name_rdata(record),
        RecordType::SOA => encode_soa(record),
        RecordType::MX => encode_mx(record),
        RecordType::TXT => Ok(encode_txt(record)),
        RecordType::SRV => encode_srv(record),
        RecordType::CAA => encode_caa(record),
        RecordType::TLSA => encode_tlsa(record),
        RecordType::DS => encode_ds(record),
        RecordType::DNSKEY => encode_dnskey(record),
        RecordType::NSEC => encode_nsec(record),
        RecordType::NSEC3 => encode_nsec3(record),
        RecordType::NSEC3PARAM => encode_nsec3param(record),
        RecordType::RRSIG => Err(malformed(record, "RRSIG records are never signed over")),
    }
}

fn encode_a(record: &ResourceRecord) -> Result<Vec<u8>> {
    let addr: Ipv4Addr = record
        .data
        .trim()
        .parse()
        .map_err(|_| malformed(record, "invalid IPv4 address"))?;
    Ok(addr.octets().to_vec())
}

fn encode_aaaa(record: &ResourceRecord) -> Result<Vec<u8>> {
    let addr: Ipv6Addr = record
        .data
        .trim()
        .parse()
        .map_err(|_| malformed(record, "invalid IPv6 address"))?;
    Ok(addr.octets().to_vec())
}

fn encode_name_rdata(record: &ResourceRecord) -> Result<Vec<u8>> {
    if record.data.trim().is_empty() {
        return Err(malformed(record, "missing target name"));
    }
    encode_name(&record.data)
}

fn encode_soa(record: &ResourceRecord) -> Result<Vec<u8>> {
    let rname = record
        .admin
        .as_deref()
        .ok_or_else(|| malformed(record, "missing admin"))?;
    let serial = record.serial.ok_or_else(|| malformed(record, "missing serial"))?;
    let refresh = record.refresh.ok_or_else(|| malformed(record, "missing refresh"))?;
    let retry = record.retry.ok_or_else(|| malformed(record, "missing retry"))?;
    let expire = record.expire.ok_or_else(|| malformed(record, "missing expire"))?;
    let minimum = record.minimum.ok_or_else(|| malformed(record, "missing minimum"))?;

    let mut rdata = encode_name(&record.data)?;
    rdata.extend_from_slice(&encode_name(rname)?);
    for value in [serial, refresh, retry, expire, minimum] {
        rdata.extend_from_slice(&value.to_be_bytes());
    }
    Ok(rdata)
}

fn encode_mx(record: &ResourceRecord) -> Result<Vec<u8>> {
    let priority = record
        .priority
        .ok_or_else(|| malformed(record, "missing priority"))?;
    let mut rdata = priority.to_be_bytes().to_vec();
    rdata.extend_from_slice(&encode_name(&record.data)?);
    Ok(rdata)
}

fn encode_txt(record: &ResourceRecord) -> Vec<u8> {
    let bytes = record.data.as_bytes();
    let mut rdata = Vec::with_capacity(bytes.len() + 1);
    if bytes.is_empty() {
        rdata.push(0);
        return rdata;
    }
    for chunk in bytes.chunks(255) {
        rdata.push(chunk.len() as u8);
        rdata.extend_from_slice(chunk);
    }
    rdata
}

fn encode_srv(record: &ResourceRecord) -> Result<Vec<u8>> {
    let priority = record
        .priority
        .ok_or_else(|| malformed(record, "missing priority"))?;
    let weight = record.weight.ok_or_else(|| malformed(record, "missing weight"))?;
    let port = record.port.ok_or_else(|| malformed(record, "missing port"))?;
    let target = record
        .target
        .as_deref()
        .ok_or_else(|| malformed(record, "missing target"))?;

    let mut rdata = Vec::with_capacity(8 + target.len());
    rdata.extend_from_slice(&priority.to_be_bytes());
    rdata.extend_from_slice(&weight.to_be_bytes());
    rdata.extend_from_slice(&port.to_be_bytes());
    rdata.extend_from_slice(&encode_name(target)?);
    Ok(rdata)
}

fn encode_caa(record: &ResourceRecord) -> Result<Vec<u8>> {
    let tag = record
        .tag
        .as_deref()
        .ok_or_else(|| malformed(record, "missing tag"))?;
    if tag.is_empty() || tag.len() > 255 {
        return Err(malformed(record, "invalid tag length"));
    }
    let mut rdata = vec![record.flag.unwrap_or(0)];
    rdata.push(tag.len() as u8);
    rdata.extend_from_slice(tag.as_bytes());
    rdata.extend_from_slice(record.data.as_bytes());
    Ok(rdata)
}

fn encode_tlsa(record: &ResourceRecord) -> Result<Vec<u8>> {
    // Presentation form: "usage selector matching-type hex-data".
    let fields: Vec<&str> = record.data.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(malformed(record, "expected usage, selector, matching type, data"));
    }
    let usage: u8 = fields[0].parse().map_err(|_| malformed(record, "invalid usage"))?;
    let selector: u8 = fields[1]
        .parse()
        .map_err(|_| malformed(record, "invalid selector"))?;
    let matching: u8 = fields[2]
        .parse()
        .map_err(|_| malformed(record, "invalid matching type"))?;
    let payload = hex::decode(fields[3..].concat())
        .map_err(|_| malformed(record, "invalid hex data"))?;

    let mut rdata = vec![usage, selector, matching];
    rdata.extend_from_slice(&payload);
    Ok(rdata)
}

fn encode_ds(record: &ResourceRecord) -> Result<Vec<u8>> {
    // Presentation form: "key-tag algorithm digest-type hex-digest".
    let fields: Vec<&str> = record.data.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(malformed(record, "expected key tag, algorithm, digest type, digest"));
    }
    let key_tag: u16 = fields[0].parse().map_err(|_| malformed(record, "invalid key tag"))?;
    let algorithm: u8 = fields[1]
        .parse()
        .map_err(|_| malformed(record, "invalid algorithm"))?;
    let digest_type: u8 = fields[2]
        .parse()
        .map_err(|_| malformed(record, "invalid digest type"))?;
    let digest = hex::decode(fields[3..].concat())
        .map_err(|_| malformed(record, "invalid hex digest"))?;

    let mut rdata = key_tag.to_be_bytes().to_vec();
    rdata.push(algorithm);
    rdata.push(digest_type);
    rdata.extend_from_slice(&digest);
    Ok(rdata)
}

fn encode_dnskey(record: &ResourceRecord) -> Result<Vec<u8>> {
    // Presentation form: "flags protocol algorithm base64-key".
    let fields: Vec<&str> = record.data.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(malformed(record, "expected flags, protocol, algorithm, key"));
    }
    let flags: u16 = fields[0].parse().map_err(|_| malformed(record, "invalid flags"))?;
    let protocol: u8 = fields[1]
        .parse()
        .map_err(|_| malformed(record, "invalid protocol"))?;
    let algorithm: u8 = fields[2]
        .parse()
        .map_err(|_| malformed(record, "invalid algorithm"))?;
    let public_key = base64::engine::general_purpose::STANDARD
        .decode(fields[3..].concat())
        .map_err(|_| malformed(record, "invalid base64 key"))?;

    let mut rdata = flags.to_be_bytes().to_vec();
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(&public_key);
    Ok(rdata)
}

fn encode_nsec(record: &ResourceRecord) -> Result<Vec<u8>> {
    // Presentation form: "next-domain type type ...".
    let fields: Vec<&str> = record.data.split_whitespace().collect();
    if fields.is_empty() {
        return Err(malformed(record, "missing next domain name"));
    }
    let mut rdata = encode_name(fields[0])?;
    rdata.extend_from_slice(&type_bitmap(&parse_types(record, &fields[1..])?));
    Ok(rdata)
}

fn encode_nsec3(record: &ResourceRecord) -> Result<Vec<u8>> {
    // Presentation form: "alg flags iterations salt next-hashed type ...".
    let fields: Vec<&str> = record.data.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(malformed(record, "expected alg, flags, iterations, salt, next hash"));
    }
    let mut rdata = encode_nsec3_header(record, &fields[..4])?;
    let hash = base32::decode(
        base32::Alphabet::Rfc4648Hex { padding: false },
        &fields[4].to_ascii_uppercase(),
    )
    .ok_or_else(|| malformed(record, "invalid base32hex next hash"))?;
    rdata.push(hash.len() as u8);
    rdata.extend_from_slice(&hash);
    rdata.extend_from_slice(&type_bitmap(&parse_types(record, &fields[5..])?));
    Ok(rdata)
}

fn encode_nsec3param(record: &ResourceRecord) -> Result<Vec<u8>> {
    // Presentation form: "alg flags iterations salt".
    let fields: Vec<&str> = record.data.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(malformed(record, "expected alg, flags, iterations, salt"));
    }
    encode_nsec3_header(record, &fields[..4])
}

fn encode_nsec3_header(record: &ResourceRecord, fields: &[&str]) -> Result<Vec<u8>> {
    let algorithm: u8 = fields[0]
        .parse()
        .map_err(|_| malformed(record, "invalid hash algorithm"))?;
    let flags: u8 = fields[1].parse().map_err(|_| malformed(record, "invalid flags"))?;
    let iterations: u16 = fields[2]
        .parse()
        .map_err(|_| malformed(record, "invalid iterations"))?;
    let salt = if fields[3] == "-" {
        Vec::new()
    } else {
        hex::decode(fields[3]).map_err(|_| malformed(record, "invalid salt"))?
    };

    let mut rdata = vec![algorithm, flags];
    rdata.extend_from_slice(&iterations.to_be_bytes());
    rdata.push(salt.len() as u8);
    rdata.extend_from_slice(&salt);
    Ok(rdata)
}

fn parse_types(record: &ResourceRecord, fields: &[&str]) -> Result<Vec<RecordType>> {
    fields
        .iter()
        .map(|f| RecordType::from_str(f).map_err(|_| malformed(record, "unknown type in bitmap")))
        .collect()
}

/// Build an RFC 4034 section 4.1.2 type bitmap from a set of record types.
pub fn type_bitmap(types: &[RecordType]) -> Vec<u8> {
    let mut codes: Vec<u16> = types.iter().map(|t| t.to_u16()).collect();
    codes.sort_unstable();
    codes.dedup();

    let mut out = Vec::new();
    let mut window: Option<u8> = None;
    let mut bits = [0u8; 32];
    let mut high = 0usize;

    fn flush(out: &mut Vec<u8>, window: u8, bits: &[u8; 32], high: usize) {
        out.push(window);
        out.push((high + 1) as u8);
        out.extend_from_slice(&bits[..=high]);
    }

    for code in codes {
        let win = (code >> 8) as u8;
        if window != Some(win) {
            if let Some(prev) = window {
                flush(&mut out, prev, &bits, high);
            }
            window = Some(win);
            bits = [0u8; 32];
            high = 0;
        }
        let low = (code & 0xff) as usize;
        bits[low / 8] |= 0x80 >> (low % 8);
        high = high.max(low / 8);
    }
    if let Some(prev) = window {
        flush(&mut out, prev, &bits, high);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_record(name: &str, ttl: u32, addr: &str) -> ResourceRecord {
        ResourceRecord::new(name, RecordType::A, ttl, addr)
    }

    #[test]
    fn test_encode_name_lowercases_and_terminates() {
        let wire = encode_name("EXAMPLE.Com.").unwrap();
        assert_eq!(wire, b"\x07example\x03com\x00");
        assert_eq!(encode_name(".").unwrap(), vec![0]);
        assert_eq!(encode_name("").unwrap(), vec![0]);
    }

    #[test]
    fn test_encode_name_rejects_long_labels() {
        let long = "a".repeat(64);
        assert!(encode_name(&long).is_err());
    }

    #[test]
    fn test_rrset_bytes_exact_layout() {
        let records = [a_record("example.com.", 99, "93.184.216.34")];
        let bytes = rrset_bytes(
            "example.com.",
            RecordType::A,
            RecordClass::IN,
            3600,
            &records,
        )
        .unwrap();
        let expected: Vec<u8> = [
            b"\x07example\x03com\x00".as_slice(),
            &[0x00, 0x01],             // type A
            &[0x00, 0x01],             // class IN
            &[0x00, 0x00, 0x0e, 0x10], // RRSIG original TTL, not the stored 99
            &[0x00, 0x04],
            &[93, 184, 216, 34],
        ]
        .concat();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_rrset_bytes_order_independent_and_idempotent() {
        let a = a_record("example.com", 300, "192.0.2.1");
        let b = a_record("example.com", 300, "192.0.2.200");
        let forward = rrset_bytes(
            "example.com",
            RecordType::A,
            RecordClass::IN,
            300,
            &[a.clone(), b.clone()],
        )
        .unwrap();
        let reversed =
            rrset_bytes("example.com", RecordType::A, RecordClass::IN, 300, &[b, a.clone()])
                .unwrap();
        assert_eq!(forward, reversed);

        let again =
            rrset_bytes("example.com", RecordType::A, RecordClass::IN, 300, &[a.clone(), a])
                .unwrap();
        // Exact duplicates collapse to a single record.
        assert_eq!(again.len(), forward.len() / 2);
    }

    #[test]
    fn test_owner_case_does_not_change_output() {
        let records = [a_record("www.example.com", 60, "192.0.2.7")];
        let lower =
            rrset_bytes("www.example.com", RecordType::A, RecordClass::IN, 60, &records).unwrap();
        let upper =
            rrset_bytes("WWW.EXAMPLE.COM.", RecordType::A, RecordClass::IN, 60, &records).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_srv_requires_structured_fields() {
        let mut srv = ResourceRecord::new(
            "_sip._tcp.example.com",
            RecordType::SRV,
            300,
            "",
        );
        srv.priority = Some(10);
        srv.weight = Some(5);
        // port and target missing
        let err = encode_rdata(&srv).unwrap_err();
        assert!(matches!(err, DnssecError::MalformedRecord { .. }));

        srv.port = Some(5060);
        srv.target = Some("sip.example.com".to_string());
        let rdata = encode_rdata(&srv).unwrap();
        assert_eq!(&rdata[..6], &[0, 10, 0, 5, 0x13, 0xc4]);
        assert_eq!(&rdata[6..], b"\x03sip\x07example\x03com\x00".as_slice());
    }

    #[test]
    fn test_mx_rdata_lowercases_exchange() {
        let mut mx = ResourceRecord::new("example.com", RecordType::MX, 300, "Mail.Example.Com.");
        mx.priority = Some(10);
        let rdata = encode_rdata(&mx).unwrap();
        assert_eq!(&rdata[..2], &[0, 10]);
        assert_eq!(&rdata[2..], b"\x04mail\x07example\x03com\x00".as_slice());
    }

    #[test]
    fn test_txt_splits_long_data() {
        let txt = ResourceRecord::new("example.com", RecordType::TXT, 300, "x".repeat(300));
        let rdata = encode_rdata(&txt).unwrap();
        assert_eq!(rdata[0], 255);
        assert_eq!(rdata[256], 45);
        assert_eq!(rdata.len(), 302);
    }

    #[test]
    fn test_type_bitmap_matches_rfc4034_example() {
        // RFC 4034 section 4.3: A MX RRSIG NSEC -> "0 6 40 01 00 00 00 03".
        let bitmap = type_bitmap(&[
            RecordType::A,
            RecordType::MX,
            RecordType::RRSIG,
            RecordType::NSEC,
        ]);
        assert_eq!(bitmap, vec![0x00, 0x06, 0x40, 0x01, 0x00, 0x00, 0x00, 0x03]);
    }

    #[test]
    fn test_type_bitmap_multiple_windows() {
        // CAA is type 257 and lands in window 1.
        let bitmap = type_bitmap(&[RecordType::A, RecordType::CAA]);
        assert_eq!(bitmap, vec![0x00, 0x01, 0x40, 0x01, 0x01, 0x40]);
    }

    #[test]
    fn test_label_count_ignores_root_and_wildcard() {
        assert_eq!(label_count("example.com."), 2);
        assert_eq!(label_count("*.example.com"), 2);
        assert_eq!(label_count("www.example.com"), 3);
        assert_eq!(label_count("."), 0);
    }
}
