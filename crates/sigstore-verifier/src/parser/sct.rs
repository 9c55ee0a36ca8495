//! Signed Certificate Timestamp extraction and pre-certificate reconstruction.
//!
//! Covers the two non-trivial pieces of component B: pulling the SCT list
//! out of the leaf's X.509 extensions (RFC 6962 §3.3) and reproducing the
//! TBSCertificate bytes a CT log actually signed over (§3.2), with the SCT
//! list extension stripped back out.

use der::{Decode, Encode};
use x509_cert::der::oid::ObjectIdentifier;
use x509_parser::prelude::{X509Certificate, X509Extension};

use crate::error::CertificateError;

/// `1.3.6.1.4.1.11129.2.4.2`, the SCT list X.509v3 extension.
const OID_SCT_LIST: &[u64] = &[1, 3, 6, 1, 4, 1, 11129, 2, 4, 2];

/// One entry from a leaf's embedded `SignedCertificateTimestampList`.
#[derive(Debug, Clone)]
pub struct Sct {
    pub version: u8,
    pub log_id: [u8; 32],
    pub timestamp: u64,
    pub extensions: Vec<u8>,
    pub hash_algorithm: u8,
    pub signature_algorithm: u8,
    pub signature: Vec<u8>,
}

/// Extract and parse every SCT in the leaf's SCT-list extension.
///
/// Returns [`CertificateError::MissingSct`] if the extension is absent.
pub fn extract_scts(cert: &X509Certificate) -> Result<Vec<Sct>, CertificateError> {
    let ext = cert
        .extensions()
        .iter()
        .find(|ext| oid_is_sct_list(ext))
        .ok_or(CertificateError::MissingSct)?;

    let list_bytes = unwrap_octet_string(ext.value)
        .ok_or_else(|| CertificateError::ParseError("malformed SCT list octet string".into()))?;

    parse_sct_list(list_bytes)
}

fn oid_is_sct_list(ext: &X509Extension) -> bool {
    match ext.oid.iter() {
        Some(mut arcs) => OID_SCT_LIST.iter().all(|&want| arcs.next() == Some(want)),
        None => false,
    }
}

/// The SCT list extension's value is, per RFC 6962 §3.3, an OCTET STRING
/// whose content is itself a DER OCTET STRING wrapping the length-prefixed
/// SCT list. `x509_parser` has already unwrapped the outer layer, so this
/// unwraps the inner one.
fn unwrap_octet_string(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() < 2 || bytes[0] != 0x04 {
        return None;
    }
    let (len, header_len) = read_der_length(&bytes[1..])?;
    let start = 1 + header_len;
    bytes.get(start..start + len)
}

fn read_der_length(bytes: &[u8]) -> Option<(usize, usize)> {
    let first = *bytes.first()?;
    if first & 0x80 == 0 {
        Some((first as usize, 1))
    } else {
        let num_bytes = (first & 0x7f) as usize;
        if num_bytes == 0 || num_bytes > 4 || bytes.len() < 1 + num_bytes {
            return None;
        }
        let mut len = 0usize;
        for &b in &bytes[1..1 + num_bytes] {
            len = (len << 8) | b as usize;
        }
        Some((len, 1 + num_bytes))
    }
}

fn parse_sct_list(bytes: &[u8]) -> Result<Vec<Sct>, CertificateError> {
    if bytes.len() < 2 {
        return Err(CertificateError::ParseError("truncated SCT list".into()));
    }
    let total_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    let mut remaining = bytes
        .get(2..2 + total_len)
        .ok_or_else(|| CertificateError::ParseError("SCT list length overruns extension".into()))?;

    let mut scts = Vec::new();
    while !remaining.is_empty() {
        if remaining.len() < 2 {
            return Err(CertificateError::ParseError("truncated SCT entry length".into()));
        }
        let entry_len = u16::from_be_bytes([remaining[0], remaining[1]]) as usize;
        let entry = remaining
            .get(2..2 + entry_len)
            .ok_or_else(|| CertificateError::ParseError("truncated SCT entry".into()))?;
        scts.push(parse_sct(entry)?);
        remaining = &remaining[2 + entry_len..];
    }

    if scts.is_empty() {
        return Err(CertificateError::MissingSct);
    }
    Ok(scts)
}

fn parse_sct(bytes: &[u8]) -> Result<Sct, CertificateError> {
    let malformed = || CertificateError::ParseError("malformed SCT entry".into());

    if bytes.len() < 1 + 32 + 8 + 2 {
        return Err(malformed());
    }
    let version = bytes[0];
    let mut log_id = [0u8; 32];
    log_id.copy_from_slice(&bytes[1..33]);
    let timestamp = u64::from_be_bytes(bytes[33..41].try_into().map_err(|_| malformed())?);

    let ext_len = u16::from_be_bytes([bytes[41], bytes[42]]) as usize;
    let ext_start = 43;
    let ext_end = ext_start + ext_len;
    let extensions = bytes.get(ext_start..ext_end).ok_or_else(malformed)?.to_vec();

    let sig_header = bytes.get(ext_end..ext_end + 4).ok_or_else(malformed)?;
    let hash_algorithm = sig_header[0];
    let signature_algorithm = sig_header[1];
    let sig_len = u16::from_be_bytes([sig_header[2], sig_header[3]]) as usize;
    let sig_start = ext_end + 4;
    let signature = bytes
        .get(sig_start..sig_start + sig_len)
        .ok_or_else(malformed)?
        .to_vec();

    Ok(Sct {
        version,
        log_id,
        timestamp,
        extensions,
        hash_algorithm,
        signature_algorithm,
        signature,
    })
}

/// Build the exact byte sequence a CT log signs over for a given SCT: the
/// RFC 6962 §3.2 `digitally-signed` struct for a precertificate entry.
pub fn sct_signed_data(sct: &Sct, issuer_key_hash: &[u8; 32], tbs_without_sct: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(15 + 32 + 3 + tbs_without_sct.len() + 2 + sct.extensions.len());
    data.push(sct.version);
    data.push(0); // signature_type: certificate_timestamp
    data.extend_from_slice(&sct.timestamp.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes()); // entry_type: precert_entry
    data.extend_from_slice(issuer_key_hash);

    let tbs_len = tbs_without_sct.len() as u32;
    data.push((tbs_len >> 16) as u8);
    data.push((tbs_len >> 8) as u8);
    data.push(tbs_len as u8);
    data.extend_from_slice(tbs_without_sct);

    data.extend_from_slice(&(sct.extensions.len() as u16).to_be_bytes());
    data.extend_from_slice(&sct.extensions);
    data
}

/// Reproduce the TBSCertificate bytes with the SCT-list extension removed,
/// re-encoded in canonical DER. This is what the CT log actually signed,
/// before Fulcio stitched the SCT list back into the final certificate.
pub fn without_sct(leaf_der: &[u8]) -> Result<Vec<u8>, CertificateError> {
    let mut cert = x509_cert::Certificate::from_der(leaf_der)
        .map_err(|e| CertificateError::ParseError(e.to_string()))?;

    let sct_oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.2");
    if let Some(extensions) = cert.tbs_certificate.extensions.as_mut() {
        extensions.retain(|ext| ext.extn_id != sct_oid);
    }

    cert.tbs_certificate
        .to_der()
        .map_err(|e| CertificateError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_der_length_short_form() {
        assert_eq!(read_der_length(&[0x05, 0xAA]), Some((5, 1)));
    }

    #[test]
    fn test_read_der_length_long_form() {
        // 0x82 => two length bytes follow, value 0x0100 = 256
        assert_eq!(read_der_length(&[0x82, 0x01, 0x00]), Some((256, 3)));
    }

    #[test]
    fn test_parse_sct_list_rejects_empty() {
        let result = parse_sct_list(&[0x00, 0x00]);
        assert!(matches!(result, Err(CertificateError::MissingSct)));
    }

    #[test]
    fn test_sct_signed_data_layout() {
        let sct = Sct {
            version: 0,
            log_id: [1u8; 32],
            timestamp: 1_700_000_000,
            extensions: Vec::new(),
            hash_algorithm: 4,
            signature_algorithm: 3,
            signature: Vec::new(),
        };
        let issuer_key_hash = [2u8; 32];
        let tbs = b"fake-tbs-bytes";
        let signed = sct_signed_data(&sct, &issuer_key_hash, tbs);

        assert_eq!(signed[0], 0); // version
        assert_eq!(signed[1], 0); // signature_type
        assert_eq!(&signed[10..12], &1u16.to_be_bytes()); // entry_type = precert
        assert_eq!(&signed[12..44], &issuer_key_hash);
        assert_eq!(&signed[47..47 + tbs.len()], tbs);
    }
}
