use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use x509_parser::prelude::*;

use crate::error::CertificateError;
use crate::types::FulcioInstance;

const PEM_LINE_WIDTH: usize = 64;

pub fn parse_der_certificate(der: &[u8]) -> Result<X509Certificate, CertificateError> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| CertificateError::ParseError(e.to_string()))?;
    Ok(cert)
}

pub fn parse_pem_certificate(pem_str: &str) -> Result<Vec<u8>, CertificateError> {
    let parsed = ::pem::parse(pem_str.as_bytes())
        .map_err(|e| CertificateError::ParseError(e.to_string()))?;

    if parsed.tag() != "CERTIFICATE" {
        return Err(CertificateError::ParseError(format!(
            "Expected CERTIFICATE tag, got {}",
            parsed.tag()
        )));
    }

    Ok(parsed.into_contents())
}

/// Split an ordered certificate path into its leaf and intermediate DER
/// entries. The leaf must not be a CA.
pub fn get_leaf(cert_path: &[Vec<u8>]) -> Result<&[u8], CertificateError> {
    let leaf_der = cert_path
        .first()
        .ok_or_else(|| CertificateError::ParseError("empty certificate path".into()))?;
    let leaf = parse_der_certificate(leaf_der)?;
    if leaf.basic_constraints().ok().flatten().map(|bc| bc.value.ca) == Some(true) {
        return Err(CertificateError::BadLeafConstraints(
            "leaf certificate has CA=true".into(),
        ));
    }
    Ok(leaf_der.as_slice())
}

/// All certificates strictly between the leaf and the last entry in the path.
/// Intermediates supplied by the bundle may be incomplete; the trust root
/// fills in the rest during chain building.
pub fn get_intermediates(cert_path: &[Vec<u8>]) -> &[Vec<u8>] {
    if cert_path.len() <= 2 {
        &[]
    } else {
        &cert_path[1..cert_path.len() - 1]
    }
}

/// Canonical PEM encoding of a single DER certificate: LF line endings,
/// 64-column base64 wrapping, and a trailing newline. This must be
/// byte-exact — it feeds the hashed-rekord canonical JSON the log entry is
/// bound to.
pub fn to_pem_bytes(der: &[u8]) -> Vec<u8> {
    let encoded = BASE64.encode(der);
    let mut out = String::from("-----BEGIN CERTIFICATE-----\n");
    for chunk in encoded.as_bytes().chunks(PEM_LINE_WIDTH) {
        out.push_str(std::str::from_utf8(chunk).expect("base64 output is ASCII"));
        out.push('\n');
    }
    out.push_str("-----END CERTIFICATE-----\n");
    out.into_bytes()
}

pub fn extract_issuer_cn(cert: &X509Certificate) -> Result<String, CertificateError> {
    let issuer = cert.issuer();

    for rdn in issuer.iter() {
        for attr in rdn.iter() {
            if attr.attr_type() == &oid_registry::OID_X509_COMMON_NAME {
                return attr
                    .attr_value()
                    .as_str()
                    .map(|s| s.to_string())
                    .map_err(|e| CertificateError::ParseError(e.to_string()));
            }
        }
    }

    Err(CertificateError::ParseError(
        "Common Name not found in issuer".to_string(),
    ))
}

pub fn determine_fulcio_instance(cert: &X509Certificate) -> Result<FulcioInstance, CertificateError> {
    let issuer_cn = extract_issuer_cn(cert)?;
    FulcioInstance::from_issuer_cn(&issuer_cn)
        .ok_or_else(|| CertificateError::UnknownIssuer(issuer_cn))
}

pub fn extract_subject_public_key_info<'a>(cert: &'a X509Certificate) -> &'a SubjectPublicKeyInfo<'a> {
    cert.public_key()
}
