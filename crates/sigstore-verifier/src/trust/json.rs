//! Parsing for the wire format of `dev.sigstore.trustroot.v1.TrustedRoot`
//! (spec §6) into the in-memory [`TrustedRoot`](super::model::TrustedRoot).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::VerificationError;
use crate::trust::model::{CertificateAuthority, TransparencyLogKey, TrustedRoot, ValidFor};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrustedRootDocument {
    #[serde(default)]
    certificate_authorities: Vec<CertificateAuthorityDto>,
    #[serde(default)]
    tlogs: Vec<TransparencyLogInstanceDto>,
    #[serde(default)]
    ctlogs: Vec<TransparencyLogInstanceDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertificateAuthorityDto {
    cert_chain: CertChainDto,
    valid_for: ValidForDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CertChainDto {
    certificates: Vec<CertDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertDto {
    raw_bytes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ValidForDto {
    start: String,
    end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransparencyLogInstanceDto {
    log_id: LogIdDto,
    public_key: PublicKeyDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogIdDto {
    key_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyDto {
    raw_bytes: String,
    key_details: String,
    #[serde(default)]
    valid_for: Option<ValidForDto>,
}

fn parse_rfc3339(s: &str) -> Result<i64, VerificationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp())
        .map_err(|e| VerificationError::BundleMalformed(format!("invalid RFC3339 timestamp: {e}")))
}

fn parse_valid_for(dto: &ValidForDto) -> Result<ValidFor, VerificationError> {
    Ok(ValidFor {
        start: parse_rfc3339(&dto.start)?,
        end: dto.end.as_deref().map(parse_rfc3339).transpose()?,
    })
}

/// `keyDetails` names follow the TUF/in-toto signing-scheme vocabulary
/// (`PKIX_ECDSA_P256_SHA_256`, `PKIX_ED25519`, ...); this maps the subset
/// Sigstore's own trusted_root.json actually emits to the scheme names
/// [`crate::crypto::signature::construct_tuf_public_key`] understands.
fn key_details_to_scheme(key_details: &str) -> &'static str {
    match key_details {
        "PKIX_ECDSA_P256_SHA_256" | "PKCS1_ECDSA_P256_SHA_256" => "ecdsa-sha2-nistp256",
        "PKIX_ED25519" => "ed25519",
        _ => "unknown",
    }
}

fn parse_log(dto: &TransparencyLogInstanceDto) -> Result<TransparencyLogKey, VerificationError> {
    let log_id_bytes = BASE64
        .decode(&dto.log_id.key_id)
        .map_err(|e| VerificationError::BundleMalformed(format!("invalid logId: {e}")))?;
    let log_id: [u8; 32] = log_id_bytes
        .try_into()
        .map_err(|_| VerificationError::BundleMalformed("logId must be 32 bytes".into()))?;

    let raw_public_key = BASE64
        .decode(&dto.public_key.raw_bytes)
        .map_err(|e| VerificationError::BundleMalformed(format!("invalid public key bytes: {e}")))?;

    let valid_for = match &dto.public_key.valid_for {
        Some(v) => parse_valid_for(v)?,
        None => ValidFor { start: 0, end: None },
    };

    Ok(TransparencyLogKey {
        log_id,
        raw_public_key,
        key_scheme: key_details_to_scheme(&dto.public_key.key_details).to_string(),
        valid_for,
    })
}

/// Parse one `TrustedRoot` JSON document.
pub fn parse_trusted_root_json(bytes: &[u8]) -> Result<TrustedRoot, VerificationError> {
    let doc: TrustedRootDocument = serde_json::from_slice(bytes)?;

    let mut certificate_authorities = Vec::with_capacity(doc.certificate_authorities.len());
    for ca in &doc.certificate_authorities {
        let mut cert_chain = Vec::with_capacity(ca.cert_chain.certificates.len());
        for cert in &ca.cert_chain.certificates {
            cert_chain.push(BASE64.decode(&cert.raw_bytes).map_err(|e| {
                VerificationError::BundleMalformed(format!("invalid CA certificate bytes: {e}"))
            })?);
        }
        certificate_authorities.push(CertificateAuthority {
            cert_chain,
            valid_for: parse_valid_for(&ca.valid_for)?,
        });
    }

    let mut tlogs = Vec::with_capacity(doc.tlogs.len());
    for tlog in &doc.tlogs {
        tlogs.push(parse_log(tlog)?);
    }

    let mut ctlogs = Vec::with_capacity(doc.ctlogs.len());
    for ctlog in &doc.ctlogs {
        ctlogs.push(parse_log(ctlog)?);
    }

    Ok(TrustedRoot {
        certificate_authorities,
        tlogs,
        ctlogs,
    })
}

/// Parse a JSONL stream of `TrustedRoot` documents (one Sigstore public-good
/// root, one GitHub root, etc.) and merge them into a single trust root.
/// Cross-document tie-breaking falls out of [`TrustedRoot::ca_at`] and
/// friends picking the latest `validFor.start`, so merging is just
/// concatenation.
pub fn parse_trusted_root_jsonl(content: &str) -> Result<TrustedRoot, VerificationError> {
    let mut merged = TrustedRoot::default();
    let mut found_any = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let root = parse_trusted_root_json(line.as_bytes())?;
        merged.certificate_authorities.extend(root.certificate_authorities);
        merged.tlogs.extend(root.tlogs);
        merged.ctlogs.extend(root.ctlogs);
        found_any = true;
    }

    if !found_any {
        return Err(VerificationError::BundleMalformed(
            "no trusted root documents found in JSONL content".into(),
        ));
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_document() {
        let root = parse_trusted_root_json(b"{}").unwrap();
        assert!(root.certificate_authorities.is_empty());
        assert!(root.tlogs.is_empty());
        assert!(root.ctlogs.is_empty());
    }

    #[test]
    fn test_parse_jsonl_rejects_empty_content() {
        let result = parse_trusted_root_jsonl("");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_jsonl_merges_multiple_documents() {
        let content = "{}\n{}\n";
        let root = parse_trusted_root_jsonl(content).unwrap();
        assert!(root.certificate_authorities.is_empty());
    }
}
