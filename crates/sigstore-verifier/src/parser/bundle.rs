//! Bundle parsing and validation (spec §4.G step 1) and the hashed-rekord
//! canonical JSON reconstruction used for log-body binding (step 6).

use std::path::Path;

use base64::prelude::*;

use crate::error::VerificationError;
use crate::parser::certificate::to_pem_bytes;
use crate::types::bundle::{RawCert, SigstoreBundle};

pub fn parse_bundle_from_path(path: &Path) -> Result<SigstoreBundle, VerificationError> {
    let contents = std::fs::read(path)?;
    parse_bundle_from_bytes(&contents)
}

pub fn parse_bundle_from_bytes(bytes: &[u8]) -> Result<SigstoreBundle, VerificationError> {
    let bundle: SigstoreBundle = serde_json::from_slice(bytes)?;
    validate_bundle(&bundle)?;
    Ok(bundle)
}

/// Spec §4.G step 1: reject if `dsseEnvelope` present, `messageSignature`
/// absent, `entries.size != 1`, or `timestamps` non-empty.
pub fn validate_bundle(bundle: &SigstoreBundle) -> Result<(), VerificationError> {
    if !bundle
        .media_type
        .starts_with("application/vnd.dev.sigstore.bundle")
    {
        return Err(VerificationError::BundleMalformed(format!(
            "unsupported media type: {}",
            bundle.media_type
        )));
    }

    if bundle.dsse_envelope.is_some() {
        return Err(VerificationError::BundleMalformed(
            "bundles carrying a dsseEnvelope are not accepted by this verifier".to_string(),
        ));
    }

    if bundle.message_signature.is_none() {
        return Err(VerificationError::BundleMalformed(
            "bundle is missing messageSignature".to_string(),
        ));
    }

    let entry_count = bundle.verification_material.tlog_entries.len();
    if entry_count != 1 {
        return Err(VerificationError::BundleMalformed(format!(
            "bundle must carry exactly one transparency log entry, found {entry_count}"
        )));
    }

    if let Some(ts) = &bundle.verification_material.timestamp_verification_data {
        if !ts.rfc3161_timestamps.is_empty() {
            return Err(VerificationError::BundleMalformed(
                "bundles carrying RFC 3161 timestamps are not accepted by this verifier".to_string(),
            ));
        }
    }

    Ok(())
}

/// The leaf-first certificate path, accepting both the v0.1/v0.2
/// single-`certificate` shape and the v0.3 `x509CertificateChain` shape.
pub fn get_cert_path(bundle: &SigstoreBundle) -> Result<Vec<Vec<u8>>, VerificationError> {
    let material = &bundle.verification_material;

    let raw_certs: &[RawCert] = if let Some(chain) = &material.x509_certificate_chain {
        &chain.certificates
    } else if let Some(cert) = &material.certificate {
        std::slice::from_ref(cert)
    } else {
        return Err(VerificationError::BundleMalformed(
            "bundle carries no certificate material".to_string(),
        ));
    };

    raw_certs
        .iter()
        .map(|c| {
            BASE64_STANDARD
                .decode(&c.raw_bytes)
                .map_err(VerificationError::from)
        })
        .collect()
}

pub fn decode_base64(input: &str) -> Result<Vec<u8>, VerificationError> {
    BASE64_STANDARD.decode(input).map_err(VerificationError::from)
}

/// Reconstruct Rekor's hashed-rekord canonical JSON body (spec §6, exact
/// format) from the artifact digest, leaf certificate, and signature. Used
/// for step 6's byte-for-byte comparison against the log entry's `body`.
///
/// Keys are sorted as shown, no whitespace outside strings, no trailing
/// newline — `serde_json`'s compact writer over a manually-built string
/// produces this directly rather than risking map-key reordering from a
/// generic serializer.
pub fn build_hashed_rekord_canonical_json(
    artifact_digest: &[u8],
    leaf_der: &[u8],
    signature: &[u8],
) -> Vec<u8> {
    let digest_hex = hex::encode(artifact_digest);
    let signature_b64 = BASE64_STANDARD.encode(signature);
    let pem_b64 = BASE64_STANDARD.encode(to_pem_bytes(leaf_der));

    format!(
        "{{\"apiVersion\":\"0.0.1\",\"kind\":\"hashedrekord\",\"spec\":{{\
\"data\":{{\"hash\":{{\"algorithm\":\"sha256\",\"value\":\"{digest_hex}\"}}}},\
\"signature\":{{\"content\":\"{signature_b64}\",\
\"publicKey\":{{\"content\":\"{pem_b64}\"}}}}}}}}"
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bundle::{MessageSignature, RawCert, TransparencyLogEntry, VerificationMaterial};
    use crate::types::bundle::LogId;

    fn minimal_tlog_entry() -> TransparencyLogEntry {
        TransparencyLogEntry {
            log_index: None,
            log_id: LogId {
                key_id: String::new(),
            },
            kind_version: None,
            integrated_time: "0".to_string(),
            inclusion_promise: None,
            inclusion_proof: None,
            canonicalized_body: String::new(),
        }
    }

    fn minimal_bundle() -> SigstoreBundle {
        SigstoreBundle {
            media_type: "application/vnd.dev.sigstore.bundle.v0.3+json".to_string(),
            verification_material: VerificationMaterial {
                certificate: Some(RawCert {
                    raw_bytes: String::new(),
                }),
                x509_certificate_chain: None,
                tlog_entries: vec![minimal_tlog_entry()],
                timestamp_verification_data: None,
            },
            message_signature: Some(MessageSignature {
                message_digest: None,
                signature: String::new(),
            }),
            dsse_envelope: None,
        }
    }

    #[test]
    fn test_validate_bundle_rejects_bad_media_type() {
        let mut bundle = minimal_bundle();
        bundle.media_type = "invalid".to_string();
        assert!(validate_bundle(&bundle).is_err());
    }

    #[test]
    fn test_validate_bundle_rejects_dsse_envelope() {
        let mut bundle = minimal_bundle();
        bundle.dsse_envelope = Some(serde_json::json!({"payload": "x"}));
        assert!(validate_bundle(&bundle).is_err());
    }

    #[test]
    fn test_validate_bundle_rejects_missing_message_signature() {
        let mut bundle = minimal_bundle();
        bundle.message_signature = None;
        assert!(validate_bundle(&bundle).is_err());
    }

    #[test]
    fn test_validate_bundle_rejects_wrong_entry_count() {
        let mut bundle = minimal_bundle();
        bundle.verification_material.tlog_entries.clear();
        assert!(validate_bundle(&bundle).is_err());

        bundle
            .verification_material
            .tlog_entries
            .extend([minimal_tlog_entry(), minimal_tlog_entry()]);
        assert!(validate_bundle(&bundle).is_err());
    }

    #[test]
    fn test_validate_bundle_accepts_minimal_bundle() {
        assert!(validate_bundle(&minimal_bundle()).is_ok());
    }

    #[test]
    fn test_get_cert_path_prefers_chain_over_single_certificate() {
        let mut bundle = minimal_bundle();
        bundle.verification_material.x509_certificate_chain =
            Some(crate::types::bundle::X509CertificateChain {
                certificates: vec![RawCert {
                    raw_bytes: BASE64_STANDARD.encode(b"leaf"),
                }],
            });
        let path = get_cert_path(&bundle).unwrap();
        assert_eq!(path, vec![b"leaf".to_vec()]);
    }

    #[test]
    fn test_build_hashed_rekord_canonical_json_has_no_whitespace_or_trailing_newline() {
        let body = build_hashed_rekord_canonical_json(b"digest", b"cert-der", b"sig");
        let text = String::from_utf8(body).unwrap();
        assert!(!text.contains(' '));
        assert!(!text.ends_with('\n'));
        assert!(text.starts_with(r#"{"apiVersion":"0.0.1","kind":"hashedrekord","spec":"#));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["spec"]["data"]["hash"]["algorithm"], "sha256");
    }
}
