//! Component G steps 2 and 6: digest consistency and log-body binding.
//!
//! Neither check has a teacher counterpart — the teacher's DSSE-envelope
//! flow had no hashed-rekord body to bind against. Both are built directly
//! from spec §4.G and the canonical JSON reconstruction in
//! [`crate::parser::bundle`].

use crate::error::VerificationError;
use crate::parser::bundle::{build_hashed_rekord_canonical_json, decode_base64};
use crate::types::bundle::MessageSignature;

/// Step 2: when the bundle carries an explicit `messageSignature.messageDigest`,
/// it must match the digest the caller supplied for verification. A bundle
/// with no embedded digest carries nothing to cross-check and is accepted —
/// the caller's digest is authoritative either way.
pub fn verify_digest_consistency(
    message_signature: &MessageSignature,
    artifact_digest: &[u8],
) -> Result<(), VerificationError> {
    let Some(embedded) = &message_signature.message_digest else {
        return Ok(());
    };

    if embedded.algorithm != "SHA2_256" {
        return Err(VerificationError::BundleMalformed(format!(
            "unsupported message digest algorithm: {}",
            embedded.algorithm
        )));
    }

    let embedded_bytes = decode_base64(&embedded.digest)?;
    if embedded_bytes != artifact_digest {
        return Err(VerificationError::DigestMismatch);
    }

    Ok(())
}

/// Step 6: the Rekor entry's `body` must be the hashed-rekord canonical JSON
/// built from this exact artifact digest, leaf certificate, and signature —
/// otherwise the log entry authenticates some other signing event.
pub fn verify_log_binding(
    artifact_digest: &[u8],
    leaf_der: &[u8],
    signature: &[u8],
    canonicalized_body_b64: &str,
) -> Result<(), VerificationError> {
    let expected = build_hashed_rekord_canonical_json(artifact_digest, leaf_der, signature);
    let actual = decode_base64(canonicalized_body_b64)?;

    if expected == actual {
        Ok(())
    } else {
        Err(VerificationError::LogBindingMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use crate::types::bundle::MessageDigest;

    #[test]
    fn test_verify_digest_consistency_accepts_absent_digest() {
        let ms = MessageSignature {
            message_digest: None,
            signature: String::new(),
        };
        assert!(verify_digest_consistency(&ms, b"anything").is_ok());
    }

    #[test]
    fn test_verify_digest_consistency_rejects_mismatch() {
        let ms = MessageSignature {
            message_digest: Some(MessageDigest {
                algorithm: "SHA2_256".to_string(),
                digest: BASE64.encode(b"expected-digest-bytes"),
            }),
            signature: String::new(),
        };
        let result = verify_digest_consistency(&ms, b"other-digest-bytes!!");
        assert!(matches!(result, Err(VerificationError::DigestMismatch)));
    }

    #[test]
    fn test_verify_log_binding_round_trips() {
        let body = build_hashed_rekord_canonical_json(b"digest", b"cert-der", b"sig");
        let body_b64 = BASE64.encode(&body);
        assert!(verify_log_binding(b"digest", b"cert-der", b"sig", &body_b64).is_ok());
    }

    #[test]
    fn test_verify_log_binding_rejects_mismatch() {
        let body = build_hashed_rekord_canonical_json(b"digest", b"cert-der", b"sig");
        let body_b64 = BASE64.encode(&body);
        assert!(verify_log_binding(b"different-digest", b"cert-der", b"sig", &body_b64).is_err());
    }
}
