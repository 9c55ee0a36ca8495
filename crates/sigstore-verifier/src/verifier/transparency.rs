//! Component F: the Rekor transparency-log verifier.
//!
//! Confirms the bundle's single tlog entry was logged by a Rekor instance
//! trusted at its `integratedTime`, by checking the signed entry timestamp
//! over Rekor's canonical SET payload and, when present, the inclusion
//! proof against the signed tree head. Grounded on the teacher's
//! `verify_transparency_log`, which only handled the inclusion-proof path;
//! SET verification and log-key lookup are new, built from spec §4.F.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::crypto::merkle::{compute_leaf_hash, verify_inclusion_proof};
use crate::crypto::signature::PublicKey;
use crate::error::TransparencyError;
use crate::parser::decode_base64;
use crate::trust::model::{TransparencyLogKey, TrustedRoot};
use crate::types::bundle::{Checkpoint, TransparencyLogEntry};

/// Verify `entry` against `trusted_root`. `require_inclusion_proof` honors
/// `VerificationOptions::require_inclusion_proof` (spec §9 open question b):
/// it additionally demands an inclusion proof, but the signed entry
/// timestamp is never optional — it is the entry's only binding to the log
/// that a bare Merkle proof (caller-supplied, unsigned `rootHash`) cannot
/// provide on its own.
pub fn verify_transparency_log(
    entry: &TransparencyLogEntry,
    trusted_root: &TrustedRoot,
    integrated_time: i64,
    require_inclusion_proof: bool,
) -> Result<(), TransparencyError> {
    let log_id_bytes = BASE64
        .decode(&entry.log_id.key_id)
        .map_err(|_| TransparencyError::InvalidEntryHash)?;

    let log_key = trusted_root
        .tlog_by_id(&log_id_bytes)
        .ok_or(TransparencyError::UntrustedLog)?;

    if !log_key.valid_for.contains(integrated_time) {
        return Err(TransparencyError::LogKeyExpired);
    }

    match &entry.inclusion_promise {
        Some(promise) => verify_signed_entry_timestamp(entry, promise, log_key)?,
        None => {
            return Err(TransparencyError::BadSet(
                "entry carries no inclusion promise".into(),
            ));
        }
    }

    match &entry.inclusion_proof {
        Some(proof) => verify_entry_inclusion(entry, proof, log_key)?,
        None if require_inclusion_proof => return Err(TransparencyError::MissingInclusionProof),
        None => {}
    }

    Ok(())
}

/// Rekor's signed entry timestamp covers the canonical JSON object
/// `{"body":...,"integratedTime":...,"logID":...,"logIndex":...}`, keys
/// sorted, integers as JSON numbers, logID as lowercase hex.
fn canonical_set_payload(entry: &TransparencyLogEntry) -> Result<Vec<u8>, TransparencyError> {
    let log_index = entry
        .log_index
        .as_deref()
        .ok_or(TransparencyError::InvalidEntryHash)?
        .parse::<i64>()
        .map_err(|_| TransparencyError::InvalidEntryHash)?;

    let integrated_time = entry
        .integrated_time
        .parse::<i64>()
        .map_err(|_| TransparencyError::InvalidEntryHash)?;

    let log_id_hex = BASE64
        .decode(&entry.log_id.key_id)
        .map(|bytes| hex::encode(bytes))
        .map_err(|_| TransparencyError::InvalidEntryHash)?;

    Ok(format!(
        "{{\"body\":\"{}\",\"integratedTime\":{integrated_time},\"logID\":\"{log_id_hex}\",\"logIndex\":{log_index}}}",
        entry.canonicalized_body,
    )
    .into_bytes())
}

fn verify_signed_entry_timestamp(
    entry: &TransparencyLogEntry,
    promise: &crate::types::bundle::InclusionPromise,
    log_key: &crate::trust::model::TransparencyLogKey,
) -> Result<(), TransparencyError> {
    let set_bytes = decode_base64(&promise.signed_entry_timestamp)
        .map_err(|_| TransparencyError::BadSet("malformed base64".into()))?;
    let payload = canonical_set_payload(entry)?;
    let digest = crate::crypto::hash::sha256(&payload);

    let public_key = log_key
        .public_key()
        .map_err(|e| TransparencyError::BadSet(e.to_string()))?;

    public_key
        .verify_digest(&digest, &set_bytes)
        .map_err(|e| TransparencyError::BadSet(e.to_string()))
}

fn verify_entry_inclusion(
    entry: &TransparencyLogEntry,
    proof: &crate::types::bundle::InclusionProof,
    log_key: &TransparencyLogKey,
) -> Result<(), TransparencyError> {
    let log_index = proof
        .log_index
        .parse::<u64>()
        .map_err(|_| TransparencyError::InvalidEntryHash)?;
    let tree_size = proof
        .tree_size
        .parse::<u64>()
        .map_err(|_| TransparencyError::InvalidEntryHash)?;
    let root_hash =
        decode_base64(&proof.root_hash).map_err(|_| TransparencyError::InvalidEntryHash)?;

    let proof_hashes = proof
        .hashes
        .iter()
        .map(|h| decode_base64(h))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TransparencyError::InvalidEntryHash)?;

    let body = decode_base64(&entry.canonicalized_body)
        .map_err(|_| TransparencyError::InvalidEntryHash)?;
    let leaf_hash = compute_leaf_hash(&body);

    verify_inclusion_proof(&leaf_hash, log_index, tree_size, &proof_hashes, &root_hash)?;

    if let Some(checkpoint) = &proof.checkpoint {
        verify_checkpoint(checkpoint, tree_size, &root_hash, log_key)?;
    }

    Ok(())
}

/// A parsed C2SP "signed note" checkpoint: the tree head Rekor's log server
/// periodically signs and exposes alongside each inclusion proof.
struct ParsedCheckpoint {
    tree_size: u64,
    root_hash: Vec<u8>,
    /// The exact bytes the signatures below cover: the checkpoint body
    /// (origin, size, root hash lines) up to and including its trailing
    /// newline, not the signature block.
    signed_message: Vec<u8>,
    /// Signature bytes with each line's leading 4-byte key hint stripped.
    signatures: Vec<Vec<u8>>,
}

/// Parse a checkpoint envelope in the note text format:
/// `origin\nsize\nbase64(rootHash)\n\n— name base64(keyhint||sig)\n...`.
fn parse_checkpoint(envelope: &str) -> Result<ParsedCheckpoint, TransparencyError> {
    let (body, sig_block) = envelope.split_once("\n\n").ok_or_else(|| {
        TransparencyError::BadCheckpoint("checkpoint is missing its signature block".into())
    })?;

    let mut lines = body.lines();
    let origin = lines
        .next()
        .ok_or_else(|| TransparencyError::BadCheckpoint("checkpoint has no origin line".into()))?;
    if origin.is_empty() {
        return Err(TransparencyError::BadCheckpoint(
            "checkpoint origin line is empty".into(),
        ));
    }

    let tree_size = lines
        .next()
        .ok_or_else(|| TransparencyError::BadCheckpoint("checkpoint has no size line".into()))?
        .parse::<u64>()
        .map_err(|_| TransparencyError::BadCheckpoint("checkpoint size is not a u64".into()))?;

    let root_hash = lines
        .next()
        .ok_or_else(|| TransparencyError::BadCheckpoint("checkpoint has no root hash line".into()))
        .and_then(|line| {
            decode_base64(line)
                .map_err(|_| TransparencyError::BadCheckpoint("checkpoint root hash is not valid base64".into()))
        })?;

    let mut signatures = Vec::new();
    for line in sig_block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let rest = line.strip_prefix("\u{2014} ").ok_or_else(|| {
            TransparencyError::BadCheckpoint("checkpoint signature line missing \u{2014} marker".into())
        })?;
        let (_name, sig_b64) = rest.split_once(' ').ok_or_else(|| {
            TransparencyError::BadCheckpoint("checkpoint signature line missing signature".into())
        })?;
        let sig_bytes = decode_base64(sig_b64).map_err(|_| {
            TransparencyError::BadCheckpoint("checkpoint signature is not valid base64".into())
        })?;
        if sig_bytes.len() <= 4 {
            return Err(TransparencyError::BadCheckpoint(
                "checkpoint signature shorter than its key hint".into(),
            ));
        }
        signatures.push(sig_bytes[4..].to_vec());
    }

    if signatures.is_empty() {
        return Err(TransparencyError::BadCheckpoint(
            "checkpoint has no signature lines".into(),
        ));
    }

    Ok(ParsedCheckpoint {
        tree_size,
        root_hash,
        signed_message: format!("{body}\n").into_bytes(),
        signatures,
    })
}

/// Verify a checkpoint against the inclusion proof it accompanies: its
/// `treeSize`/`rootHash` must match the proof's own, and at least one of its
/// signatures must verify under a key this log is trusted for.
fn verify_checkpoint(
    checkpoint: &Checkpoint,
    proof_tree_size: u64,
    proof_root_hash: &[u8],
    log_key: &TransparencyLogKey,
) -> Result<(), TransparencyError> {
    let parsed = parse_checkpoint(&checkpoint.envelope)?;

    if parsed.tree_size != proof_tree_size || parsed.root_hash != proof_root_hash {
        return Err(TransparencyError::BadCheckpoint(
            "checkpoint treeSize/rootHash do not match the inclusion proof".into(),
        ));
    }

    let public_key = log_key
        .public_key()
        .map_err(|e| TransparencyError::BadCheckpoint(e.to_string()))?;

    let message_digest = match &public_key {
        PublicKey::Ed25519(_) => parsed.signed_message.clone(),
        _ => crate::crypto::hash::sha256(&parsed.signed_message),
    };

    let verified = parsed
        .signatures
        .iter()
        .any(|sig| public_key.verify_digest(&message_digest, sig).is_ok());

    if !verified {
        return Err(TransparencyError::BadCheckpoint(
            "no checkpoint signature verified under the trusted log key".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bundle::LogId;

    fn entry(log_index: Option<&str>, integrated_time: &str) -> TransparencyLogEntry {
        TransparencyLogEntry {
            log_index: log_index.map(str::to_string),
            log_id: LogId {
                key_id: BASE64.encode([1u8; 32]),
            },
            kind_version: None,
            integrated_time: integrated_time.to_string(),
            inclusion_promise: None,
            inclusion_proof: None,
            canonicalized_body: BASE64.encode(b"body"),
        }
    }

    #[test]
    fn test_canonical_set_payload_has_no_whitespace_and_sorted_keys() {
        let e = entry(Some("7"), "1700000000");
        let payload = canonical_set_payload(&e).unwrap();
        let text = String::from_utf8(payload).unwrap();
        assert!(!text.contains(' '));
        assert!(text.starts_with(r#"{"body":""#));
        assert!(text.contains(r#","integratedTime":1700000000,"logID":""#));
        assert!(text.ends_with(r#","logIndex":7}"#));
    }

    #[test]
    fn test_canonical_set_payload_rejects_missing_log_index() {
        let e = entry(None, "1700000000");
        assert!(canonical_set_payload(&e).is_err());
    }

    #[test]
    fn test_verify_transparency_log_rejects_untrusted_log() {
        let e = entry(Some("1"), "1700000000");
        let root = TrustedRoot::default();
        let result = verify_transparency_log(&e, &root, 1700000000, false);
        assert!(matches!(result, Err(TransparencyError::UntrustedLog)));
    }

    #[test]
    fn test_verify_transparency_log_rejects_missing_set_even_when_proof_not_required() {
        use crate::trust::model::ValidFor;

        let log_id = [1u8; 32];
        let mut e = entry(Some("1"), "1700000000");
        e.log_id = LogId {
            key_id: BASE64.encode(log_id),
        };

        let mut root = TrustedRoot::default();
        root.tlogs.push(crate::trust::model::TransparencyLogKey {
            log_id,
            raw_public_key: Vec::new(),
            key_scheme: "ecdsa-sha2-nistp256".to_string(),
            valid_for: ValidFor {
                start: 0,
                end: None,
            },
        });

        let result = verify_transparency_log(&e, &root, 1700000000, false);
        assert!(matches!(result, Err(TransparencyError::BadSet(_))));
    }

    fn ed25519_log_key(log_id: [u8; 32], verifying_key: &ed25519_dalek::VerifyingKey) -> crate::trust::model::TransparencyLogKey {
        crate::trust::model::TransparencyLogKey {
            log_id,
            raw_public_key: verifying_key.to_bytes().to_vec(),
            key_scheme: "ed25519".to_string(),
            valid_for: crate::trust::model::ValidFor {
                start: 0,
                end: None,
            },
        }
    }

    fn signed_checkpoint(body: &str, signing_key: &ed25519_dalek::SigningKey) -> Checkpoint {
        use ed25519_dalek::Signer;

        let message = format!("{body}\n");
        let sig = signing_key.sign(message.as_bytes());
        let mut sig_line = vec![0u8; 4];
        sig_line.extend_from_slice(&sig.to_bytes());
        let envelope = format!("{message}\n\u{2014} test-log {}\n", BASE64.encode(sig_line));
        Checkpoint { envelope }
    }

    #[test]
    fn test_verify_checkpoint_accepts_matching_tree_size_and_signature() {
        use ed25519_dalek::SigningKey;

        let signing_key = SigningKey::from_bytes(&[3u8; 32]);
        let root_hash = [9u8; 32];
        let body = format!(
            "example.com/log\n42\n{}",
            BASE64.encode(root_hash)
        );
        let checkpoint = signed_checkpoint(&body, &signing_key);
        let log_key = ed25519_log_key([1u8; 32], &signing_key.verifying_key());

        let result = verify_checkpoint(&checkpoint, 42, &root_hash, &log_key);
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_verify_checkpoint_rejects_tree_size_mismatch() {
        use ed25519_dalek::SigningKey;

        let signing_key = SigningKey::from_bytes(&[3u8; 32]);
        let root_hash = [9u8; 32];
        let body = format!("example.com/log\n42\n{}", BASE64.encode(root_hash));
        let checkpoint = signed_checkpoint(&body, &signing_key);
        let log_key = ed25519_log_key([1u8; 32], &signing_key.verifying_key());

        let result = verify_checkpoint(&checkpoint, 43, &root_hash, &log_key);
        assert!(matches!(result, Err(TransparencyError::BadCheckpoint(_))));
    }

    #[test]
    fn test_verify_checkpoint_rejects_signature_from_wrong_key() {
        use ed25519_dalek::SigningKey;

        let signing_key = SigningKey::from_bytes(&[3u8; 32]);
        let other_key = SigningKey::from_bytes(&[4u8; 32]);
        let root_hash = [9u8; 32];
        let body = format!("example.com/log\n42\n{}", BASE64.encode(root_hash));
        let checkpoint = signed_checkpoint(&body, &signing_key);
        let log_key = ed25519_log_key([1u8; 32], &other_key.verifying_key());

        let result = verify_checkpoint(&checkpoint, 42, &root_hash, &log_key);
        assert!(matches!(result, Err(TransparencyError::BadCheckpoint(_))));
    }

    #[test]
    fn test_parse_checkpoint_rejects_missing_signature_block() {
        let result = parse_checkpoint("example.com/log\n42\nrootHash\n");
        assert!(matches!(result, Err(TransparencyError::BadCheckpoint(_))));
    }
}
