//! Integration coverage for the public `AttestationVerifier` API: bundle
//! JSON parsing through to the orchestrator's step ordering. None of these
//! construct a real Fulcio-issued certificate chain (no bundle/key fixtures
//! ship with this crate), so they stop at the error paths step 1 through
//! step 3 can reach on their own; the later steps are covered at the unit
//! level in `src/verifier/*`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::Write;

use sigstore_verifier::error::VerificationError;
use sigstore_verifier::trust::{FileTrustedRootProvider, TrustedRoot, TrustedRootProvider};
use sigstore_verifier::types::result::VerificationOptions;
use sigstore_verifier::AttestationVerifier;

fn bundle_json(extra_material: &str, message_signature: &str) -> String {
    format!(
        r#"{{"mediaType":"application/vnd.dev.sigstore.bundle.v0.3+json","verificationMaterial":{{{extra_material}}},"messageSignature":{message_signature}}}"#
    )
}

fn single_tlog_entry() -> String {
    r#""tlogEntries":[{"logId":{"keyId":""},"integratedTime":"0","canonicalizedBody":""}]"#
        .to_string()
}

fn leaf_cert_material(der: &[u8]) -> String {
    format!(
        r#"{},"certificate":{{"rawBytes":"{}"}}"#,
        single_tlog_entry(),
        BASE64.encode(der)
    )
}

fn empty_message_signature() -> String {
    r#"{"signature":""}"#.to_string()
}

#[test]
fn test_verify_bundle_bytes_rejects_malformed_json() {
    let verifier = AttestationVerifier::new(TrustedRoot::default());
    let result = verifier.verify_bundle_bytes(b"not json", b"digest", &VerificationOptions::default());
    assert!(matches!(result, Err(VerificationError::Json(_))));
}

#[test]
fn test_verify_bundle_bytes_rejects_wrong_media_type() {
    let json = bundle_json(&leaf_cert_material(b"fake-cert-der"), &empty_message_signature())
        .replace("application/vnd.dev.sigstore.bundle.v0.3+json", "application/unrelated");
    let verifier = AttestationVerifier::new(TrustedRoot::default());
    let result = verifier.verify_bundle_bytes(json.as_bytes(), b"digest", &VerificationOptions::default());
    assert!(matches!(result, Err(VerificationError::BundleMalformed(_))));
}

#[test]
fn test_verify_bundle_bytes_rejects_missing_certificate_material() {
    let json = bundle_json(&single_tlog_entry(), &empty_message_signature());
    let verifier = AttestationVerifier::new(TrustedRoot::default());
    let result = verifier.verify_bundle_bytes(json.as_bytes(), b"digest", &VerificationOptions::default());
    assert!(matches!(result, Err(VerificationError::BundleMalformed(_))));
}

#[test]
fn test_verify_bundle_bytes_rejects_embedded_digest_mismatch_before_touching_certificates() {
    let message_signature = format!(
        r#"{{"messageDigest":{{"algorithm":"SHA2_256","digest":"{}"}},"signature":""}}"#,
        BASE64.encode(b"embedded-digest-does-not-match")
    );
    let json = bundle_json(&leaf_cert_material(b"fake-cert-der"), &message_signature);
    let verifier = AttestationVerifier::new(TrustedRoot::default());
    let result = verifier.verify_bundle_bytes(json.as_bytes(), b"actual-artifact-digest", &VerificationOptions::default());
    assert!(matches!(result, Err(VerificationError::DigestMismatch)));
}

#[test]
fn test_verify_bundle_bytes_fails_chain_verification_on_unparseable_leaf() {
    // Past step 1 and 2, a certificate that isn't even valid DER fails at
    // step 3 rather than panicking.
    let json = bundle_json(&leaf_cert_material(b"not-a-certificate"), &empty_message_signature());
    let verifier = AttestationVerifier::new(TrustedRoot::default());
    let result = verifier.verify_bundle_bytes(json.as_bytes(), b"digest", &VerificationOptions::default());
    assert!(matches!(result, Err(VerificationError::Fulcio(_))));
}

#[test]
fn test_verify_bundle_surfaces_io_error_for_missing_bundle_file() {
    let verifier = AttestationVerifier::new(TrustedRoot::default());
    let missing = std::path::Path::new("/nonexistent/path/to/bundle.json");
    let result = verifier.verify_bundle(missing, b"digest", &VerificationOptions::default());
    assert!(matches!(result, Err(VerificationError::Io(_))));
}

#[test]
fn test_file_trusted_root_provider_round_trips_a_json_document() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{}}").unwrap();

    let provider = FileTrustedRootProvider::new(file.path());
    let root = provider.load().expect("empty trusted root document should parse");
    assert!(root.certificate_authorities.is_empty());
}

#[test]
fn test_file_trusted_root_provider_detects_jsonl_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roots.jsonl");
    std::fs::write(&path, "{}\n{}\n").unwrap();

    let provider = FileTrustedRootProvider::new(&path);
    let root = provider.load().expect("jsonl stream of empty documents should parse");
    assert!(root.tlogs.is_empty());
}

#[test]
fn test_file_trusted_root_provider_surfaces_parse_error_for_invalid_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json at all").unwrap();

    let provider = FileTrustedRootProvider::new(file.path());
    assert!(provider.load().is_err());
}
