//! Exercises the JSONL multi-trust-root loader against inline fixture
//! documents shaped like `dev.sigstore.trustroot.v1.TrustedRoot` (one for a
//! public-good-style root, one for a GitHub-style root), rather than a
//! checked-in sample file.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use sigstore_verifier::trust::parse_trusted_root_jsonl;

fn ca_document(cert_b64: &str, start: &str, end: Option<&str>) -> String {
    let end_field = match end {
        Some(e) => format!(r#","end":"{e}""#),
        None => String::new(),
    };
    format!(
        r#"{{"certificateAuthorities":[{{"certChain":{{"certificates":[{{"rawBytes":"{cert_b64}"}}]}},"validFor":{{"start":"{start}"{end_field}}}}}]}}"#
    )
}

#[test]
fn test_parse_jsonl_merges_two_documents_into_one_trusted_root() {
    let doc_a = ca_document(&BASE64.encode(b"public-good-ca-der"), "2021-01-01T00:00:00Z", None);
    let doc_b = ca_document(
        &BASE64.encode(b"github-ca-der"),
        "2023-10-27T00:00:00Z",
        Some("2024-05-25T00:00:00Z"),
    );
    let content = format!("{doc_a}\n{doc_b}\n");

    let root = parse_trusted_root_jsonl(&content).expect("jsonl should parse");
    assert_eq!(root.certificate_authorities.len(), 2);
}

#[test]
fn test_parse_jsonl_rejects_empty_content() {
    assert!(parse_trusted_root_jsonl("").is_err());
}

#[test]
fn test_parse_jsonl_rejects_whitespace_only_content() {
    assert!(parse_trusted_root_jsonl("\n\n  \n").is_err());
}

#[test]
fn test_parse_jsonl_rejects_invalid_json() {
    assert!(parse_trusted_root_jsonl("not valid json").is_err());
}

#[test]
fn test_ca_at_picks_latest_start_among_overlapping_matches() {
    // Two documents whose CAs are both valid at the same instant; the one
    // with the later validFor.start wins (spec open question (c)).
    let older = ca_document(&BASE64.encode(b"older-ca"), "2020-01-01T00:00:00Z", None);
    let newer = ca_document(&BASE64.encode(b"newer-ca"), "2022-06-01T00:00:00Z", None);
    let content = format!("{older}\n{newer}\n");

    let root = parse_trusted_root_jsonl(&content).unwrap();
    let instant = 1660000000; // August 2022, after both starts
    let selected = root.ca_at(instant).expect("a CA should match");
    assert_eq!(selected.cert_chain, vec![b"newer-ca".to_vec()]);
}

#[test]
fn test_ca_at_rejects_timestamp_before_any_validity_window() {
    let doc = ca_document(&BASE64.encode(b"github-ca"), "2023-10-27T00:00:00Z", None);
    let root = parse_trusted_root_jsonl(&format!("{doc}\n")).unwrap();

    let before_all = 1600000000; // September 2020
    assert!(root.ca_at(before_all).is_none());
}

#[test]
fn test_ca_at_respects_closed_validity_window() {
    let doc = ca_document(
        &BASE64.encode(b"retired-ca"),
        "2023-10-27T00:00:00Z",
        Some("2024-05-25T00:00:00Z"),
    );
    let root = parse_trusted_root_jsonl(&format!("{doc}\n")).unwrap();

    let inside = 1715000000; // May 2024, before the end date
    assert!(root.ca_at(inside).is_some());

    let after_expiry = 1735689600; // January 2025
    assert!(root.ca_at(after_expiry).is_none());
}
