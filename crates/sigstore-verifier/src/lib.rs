//! Keyless Sigstore bundle verification: a Fulcio certificate, a Rekor
//! transparency-log entry, and a raw signature over an artifact digest,
//! checked against a trust root delivered out-of-band (see [`trust`]).
//!
//! [`AttestationVerifier`] is the orchestrator: it owns a [`trust::model::TrustedRoot`]
//! and runs the eight-step algorithm below against any bundle presented to it.
//! No network or filesystem access happens here — that's [`trust::provider`]'s
//! job (and, behind the `fetcher` feature, [`tuf::client`]'s).

pub mod crypto;
pub mod error;
pub mod matchers;
pub mod parser;
pub mod trust;
pub mod tuf;
pub mod types;
pub mod verifier;

use tracing::{debug, instrument};

use error::VerificationError;
use matchers::any_matches;
use parser::bundle::{decode_base64, get_cert_path, parse_bundle_from_bytes, parse_bundle_from_path, validate_bundle};
use parser::certificate::parse_der_certificate;
use parser::identity::extract_oidc_identity;
use trust::model::TrustedRoot;
use types::bundle::SigstoreBundle;
use types::result::{VerificationOptions, VerificationResult};
use verifier::certificate::verify_certificate_chain;
use verifier::signature::verify_artifact_signature;
use verifier::subject::{verify_digest_consistency, verify_log_binding};
use verifier::timestamp::{get_integrated_time, verify_signing_time_in_validity};
use verifier::transparency::verify_transparency_log;

/// Verifies Sigstore bundles against a fixed trust root.
///
/// Holds no mutable state; safe to share across threads and to reuse across
/// many `verify_*` calls against the same trust root.
#[derive(Debug, Clone)]
pub struct AttestationVerifier {
    trusted_root: TrustedRoot,
}

impl AttestationVerifier {
    pub fn new(trusted_root: TrustedRoot) -> Self {
        Self { trusted_root }
    }

    pub fn trusted_root(&self) -> &TrustedRoot {
        &self.trusted_root
    }

    /// Verify a bundle read from `bundle_path` against `artifact_digest`
    /// (the SHA-256 digest of the signed artifact, computed by the caller).
    #[instrument(skip(self, options), fields(bundle_path = %bundle_path.display()))]
    pub fn verify_bundle(
        &self,
        bundle_path: &std::path::Path,
        artifact_digest: &[u8],
        options: &VerificationOptions,
    ) -> Result<VerificationResult, VerificationError> {
        let bundle = parse_bundle_from_path(bundle_path)?;
        self.verify_digest(&bundle, artifact_digest, options)
    }

    /// Verify a bundle given as raw JSON bytes.
    #[instrument(skip(self, bundle_json, options))]
    pub fn verify_bundle_bytes(
        &self,
        bundle_json: &[u8],
        artifact_digest: &[u8],
        options: &VerificationOptions,
    ) -> Result<VerificationResult, VerificationError> {
        let bundle = parse_bundle_from_bytes(bundle_json)?;
        self.verify_digest(&bundle, artifact_digest, options)
    }

    /// The eight-step verification algorithm, run against an already-parsed
    /// bundle and a caller-supplied artifact digest.
    #[instrument(skip(self, bundle, options))]
    pub fn verify_digest(
        &self,
        bundle: &SigstoreBundle,
        artifact_digest: &[u8],
        options: &VerificationOptions,
    ) -> Result<VerificationResult, VerificationError> {
        // Step 1: bundle shape.
        debug!("step 1: validating bundle shape");
        validate_bundle(bundle)?;
        let message_signature = bundle
            .message_signature
            .as_ref()
            .expect("validate_bundle guarantees messageSignature is present");

        // Step 2: digest consistency.
        debug!("step 2: checking digest consistency");
        verify_digest_consistency(message_signature, artifact_digest)?;

        let cert_path = get_cert_path(bundle)?;

        // Step 3: certificate validity (Fulcio chain + SCT).
        debug!("step 3: verifying Fulcio certificate chain");
        let fulcio = verify_certificate_chain(&cert_path, &self.trusted_root)?;
        let leaf = parse_der_certificate(&cert_path[0])?;

        // Step 4: identity match.
        debug!("step 4: evaluating certificate identity matchers");
        if !any_matches(&options.certificate_matchers, &leaf)? {
            return Err(VerificationError::NoIdentityMatch);
        }

        let entry = &bundle.verification_material.tlog_entries[0];
        let integrated_time = get_integrated_time(entry)?;

        // Step 5: log entry authenticity (Rekor SET / inclusion proof).
        debug!("step 5: verifying Rekor transparency log entry");
        verify_transparency_log(
            entry,
            &self.trusted_root,
            integrated_time.timestamp(),
            options.require_inclusion_proof,
        )?;

        // Step 6: log-body binding.
        debug!("step 6: checking hashed-rekord log binding");
        let signature = decode_base64(&message_signature.signature)?;
        verify_log_binding(
            artifact_digest,
            &cert_path[0],
            &signature,
            &entry.canonicalized_body,
        )?;

        // Step 7: temporal binding.
        debug!("step 7: checking leaf validity at the integrated time");
        verify_signing_time_in_validity(&integrated_time, &leaf)
            .map_err(|_| VerificationError::TimeOutOfValidity)?;

        // Step 8: raw signature verification.
        debug!("step 8: verifying the artifact signature");
        verify_artifact_signature(&leaf, artifact_digest, &signature)
            .map_err(|_| VerificationError::SignatureInvalid)?;

        let oidc_identity = extract_oidc_identity(&leaf).ok();

        Ok(VerificationResult {
            certificate_hashes: fulcio.hashes,
            signing_time: integrated_time,
            subject_digest: artifact_digest.to_vec(),
            oidc_identity,
        })
    }
}
