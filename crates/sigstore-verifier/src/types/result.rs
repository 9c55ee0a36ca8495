use chrono::{DateTime, Utc};

use super::certificate::OidcIdentity;
use crate::matchers::CertificateMatcher;

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub certificate_hashes: CertificateChainHashes,
    /// The Rekor entry's `integratedTime`, the instant step 7 (temporal
    /// binding) checked the leaf's validity against.
    pub signing_time: DateTime<Utc>,
    pub subject_digest: Vec<u8>,
    pub oidc_identity: Option<OidcIdentity>,
}

/// SHA-256 of each DER certificate in the resolved chain, leaf first,
/// generalized to however many intermediates the Fulcio verifier actually
/// walked (the bundle's `certPath` may be incomplete; the trust root fills
/// in the rest).
#[derive(Debug, Clone)]
pub struct CertificateChainHashes {
    pub leaf: [u8; 32],
    pub intermediates: Vec<[u8; 32]>,
    pub root: [u8; 32],
}

impl CertificateChainHashes {
    pub fn as_tuple(&self) -> ([u8; 32], Vec<[u8; 32]>, [u8; 32]) {
        (self.leaf, self.intermediates.clone(), self.root)
    }
}

#[derive(Debug, Default)]
pub struct VerificationOptions {
    /// Component H: identity predicates over the leaf. Empty means "any
    /// identity is acceptable", per spec §4.G step 4.
    pub certificate_matchers: Vec<Box<dyn CertificateMatcher>>,
    pub allow_insecure_sct: bool,
    /// Spec §9 Open Question (b): enforce inclusion-proof presence rather
    /// than accepting SET-only verification.
    pub require_inclusion_proof: bool,
}
