//! Component G step 8: verify the bundle's raw signature over the artifact
//! digest using the leaf certificate's public key.
//!
//! Everything needed already exists in [`crate::crypto::signature`]; this is
//! the thin seam that ties the leaf certificate to that verification, kept
//! separate from certificate-chain verification so the orchestrator can
//! sequence it after the log-binding check as spec §4.G step 8 requires.

use x509_parser::prelude::X509Certificate;

use crate::crypto::signature::PublicKey;
use crate::error::CryptoError;

pub fn verify_artifact_signature(
    leaf: &X509Certificate,
    artifact_digest: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let public_key = PublicKey::from_certificate(leaf)?;
    public_key.verify_digest(artifact_digest, signature)
}
