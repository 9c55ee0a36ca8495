//! Component E: the Fulcio verifier.
//!
//! Decides whether a leaf certificate was issued by a currently trusted
//! Fulcio CA and carries at least one valid, trusted SCT. Grounded on the
//! teacher's `verify_certificate_chain`, generalized from a fixed
//! leaf/intermediates/root triple to a variable-length path built against
//! the trust root's time-bounded certificate authorities, and extended with
//! SCT extraction/verification (spec §4.E), which the teacher did not have.

use x509_parser::prelude::*;

use crate::crypto::hash::{sha256, sha384};
use crate::crypto::signature::PublicKey;
use crate::error::CertificateError;
use crate::parser::certificate::{get_intermediates, get_leaf, parse_der_certificate};
use crate::parser::sct::{sct_signed_data, without_sct};
use crate::trust::model::TrustedRoot;
use crate::types::result::CertificateChainHashes;

/// The outcome of a successful Fulcio verification: the built path and a
/// hash of each certificate in it, for audit logging.
pub struct FulcioVerification {
    pub cert_path: Vec<Vec<u8>>,
    pub hashes: CertificateChainHashes,
}

/// Verify the leaf (and any bundle-supplied intermediates) against a CA in
/// `trusted_root` active at the leaf's `notBefore`, and confirm at least one
/// embedded SCT verifies under a CT log trusted at the SCT's timestamp.
///
/// `cert_path` is the bundle's `certPath`: leaf first, any intermediates
/// following. Intermediates/root the bundle omits are supplied by the
/// matching CA's own `cert_chain`.
pub fn verify_certificate_chain(
    cert_path: &[Vec<u8>],
    trusted_root: &TrustedRoot,
) -> Result<FulcioVerification, CertificateError> {
    let leaf_der = get_leaf(cert_path)?.to_vec();
    let leaf = parse_der_certificate(&leaf_der)?;

    verify_leaf_constraints(&leaf)?;

    let not_before = leaf.validity().not_before.timestamp();
    let ca = trusted_root
        .ca_at(not_before)
        .ok_or(CertificateError::UntrustedCa)?;

    let bundle_intermediates = get_intermediates(cert_path);
    let full_chain = build_full_chain(&leaf_der, bundle_intermediates, ca)?;
    verify_chain_signatures(&full_chain)?;

    let issuer = parse_der_certificate(&full_chain[1])?;
    let issuer_key_hash = sha256(issuer.public_key().raw);

    verify_at_least_one_sct(&leaf, &leaf_der, &issuer_key_hash, trusted_root)?;

    let hashes = hash_chain(&full_chain);
    Ok(FulcioVerification {
        cert_path: full_chain,
        hashes,
    })
}

/// The leaf must not be a CA, must carry the code-signing EKU (when an EKU
/// extension is present — Fulcio leaves historically omit it for some
/// identity types), and must assert the digital-signature key usage bit.
fn verify_leaf_constraints(leaf: &X509Certificate) -> Result<(), CertificateError> {
    if leaf
        .basic_constraints()
        .ok()
        .flatten()
        .map(|bc| bc.value.ca)
        == Some(true)
    {
        return Err(CertificateError::BadLeafConstraints(
            "leaf certificate has CA=true".into(),
        ));
    }

    if let Ok(Some(key_usage)) = leaf.key_usage() {
        if !key_usage.value.digital_signature() {
            return Err(CertificateError::BadLeafConstraints(
                "leaf certificate lacks the digitalSignature key usage bit".into(),
            ));
        }
    }

    if let Ok(Some(eku)) = leaf.extended_key_usage() {
        if !eku.value.code_signing {
            return Err(CertificateError::BadLeafConstraints(
                "leaf certificate's EKU does not include code signing".into(),
            ));
        }
    }

    Ok(())
}

/// Build leaf-to-root: start from the leaf, append any intermediates the
/// bundle already supplied, then append whatever the trust root's CA path
/// contributes beyond what's already present (the CA's own `cert_chain` is
/// itself leaf-of-the-CA-to-root; its first entries overlap the bundle's
/// supplied intermediates when the bundle is complete).
fn build_full_chain(
    leaf_der: &[u8],
    bundle_intermediates: &[Vec<u8>],
    ca: &crate::trust::model::CertificateAuthority,
) -> Result<Vec<Vec<u8>>, CertificateError> {
    let mut chain = Vec::with_capacity(1 + bundle_intermediates.len() + ca.cert_chain.len());
    chain.push(leaf_der.to_vec());
    chain.extend(bundle_intermediates.iter().cloned());

    if chain.len() == 1 {
        chain.extend(ca.cert_chain.iter().cloned());
    } else {
        // The bundle already supplied at least one intermediate; only append
        // the trust root's entries the bundle path doesn't already reach.
        // The trust root's chain always ends in the same root regardless, so
        // append anything not already present by DER equality.
        for cert in &ca.cert_chain {
            if !chain.contains(cert) {
                chain.push(cert.clone());
            }
        }
    }

    if chain.len() < 2 {
        return Err(CertificateError::ChainBuildFailed);
    }
    Ok(chain)
}

fn verify_chain_signatures(chain: &[Vec<u8>]) -> Result<(), CertificateError> {
    for pair in chain.windows(2) {
        let subject = parse_der_certificate(&pair[0])?;
        let issuer = parse_der_certificate(&pair[1])?;
        verify_signed_by(&subject, &issuer)?;
    }

    // The root must be self-signed.
    let root = parse_der_certificate(chain.last().expect("chain has at least 2 entries"))?;
    verify_signed_by(&root, &root)?;
    Ok(())
}

/// sha384WithRSAEncryption / ecdsa-with-SHA384 — every other recognized
/// signature algorithm OID (sha256With*, ecdsa-with-SHA256, id-RSASSA-PSS)
/// hashes with SHA-256, Fulcio CA certificates never sign with PSS.
const OID_SHA384_WITH: &[&str] = &["1.2.840.113549.1.1.12", "1.2.840.10045.4.3.3"];
/// id-Ed25519: PureEdDSA signs the message directly, no prehash.
const OID_ED25519: &str = "1.3.101.112";

fn verify_signed_by(
    subject: &X509Certificate,
    issuer: &X509Certificate,
) -> Result<(), CertificateError> {
    let public_key = PublicKey::from_certificate(issuer)?;
    let tbs_der = subject.tbs_certificate.as_ref();
    let sig_oid = subject.signature_algorithm.algorithm.to_string();

    let digest: Vec<u8> = if sig_oid == OID_ED25519 {
        tbs_der.to_vec()
    } else if OID_SHA384_WITH.contains(&sig_oid.as_str()) {
        sha384(tbs_der).to_vec()
    } else {
        sha256(tbs_der).to_vec()
    };

    public_key
        .verify_digest(&digest, subject.signature_value.as_ref())
        .map_err(|_| CertificateError::ChainBuildFailed)
}

fn verify_at_least_one_sct(
    leaf: &X509Certificate,
    leaf_der: &[u8],
    issuer_key_hash: &[u8; 32],
    trusted_root: &TrustedRoot,
) -> Result<(), CertificateError> {
    let scts = crate::parser::sct::extract_scts(leaf)?;
    let tbs_without_sct = without_sct(leaf_der)?;

    let any_valid = scts.iter().any(|sct| {
        let Some(ct_log) = trusted_root.ctlog_by_id(&sct.log_id) else {
            return false;
        };
        if !ct_log.valid_for.contains(sct.timestamp as i64 / 1000) {
            return false;
        }
        let Ok(public_key) = ct_log.public_key() else {
            return false;
        };
        let signed_data = sct_signed_data(sct, issuer_key_hash, &tbs_without_sct);
        let digest = sha256(&signed_data);
        public_key.verify_digest(&digest, &sct.signature).is_ok()
    });

    if any_valid {
        Ok(())
    } else {
        Err(CertificateError::NoValidSct)
    }
}

fn hash_chain(chain: &[Vec<u8>]) -> CertificateChainHashes {
    let leaf = sha256(&chain[0]);
    let root = sha256(chain.last().expect("chain has at least 2 entries"));
    let intermediates = chain[1..chain.len() - 1].iter().map(|der| sha256(der)).collect();
    CertificateChainHashes {
        leaf,
        intermediates,
        root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::model::{CertificateAuthority, ValidFor};

    #[test]
    fn test_build_full_chain_appends_ca_chain_when_no_bundle_intermediates() {
        let ca = CertificateAuthority {
            cert_chain: vec![vec![2u8], vec![3u8]],
            valid_for: ValidFor { start: 0, end: None },
        };
        let chain = build_full_chain(&[1u8], &[], &ca).unwrap();
        assert_eq!(chain, vec![vec![1u8], vec![2u8], vec![3u8]]);
    }

    #[test]
    fn test_build_full_chain_dedupes_overlapping_bundle_intermediates() {
        let ca = CertificateAuthority {
            cert_chain: vec![vec![2u8], vec![3u8]],
            valid_for: ValidFor { start: 0, end: None },
        };
        let chain = build_full_chain(&[1u8], &[vec![2u8]], &ca).unwrap();
        assert_eq!(chain, vec![vec![1u8], vec![2u8], vec![3u8]]);
    }

    #[test]
    fn test_build_full_chain_rejects_single_entry_result() {
        let ca = CertificateAuthority {
            cert_chain: vec![],
            valid_for: ValidFor { start: 0, end: None },
        };
        let result = build_full_chain(&[1u8], &[], &ca);
        assert!(matches!(result, Err(CertificateError::ChainBuildFailed)));
    }
}
