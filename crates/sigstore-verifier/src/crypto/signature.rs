//! Key parsing and signature verification: component A.
//!
//! [`PublicKey`] is a small tagged variant over the four schemes the
//! verification core needs to support. There is no `Verifier` trait object —
//! dispatch happens once, at parse time, by inspecting the key's algorithm
//! identifier; from then on `verify_digest` is a plain match.

use ecdsa::signature::hazmat::PrehashVerifier;
use rsa::signature::hazmat::PrehashVerifier as RsaPrehashVerifier;
use rsa::signature::Verifier as RsaSignatureVerifier;
use spki::SubjectPublicKeyInfoRef;
use x509_parser::prelude::X509Certificate;

use crate::error::CryptoError;

/// rsaEncryption, the PKCS#1 v1.5 RSA key OID used for both PKCS1v15 and PSS keys
/// in practice (PSS parameters, when present, live on the signature side).
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
/// id-RSASSA-PSS, used by keys that are only ever meant to sign with PSS.
const OID_RSASSA_PSS: &str = "1.2.840.113549.1.1.10";
/// id-ecPublicKey.
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
/// secp256r1 / prime256v1 named curve.
const OID_P256: &str = "1.2.840.10045.3.1.7";
/// secp384r1 named curve.
const OID_P384: &str = "1.3.132.0.34";
/// id-Ed25519.
const OID_ED25519: &str = "1.3.101.112";
/// id-dsa, explicitly rejected.
const OID_DSA: &str = "1.2.840.10040.4.1";

/// A parsed public key, tagged by the scheme it will verify with.
///
/// Adding a new algorithm is a new variant arm, not a new trait impl over an
/// open-ended verifier hierarchy.
#[derive(Clone)]
pub enum PublicKey {
    RsaPkcs1v15(rsa::RsaPublicKey),
    RsaPss(rsa::RsaPublicKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    EcdsaP384(p384::ecdsa::VerifyingKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            PublicKey::RsaPkcs1v15(_) => "RsaPkcs1v15",
            PublicKey::RsaPss(_) => "RsaPss",
            PublicKey::EcdsaP256(_) => "EcdsaP256",
            PublicKey::EcdsaP384(_) => "EcdsaP384",
            PublicKey::Ed25519(_) => "Ed25519",
        };
        write!(f, "PublicKey::{kind}")
    }
}

impl PublicKey {
    /// Verify `signature` over a precomputed `digest`.
    ///
    /// For Ed25519 there is no hash-then-sign step; `digest` is treated as
    /// the message directly, per spec.
    pub fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        match self {
            PublicKey::RsaPkcs1v15(key) => {
                let sig = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|_| CryptoError::InvalidSignature)?;
                let verifying_key = rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(key.clone());
                RsaPrehashVerifier::verify_prehash(&verifying_key, digest, &sig)
                    .map_err(|_| CryptoError::InvalidSignature)
            }
            PublicKey::RsaPss(key) => {
                let sig = rsa::pss::Signature::try_from(signature)
                    .map_err(|_| CryptoError::InvalidSignature)?;
                let verifying_key = rsa::pss::VerifyingKey::<sha2::Sha256>::new(key.clone());
                RsaPrehashVerifier::verify_prehash(&verifying_key, digest, &sig)
                    .map_err(|_| CryptoError::InvalidSignature)
            }
            PublicKey::EcdsaP256(key) => {
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .or_else(|_| p256::ecdsa::Signature::try_from(signature))
                    .map_err(|_| CryptoError::InvalidSignature)?;
                key.verify_prehash(digest, &sig)
                    .map_err(|_| CryptoError::InvalidSignature)
            }
            PublicKey::EcdsaP384(key) => {
                let sig = p384::ecdsa::Signature::from_der(signature)
                    .or_else(|_| p384::ecdsa::Signature::try_from(signature))
                    .map_err(|_| CryptoError::InvalidSignature)?;
                key.verify_prehash(digest, &sig)
                    .map_err(|_| CryptoError::InvalidSignature)
            }
            PublicKey::Ed25519(key) => {
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| CryptoError::InvalidSignature)?;
                RsaSignatureVerifier::verify(key, digest, &sig)
                    .map_err(|_| CryptoError::InvalidSignature)
            }
        }
    }
}

/// Parse a public key from a PEM-or-DER byte blob.
///
/// Recognizes the `PUBLIC KEY` (SPKI) and `RSA PUBLIC KEY` (PKCS#1) PEM
/// labels; a bare `RSA PUBLIC KEY` is wrapped into a PKIX `rsaEncryption`
/// SPKI before decoding so the rest of the pipeline has one representation.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    let text = std::str::from_utf8(bytes).unwrap_or_default();
    if text.trim_start().starts_with("-----BEGIN") {
        let parsed =
            pem::parse(bytes).map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?;
        return match parsed.tag() {
            "PUBLIC KEY" => from_spki_der(parsed.contents()),
            "RSA PUBLIC KEY" => {
                let key = rsa::RsaPublicKey::try_from(
                    rsa::pkcs1::RsaPublicKey::try_from(parsed.contents())
                        .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?,
                )
                .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?;
                Ok(PublicKey::RsaPkcs1v15(key))
            }
            other => Err(CryptoError::BadKeyFormat(format!(
                "unsupported PEM label: {other}"
            ))),
        };
    }

    from_spki_der(bytes)
}

/// Parse a key from a DER-encoded `SubjectPublicKeyInfo`.
pub fn from_spki_der(der: &[u8]) -> Result<PublicKey, CryptoError> {
    let spki = SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?;
    key_from_spki(&spki, der)
}

/// Parse the public key carried in a certificate's `tbsCertificate.subjectPublicKeyInfo`.
pub fn from_certificate(cert: &X509Certificate) -> Result<PublicKey, CryptoError> {
    let spki_der = cert.public_key().raw;
    from_spki_der(spki_der)
}

fn key_from_spki(spki: &SubjectPublicKeyInfoRef, full_der: &[u8]) -> Result<PublicKey, CryptoError> {
    let oid = spki.algorithm.oid.to_string();
    let bits = spki.subject_public_key.raw_bytes();
    let _ = full_der;

    let rsa_key_from_bits = || {
        let pkcs1 = rsa::pkcs1::RsaPublicKey::try_from(bits)
            .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?;
        rsa::RsaPublicKey::try_from(pkcs1).map_err(|e| CryptoError::BadKeyFormat(e.to_string()))
    };

    match oid.as_str() {
        OID_RSA_ENCRYPTION => Ok(PublicKey::RsaPkcs1v15(rsa_key_from_bits()?)),
        OID_RSASSA_PSS => Ok(PublicKey::RsaPss(rsa_key_from_bits()?)),
        OID_EC_PUBLIC_KEY => {
            let curve_oid = spki
                .algorithm
                .parameters_oid()
                .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))?
                .to_string();
            match curve_oid.as_str() {
                OID_P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(bits)
                    .map(PublicKey::EcdsaP256)
                    .map_err(|e| CryptoError::BadKeyFormat(e.to_string())),
                OID_P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(bits)
                    .map(PublicKey::EcdsaP384)
                    .map_err(|e| CryptoError::BadKeyFormat(e.to_string())),
                other => Err(CryptoError::UnsupportedAlgorithm(format!(
                    "EC curve {other}"
                ))),
            }
        }
        OID_ED25519 => ed25519_dalek::VerifyingKey::try_from(bits)
            .map(PublicKey::Ed25519)
            .map_err(|e| CryptoError::BadKeyFormat(e.to_string())),
        OID_DSA => Err(CryptoError::UnsupportedAlgorithm("DSA".into())),
        other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Build a public key from the raw bytes and scheme name found in TUF role
/// metadata (`root.json` keys, trusted-root log keys).
///
/// Only the two schemes TUF/Sigstore keys actually use are accepted;
/// `rsassa-pss-*` is rejected even though RSA-PSS is a valid signing scheme
/// elsewhere, because no TUF or trusted-root key is ever encoded that way.
pub fn construct_tuf_public_key(raw_bytes: &[u8], scheme: &str) -> Result<PublicKey, CryptoError> {
    match scheme {
        "ecdsa-sha2-nistp256" => {
            if raw_bytes.len() != 65 || raw_bytes[0] != 0x04 {
                return Err(CryptoError::BadKeyFormat(
                    "expected a 65-byte uncompressed EC point".into(),
                ));
            }
            p256::ecdsa::VerifyingKey::from_sec1_bytes(raw_bytes)
                .map(PublicKey::EcdsaP256)
                .map_err(|e| CryptoError::BadKeyFormat(e.to_string()))
        }
        "ed25519" => {
            if raw_bytes.len() == 32 {
                return ed25519_dalek::VerifyingKey::try_from(raw_bytes)
                    .map(PublicKey::Ed25519)
                    .map_err(|e| CryptoError::BadKeyFormat(e.to_string()));
            }
            match from_spki_der(raw_bytes)? {
                key @ PublicKey::Ed25519(_) => Ok(key),
                _ => Err(CryptoError::BadKeyFormat(
                    "ed25519 scheme did not decode to an Ed25519 key".into(),
                )),
            }
        }
        scheme if scheme.starts_with("rsassa-pss") => Err(CryptoError::UnsupportedAlgorithm(
            format!("{scheme} is not a valid TUF key scheme"),
        )),
        other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_tuf_key_rejects_pss() {
        let result = construct_tuf_public_key(&[0u8; 32], "rsassa-pss-sha256");
        assert!(matches!(result, Err(CryptoError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_construct_tuf_key_rejects_short_ecdsa_point() {
        let result = construct_tuf_public_key(&[0x04; 10], "ecdsa-sha2-nistp256");
        assert!(result.is_err());
    }

    #[test]
    fn test_construct_tuf_key_rejects_unknown_scheme() {
        let result = construct_tuf_public_key(&[0u8; 32], "dsa-sha1");
        assert!(matches!(result, Err(CryptoError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_parse_public_key_rejects_non_pem_garbage() {
        let result = parse_public_key(b"not a key at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_ed25519_tuf_key_roundtrip() {
        use ed25519_dalek::SigningKey;
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let verifying_key = signing_key.verifying_key();
        let raw = verifying_key.to_bytes();

        let parsed = construct_tuf_public_key(&raw, "ed25519").unwrap();
        assert!(matches!(parsed, PublicKey::Ed25519(_)));
    }
}
