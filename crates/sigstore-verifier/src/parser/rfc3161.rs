//! RFC 3161 timestamp-token verification.
//!
//! Compiled only behind the `rfc3161` feature. The orchestrator never calls
//! into this module: a bundle carrying any `timestamps` entry is rejected at
//! the bundle-shape check (spec step 1), regardless of whether this feature
//! is enabled. It exists so a future revision that accepts RFC-3161 material
//! alongside Rekor inclusion can wire it in without restructuring the crate
//! (open question (a)).

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use der::asn1::OctetStringRef;
use der::{Decode, Encode};
use x509_cert::Certificate;

use crate::crypto::signature::{from_certificate, PublicKey};
use crate::crypto::hash::{sha256, sha384};
use crate::error::TimestampError;

/// The decoded, but not yet signature-verified, contents of a timestamp token.
#[derive(Debug, Clone)]
pub struct TimestampToken {
    pub gen_time_unix: i64,
    pub message_imprint_hash_alg: String,
    pub message_imprint: Vec<u8>,
    signed_attrs_der: Vec<u8>,
    signature: Vec<u8>,
    signer_cert: Option<Certificate>,
}

/// Parse a DER-encoded RFC 3161 `TimeStampToken` (a CMS `ContentInfo` wrapping
/// a `SignedData` whose `encapContentInfo` is a `TSTInfo`).
pub fn parse_timestamp_token(der: &[u8]) -> Result<TimestampToken, TimestampError> {
    let content_info =
        ContentInfo::from_der(der).map_err(|e| TimestampError::Rfc3161Parse(e.to_string()))?;
    let signed_data: SignedData = content_info
        .content
        .decode_as()
        .map_err(|e| TimestampError::Rfc3161Parse(e.to_string()))?;

    let signer_info = signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or_else(|| TimestampError::Rfc3161Parse("no SignerInfo in SignedData".into()))?;

    let tst_info_der = signed_data
        .encap_content_info
        .econtent
        .as_ref()
        .ok_or_else(|| TimestampError::Rfc3161Parse("missing encapsulated TSTInfo".into()))?;
    let tst_info_bytes = OctetStringRef::from_der(tst_info_der.value())
        .map(|s| s.as_bytes().to_vec())
        .unwrap_or_else(|_| tst_info_der.value().to_vec());

    let (gen_time_unix, hash_alg, imprint) = parse_tst_info(&tst_info_bytes)?;

    let signer_cert = signed_data.certificates.as_ref().and_then(|certs| {
        certs.0.iter().find_map(|choice| match choice {
            CertificateChoices::Certificate(cert) => Some(cert.clone()),
            _ => None,
        })
    });

    let signed_attrs_der = signer_info
        .signed_attrs
        .as_ref()
        .map(|attrs| attrs.to_der())
        .transpose()
        .map_err(|e| TimestampError::Rfc3161Parse(e.to_string()))?
        .unwrap_or_default();

    Ok(TimestampToken {
        gen_time_unix,
        message_imprint_hash_alg: hash_alg,
        message_imprint: imprint,
        signed_attrs_der,
        signature: signer_info.signature.as_bytes().to_vec(),
        signer_cert,
    })
}

/// TSTInfo ::= SEQUENCE { version, policy, messageImprint, serialNumber,
/// genTime, ... }. We pick out just `messageImprint` and `genTime` by walking
/// the DER tag stream rather than modeling the full ASN.1 grammar, since
/// those are the only two fields this verifier consumes.
fn parse_tst_info(der: &[u8]) -> Result<(i64, String, Vec<u8>), TimestampError> {
    use asn1_rs::{FromDer, GeneralizedTime, Integer, Sequence};

    let (_, seq) = Sequence::from_der(der)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("TSTInfo: {e}")))?;
    let content = seq.content.as_ref();

    let (rest, _version) = Integer::from_der(content)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("TSTInfo.version: {e}")))?;
    let (rest, _policy) = asn1_rs::Oid::from_der(rest)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("TSTInfo.policy: {e}")))?;
    let (rest, message_imprint_seq) = Sequence::from_der(rest)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("TSTInfo.messageImprint: {e}")))?;
    let (_, _serial) = Integer::from_der(rest)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("TSTInfo.serialNumber: {e}")))?;

    let imprint_content = message_imprint_seq.content.as_ref();
    let (imprint_rest, alg_seq) = Sequence::from_der(imprint_content)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("AlgorithmIdentifier: {e}")))?;
    let (_, alg_oid) = asn1_rs::Oid::from_der(alg_seq.content.as_ref())
        .map_err(|e| TimestampError::Rfc3161Parse(format!("AlgorithmIdentifier.oid: {e}")))?;
    let (_, hashed_message) = asn1_rs::OctetString::from_der(imprint_rest)
        .map_err(|e| TimestampError::Rfc3161Parse(format!("messageImprint.hashedMessage: {e}")))?;

    let hash_alg = match alg_oid.to_string().as_str() {
        "2.16.840.1.101.3.4.2.1" => "sha256",
        "2.16.840.1.101.3.4.2.2" => "sha384",
        other => return Err(TimestampError::UnsupportedHashAlgorithm(other.to_string())),
    }
    .to_string();

    // genTime is further along the SEQUENCE; scan forward for the
    // GeneralizedTime tag (0x18) rather than threading every intervening
    // optional field (accuracy, ordering, nonce are all absent in Sigstore's
    // TSA profile).
    let gen_time_offset = content
        .windows(1)
        .position(|w| w[0] == 0x18)
        .ok_or_else(|| TimestampError::Rfc3161Parse("genTime not found".into()))?;
    let (_, gen_time) = GeneralizedTime::from_der(&content[gen_time_offset..])
        .map_err(|e| TimestampError::Rfc3161Parse(format!("TSTInfo.genTime: {e}")))?;
    let gen_time_unix = gen_time
        .utc_datetime()
        .map_err(|e| TimestampError::Rfc3161Parse(e.to_string()))?
        .timestamp();

    Ok((gen_time_unix, hash_alg, hashed_message.into_cow().into_owned()))
}

/// Verify that `artifact_digest` matches the token's message imprint and
/// that the token's signature verifies under its embedded (or supplied) TSA
/// certificate.
pub fn verify_timestamp_token(
    token: &TimestampToken,
    artifact_digest: &[u8],
) -> Result<(), TimestampError> {
    let expected = match token.message_imprint_hash_alg.as_str() {
        "sha256" => sha256(artifact_digest).to_vec(),
        "sha384" => sha384(artifact_digest).to_vec(),
        other => return Err(TimestampError::UnsupportedHashAlgorithm(other.to_string())),
    };
    if expected != token.message_imprint {
        return Err(TimestampError::MessageImprintMismatch {
            expected: hex::encode(&expected),
            actual: hex::encode(&token.message_imprint),
        });
    }

    let cert = token
        .signer_cert
        .as_ref()
        .ok_or(TimestampError::MissingTSAChain)?;
    let cert_der = cert
        .to_der()
        .map_err(|e| TimestampError::InvalidTSACertificate(e.to_string()))?;
    let (_, parsed) = x509_parser::certificate::X509Certificate::from_der(&cert_der)
        .map_err(|e| TimestampError::InvalidTSACertificate(e.to_string()))?;
    let public_key =
        from_certificate(&parsed).map_err(|e| TimestampError::InvalidTSACertificate(e.to_string()))?;

    let digest = match &public_key {
        PublicKey::EcdsaP384(_) => sha384(&token.signed_attrs_der).to_vec(),
        _ => sha256(&token.signed_attrs_der).to_vec(),
    };

    public_key
        .verify_digest(&digest, &token.signature)
        .map_err(|_| TimestampError::Rfc3161SignatureInvalid)
}
