//! Error taxonomy for the verification core.
//!
//! [`VerificationError`] is the single type the orchestrator returns; it
//! wraps one sub-error per component so callers can match on `source()`
//! without string-parsing a message.

use thiserror::Error;

/// Component A: key parsing and signature verification.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("unrecognized or malformed key encoding: {0}")]
    BadKeyFormat(String),

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature verification failed")]
    InvalidSignature,
}

/// Component B/E: certificate parsing, chain building, and SCT verification.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("failed to parse certificate: {0}")]
    ParseError(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("no path from the leaf to a trusted CA could be built")]
    ChainBuildFailed,

    #[error("leaf certificate was not issued by any CA trusted at its notBefore")]
    UntrustedCa,

    #[error("leaf certificate carries no SCT list extension")]
    MissingSct,

    #[error("none of the leaf's embedded SCTs verified under a trusted CT log")]
    NoValidSct,

    #[error("leaf certificate violates end-entity constraints: {0}")]
    BadLeafConstraints(String),

    #[error("unrecognized certificate issuer common name: {0}")]
    UnknownIssuer(String),

    #[error("failed to fetch trust bundle: {0}")]
    TrustBundleFetch(String),

    #[error(
        "signing time {signing_time} outside certificate validity [{not_before}, {not_after}]"
    )]
    SigningTimeOutsideValidity {
        signing_time: String,
        not_before: String,
        not_after: String,
    },
}

/// Component F: Rekor transparency-log entry verification.
#[derive(Debug, Error)]
pub enum TransparencyError {
    #[error("no Rekor entry present")]
    NoRekorEntry,

    #[error("bundle must carry exactly one Rekor entry, found {0}")]
    WrongEntryCount(usize),

    #[error("Rekor log ID is not present in the trusted root")]
    UntrustedLog,

    #[error("Rekor log key was not valid at the entry's integrated time")]
    LogKeyExpired,

    #[error("signed entry timestamp failed to verify: {0}")]
    BadSet(String),

    #[error("inclusion proof is required but absent")]
    MissingInclusionProof,

    #[error("inclusion proof failed to reproduce the signed tree root")]
    BadInclusionProof,

    #[error("checkpoint signature or tree head mismatch: {0}")]
    BadCheckpoint(String),

    #[error("malformed entry hash or proof element")]
    InvalidEntryHash,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("failed to fetch Rekor entry: {0}")]
    RekorFetchFailed(String),
}

/// Temporal binding and the (pluggable, unused) RFC 3161 path.
#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("invalid integrated time")]
    InvalidIntegratedTime,

    #[error("no usable timestamp found on the bundle")]
    NoTimestamp,

    #[error("RFC 3161 timestamp tokens are not accepted by this verifier")]
    Rfc3161NotSupported,

    #[error("failed to parse RFC 3161 timestamp: {0}")]
    Rfc3161Parse(String),

    #[error("RFC 3161 timestamp signature invalid")]
    Rfc3161SignatureInvalid,

    #[error("message imprint mismatch: expected {expected}, computed {actual}")]
    MessageImprintMismatch { expected: String, actual: String },

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    #[error("invalid TSA certificate: {0}")]
    InvalidTSACertificate(String),

    #[error("no TSA certificate chain available to verify the timestamp")]
    MissingTSAChain,
}

/// Component D: TUF client failures.
#[derive(Debug, Error)]
pub enum TufError {
    #[error("root metadata version regressed: have {current}, received {received}")]
    RollbackDetected { current: u64, received: u64 },

    #[error("metadata expired at {0}")]
    MetadataExpired(String),

    #[error("signature threshold not met for role {role}: need {required}, got {valid}")]
    ThresholdNotMet {
        role: String,
        required: u32,
        valid: u32,
    },

    #[error("target hash or length mismatch for {0}")]
    TargetMismatch(String),

    #[error("target not found in targets metadata: {0}")]
    TargetNotFound(String),

    #[error("network error after retries: {0}")]
    NetworkError(String),

    #[error("deadline exceeded while updating TUF metadata")]
    DeadlineExceeded,

    #[error("malformed TUF metadata: {0}")]
    MalformedMetadata(String),

    #[error("local TUF cache error: {0}")]
    CacheError(String),
}

/// Component H: identity matcher evaluation.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("failed to read certificate field during matching: {0}")]
    EvaluationFailed(String),

    #[error("invalid regular expression in matcher: {0}")]
    InvalidPattern(String),
}

/// The single error type returned by [`crate::AttestationVerifier`].
///
/// Variants are ordered to mirror the eight orchestrator steps in the
/// specification; the orchestrator always reports the first failing step.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("bundle is malformed: {0}")]
    BundleMalformed(String),

    #[error("artifact digest does not match the bundle's message-signature digest")]
    DigestMismatch,

    #[error(transparent)]
    Fulcio(#[from] CertificateError),

    #[error("no certificate identity matcher matched the leaf certificate")]
    NoIdentityMatch,

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Rekor(#[from] TransparencyError),

    #[error("Rekor entry body does not bind to this artifact, certificate, and signature")]
    LogBindingMismatch,

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("leaf certificate was not valid at the log's integrated time")]
    TimeOutOfValidity,

    #[error("signature over the artifact digest is invalid")]
    SignatureInvalid,

    #[error(transparent)]
    Tuf(#[from] TufError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
