//! In-memory model of the TUF-delivered trust root: component C.
//!
//! Pure data plus lookup helpers. Once constructed a [`TrustedRoot`] is
//! immutable; verifiers only ever hold a shared reference to it.

use serde::{Deserialize, Serialize};

use crate::crypto::signature::{construct_tuf_public_key, PublicKey};
use crate::error::CryptoError;

/// A half-open validity window `[start, end)`. `end = None` means "still valid".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidFor {
    pub start: i64,
    pub end: Option<i64>,
}

impl ValidFor {
    pub fn contains(&self, instant: i64) -> bool {
        instant >= self.start && self.end.map(|end| instant < end).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateAuthority {
    /// DER-encoded certificates, leaf (the CA's own cert) first, root last.
    pub cert_chain: Vec<Vec<u8>>,
    pub valid_for: ValidFor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyLogKey {
    pub log_id: [u8; 32],
    pub raw_public_key: Vec<u8>,
    pub key_scheme: String,
    pub valid_for: ValidFor,
}

impl TransparencyLogKey {
    pub fn public_key(&self) -> Result<PublicKey, CryptoError> {
        construct_tuf_public_key(&self.raw_public_key, &self.key_scheme)
    }
}

/// The authoritative enumeration of trusted Fulcio CAs, Rekor log keys, and
/// CT log keys, each with validity intervals, as delivered by the TUF client.
#[derive(Debug, Clone, Default)]
pub struct TrustedRoot {
    pub certificate_authorities: Vec<CertificateAuthority>,
    pub tlogs: Vec<TransparencyLogKey>,
    pub ctlogs: Vec<TransparencyLogKey>,
}

impl TrustedRoot {
    /// The CA whose `valid_for` contains `instant`, preferring the one with
    /// the latest `start` when more than one matches (open question (c)).
    pub fn ca_at(&self, instant: i64) -> Option<&CertificateAuthority> {
        self.certificate_authorities
            .iter()
            .filter(|ca| ca.valid_for.contains(instant))
            .max_by_key(|ca| ca.valid_for.start)
    }

    pub fn tlog_by_id(&self, log_id: &[u8]) -> Option<&TransparencyLogKey> {
        self.tlogs
            .iter()
            .filter(|k| k.log_id == log_id)
            .max_by_key(|k| k.valid_for.start)
    }

    pub fn ctlog_by_id(&self, log_id: &[u8]) -> Option<&TransparencyLogKey> {
        self.ctlogs
            .iter()
            .filter(|k| k.log_id == log_id)
            .max_by_key(|k| k.valid_for.start)
    }
}
