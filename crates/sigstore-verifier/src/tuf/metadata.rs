//! TUF metadata shapes and threshold-signature verification: the data half
//! of component D. Grounded on the standard TUF envelope
//! `{"signed": {...}, "signatures": [...]}`; `signed` is kept as a
//! `serde_json::Value` (whose object variant is key-sorted by default) so
//! re-serializing it for signature verification reproduces the canonical
//! byte form without a bespoke canonicalizer.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::hash::sha256;
use crate::crypto::signature::{parse_public_key, construct_tuf_public_key, PublicKey};
use crate::error::TufError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub signed: serde_json::Value,
    pub signatures: Vec<MetadataSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSignature {
    pub keyid: String,
    pub sig: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyDefinition {
    pub keytype: String,
    pub scheme: String,
    pub keyval: KeyVal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyVal {
    pub public: String,
}

impl KeyDefinition {
    pub fn to_public_key(&self) -> Result<PublicKey, TufError> {
        let malformed = |e: std::fmt::Arguments| TufError::MalformedMetadata(format!("{e}"));
        match self.keytype.as_str() {
            "ed25519" => {
                let raw = hex::decode(&self.keyval.public)
                    .map_err(|e| malformed(format_args!("bad ed25519 key hex: {e}")))?;
                construct_tuf_public_key(&raw, "ed25519")
                    .map_err(|e| malformed(format_args!("{e}")))
            }
            "ecdsa" | "ecdsa-sha2-nistp256" => {
                parse_public_key(self.keyval.public.as_bytes())
                    .map_err(|e| malformed(format_args!("{e}")))
            }
            other => Err(TufError::MalformedMetadata(format!(
                "unsupported TUF key type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleKeys {
    pub keyids: Vec<String>,
    pub threshold: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RootMetadata {
    pub version: u64,
    pub expires: String,
    pub keys: HashMap<String, KeyDefinition>,
    pub roles: HashMap<String, RoleKeys>,
    #[serde(default)]
    pub consistent_snapshot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaFileInfo {
    pub version: u64,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub hashes: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimestampMetadata {
    pub version: u64,
    pub expires: String,
    pub meta: HashMap<String, MetaFileInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u64,
    pub expires: String,
    pub meta: HashMap<String, MetaFileInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetFileInfo {
    pub length: u64,
    pub hashes: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetsMetadata {
    pub version: u64,
    pub expires: String,
    pub targets: HashMap<String, TargetFileInfo>,
}

pub fn parse_expires(expires: &str) -> Result<DateTime<Utc>, TufError> {
    DateTime::parse_from_rfc3339(expires)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TufError::MalformedMetadata(format!("invalid expires timestamp: {e}")))
}

pub fn is_expired(expires: &str, now: DateTime<Utc>) -> Result<bool, TufError> {
    Ok(parse_expires(expires)? < now)
}

/// Verify that `role_keys.threshold` distinct, valid signatures over
/// `envelope.signed` exist among `keys`, each identified by its `keyid`.
/// A signer that fails to parse or verify is simply not counted — it is not
/// a fatal error by itself, only an insufficient-threshold one.
pub fn verify_threshold(
    envelope: &Envelope,
    role: &str,
    role_keys: &RoleKeys,
    keys: &HashMap<String, KeyDefinition>,
) -> Result<(), TufError> {
    let canonical = serde_json::to_vec(&envelope.signed)
        .map_err(|e| TufError::MalformedMetadata(e.to_string()))?;
    let digest = sha256(&canonical);

    let mut valid = 0u32;
    let mut counted_keyids = HashSet::new();

    for sig in &envelope.signatures {
        if !role_keys.keyids.contains(&sig.keyid) {
            continue;
        }
        if !counted_keyids.insert(sig.keyid.clone()) {
            continue;
        }
        let Some(key_def) = keys.get(&sig.keyid) else {
            continue;
        };
        let Ok(public_key) = key_def.to_public_key() else {
            continue;
        };
        let Ok(sig_bytes) = hex::decode(&sig.sig) else {
            continue;
        };
        if public_key.verify_digest(&digest, &sig_bytes).is_ok() {
            valid += 1;
        }
    }

    if valid < role_keys.threshold {
        return Err(TufError::ThresholdNotMet {
            role: role.to_string(),
            required: role_keys.threshold,
            valid,
        });
    }

    Ok(())
}

/// Verify `data`'s SHA-256 (and length, if recorded) against `meta`.
pub fn verify_meta_hash(data: &[u8], meta: &MetaFileInfo) -> Result<(), TufError> {
    if let Some(expected_len) = meta.length {
        if data.len() as u64 != expected_len {
            return Err(TufError::TargetMismatch(format!(
                "length mismatch: expected {expected_len}, got {}",
                data.len()
            )));
        }
    }
    if let Some(hashes) = &meta.hashes {
        if let Some(expected_hex) = hashes.get("sha256") {
            let actual_hex = hex::encode(sha256(data));
            if &actual_hex != expected_hex {
                return Err(TufError::TargetMismatch("sha256 mismatch".to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        assert!(is_expired("2000-01-01T00:00:00Z", Utc::now()).unwrap());
    }

    #[test]
    fn test_is_not_expired() {
        assert!(!is_expired("2999-01-01T00:00:00Z", Utc::now()).unwrap());
    }

    #[test]
    fn test_verify_meta_hash_detects_length_mismatch() {
        let meta = MetaFileInfo {
            version: 1,
            length: Some(3),
            hashes: None,
        };
        let result = verify_meta_hash(b"abcd", &meta);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_meta_hash_accepts_correct_sha256() {
        let data = b"hello";
        let mut hashes = HashMap::new();
        hashes.insert("sha256".to_string(), hex::encode(sha256(data)));
        let meta = MetaFileInfo {
            version: 1,
            length: Some(data.len() as u64),
            hashes: Some(hashes),
        };
        assert!(verify_meta_hash(data, &meta).is_ok());
    }

    #[test]
    fn test_threshold_not_met_when_no_signatures() {
        let envelope = Envelope {
            signed: serde_json::json!({"version": 1}),
            signatures: vec![],
        };
        let role_keys = RoleKeys {
            keyids: vec!["k1".to_string()],
            threshold: 1,
        };
        let result = verify_threshold(&envelope, "root", &role_keys, &HashMap::new());
        assert!(matches!(result, Err(TufError::ThresholdNotMet { .. })));
    }
}
