//! `TrustedRootProvider`: dependency-injected sourcing of the trust root,
//! replacing the source's global `sigstorePublicDefaults`/
//! `sigstoreStagingDefaults` builder statics with an explicit value the
//! caller constructs and owns (design note in spec §9).

use std::path::{Path, PathBuf};

use crate::error::VerificationError;
use crate::trust::json::{parse_trusted_root_json, parse_trusted_root_jsonl};
use crate::trust::model::TrustedRoot;

pub trait TrustedRootProvider {
    fn load(&self) -> Result<TrustedRoot, VerificationError>;
}

/// Reads a trust root from a local file: either a single
/// `dev.sigstore.trustroot.v1.TrustedRoot` JSON document, or (detected by a
/// `.jsonl` extension) a concatenated stream of such documents — the
/// generalized form of the teacher's CA/TSA-only multi-root loader, now
/// covering CAs, Rekor tlogs, and CT logs uniformly.
///
/// Backs the `SIGSTORE_TRUSTED_ROOT` environment override for offline use.
pub struct FileTrustedRootProvider {
    path: PathBuf,
}

impl FileTrustedRootProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrustedRootProvider for FileTrustedRootProvider {
    fn load(&self) -> Result<TrustedRoot, VerificationError> {
        let contents = std::fs::read_to_string(&self.path)?;
        if is_jsonl(&self.path) {
            parse_trusted_root_jsonl(&contents)
        } else {
            parse_trusted_root_json(contents.as_bytes())
        }
    }
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("jsonl")
}

#[cfg(feature = "fetcher")]
mod remote {
    use super::*;
    use crate::error::VerificationError;
    use crate::tuf::client::{TufClient, TufRepositoryConfig};

    const PUBLIC_GOOD_METADATA_URL: &str = "https://tuf-repo-cdn.sigstore.dev";
    const PUBLIC_GOOD_TARGETS_URL: &str = "https://tuf-repo-cdn.sigstore.dev/targets";
    const STAGING_METADATA_URL: &str = "https://tuf-repo-cdn.sigstage.dev";
    const STAGING_TARGETS_URL: &str = "https://tuf-repo-cdn.sigstage.dev/targets";

    /// The production Sigstore public-good TUF repository.
    pub struct PublicGoodTrustedRootProvider {
        client: TufClient,
    }

    impl PublicGoodTrustedRootProvider {
        pub fn new(cache_dir: impl Into<std::path::PathBuf>, embedded_root_json: &[u8]) -> Self {
            let config = TufRepositoryConfig {
                metadata_base_url: PUBLIC_GOOD_METADATA_URL.to_string(),
                targets_base_url: PUBLIC_GOOD_TARGETS_URL.to_string(),
                cache_dir: cache_dir.into(),
                cache_validity_seconds: 24 * 60 * 60,
            };
            Self {
                client: TufClient::new(config, embedded_root_json.to_vec()),
            }
        }
    }

    impl TrustedRootProvider for PublicGoodTrustedRootProvider {
        fn load(&self) -> Result<TrustedRoot, VerificationError> {
            let bytes = self
                .client
                .fetch_target("trusted_root.json")
                .map_err(VerificationError::Tuf)?;
            parse_trusted_root_json(&bytes)
        }
    }

    /// The Sigstore staging TUF repository, used by pre-release tooling.
    pub struct StagingTrustedRootProvider {
        client: TufClient,
    }

    impl StagingTrustedRootProvider {
        pub fn new(cache_dir: impl Into<std::path::PathBuf>, embedded_root_json: &[u8]) -> Self {
            let config = TufRepositoryConfig {
                metadata_base_url: STAGING_METADATA_URL.to_string(),
                targets_base_url: STAGING_TARGETS_URL.to_string(),
                cache_dir: cache_dir.into(),
                cache_validity_seconds: 24 * 60 * 60,
            };
            Self {
                client: TufClient::new(config, embedded_root_json.to_vec()),
            }
        }
    }

    impl TrustedRootProvider for StagingTrustedRootProvider {
        fn load(&self) -> Result<TrustedRoot, VerificationError> {
            let bytes = self
                .client
                .fetch_target("trusted_root.json")
                .map_err(VerificationError::Tuf)?;
            parse_trusted_root_json(&bytes)
        }
    }
}

#[cfg(feature = "fetcher")]
pub use remote::{PublicGoodTrustedRootProvider, StagingTrustedRootProvider};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_jsonl_detection() {
        assert!(is_jsonl(Path::new("roots.jsonl")));
        assert!(!is_jsonl(Path::new("roots.json")));
    }

    #[test]
    fn test_file_provider_missing_file_errors() {
        let provider = FileTrustedRootProvider::new("/nonexistent/path/trusted_root.json");
        assert!(provider.load().is_err());
    }
}
