pub mod json;
pub mod model;
pub mod provider;

pub use json::{parse_trusted_root_json, parse_trusted_root_jsonl};
pub use model::{CertificateAuthority, TransparencyLogKey, TrustedRoot, ValidFor};
pub use provider::{FileTrustedRootProvider, TrustedRootProvider};

#[cfg(feature = "fetcher")]
pub use provider::{PublicGoodTrustedRootProvider, StagingTrustedRootProvider};
