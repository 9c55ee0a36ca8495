pub mod metadata;

#[cfg(feature = "fetcher")]
pub mod client;

pub use metadata::{
    is_expired, parse_expires, verify_meta_hash, verify_threshold, Envelope, KeyDefinition,
    MetaFileInfo, MetadataSignature, RoleKeys, RootMetadata, SnapshotMetadata, TargetFileInfo,
    TargetsMetadata, TimestampMetadata,
};

#[cfg(feature = "fetcher")]
pub use client::{TrustState, TufClient, TufRepositoryConfig};
