//! Command-line interface definitions for sigstore-cli
//!
//! Defines all CLI commands, subcommands, and arguments using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sigstore-cli",
    author,
    version,
    about = "Verify keyless Sigstore attestation bundles",
    long_about = "Check a Sigstore bundle's Fulcio certificate, Rekor transparency log entry, and artifact signature against a trust root"
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv); overridden by RUST_LOG if set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a Sigstore bundle against an artifact
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the Sigstore bundle JSON file
    #[arg(long = "bundle", value_name = "PATH", required = true)]
    pub bundle_path: PathBuf,

    /// Path to the artifact the bundle attests to
    #[arg(long = "artifact", value_name = "PATH", conflicts_with = "digest")]
    pub artifact_path: Option<PathBuf>,

    /// Hex-encoded SHA-256 digest of the artifact, when the artifact itself
    /// isn't available locally
    #[arg(long = "digest", value_name = "HEX", conflicts_with = "artifact_path")]
    pub digest: Option<String>,

    /// Path to a trusted_root.json or trusted_root.jsonl file; overrides
    /// online TUF fetch
    #[arg(
        long = "trusted-root",
        env = "SIGSTORE_TRUSTED_ROOT",
        value_name = "PATH"
    )]
    pub trusted_root_path: Option<PathBuf>,

    /// Directory used to cache the TUF-fetched trust root
    #[arg(
        long = "tuf-cache",
        env = "SIGSTORE_TUF_CACHE",
        value_name = "DIR",
        default_value = ".sigstore-cache"
    )]
    pub tuf_cache_dir: PathBuf,

    /// Verify against Sigstore's staging instance instead of public-good
    #[arg(long = "staging")]
    pub staging: bool,

    /// Path to a bootstrap TUF root.json to seed an online trust root
    /// fetch; required unless --trusted-root is given, since the TUF
    /// client needs a starting point of trust
    #[arg(
        long = "tuf-root",
        env = "SIGSTORE_TUF_ROOT_JSON",
        value_name = "PATH",
        required_unless_present = "trusted_root_path"
    )]
    pub tuf_root_path: Option<PathBuf>,

    /// Require the bundle's Rekor entry to carry an inclusion proof, not
    /// just a signed entry timestamp
    #[arg(long = "require-inclusion-proof")]
    pub require_inclusion_proof: bool,

    /// Accept only a leaf certificate whose SAN matches this literal value
    /// (repeatable; any one match is sufficient)
    #[arg(long = "certificate-identity", value_name = "VALUE")]
    pub certificate_identity: Vec<String>,

    /// Accept only a leaf certificate whose SAN matches this regular
    /// expression (repeatable; any one match is sufficient)
    #[arg(long = "certificate-identity-regexp", value_name = "PATTERN")]
    pub certificate_identity_regexp: Vec<String>,

    /// Accept only a leaf certificate whose Fulcio OIDC issuer matches this
    /// literal value (repeatable; any one match is sufficient)
    #[arg(long = "certificate-oidc-issuer", value_name = "VALUE")]
    pub certificate_oidc_issuer: Vec<String>,

    /// Accept only a leaf certificate whose Fulcio OIDC issuer matches this
    /// regular expression (repeatable; any one match is sufficient)
    #[arg(long = "certificate-oidc-issuer-regexp", value_name = "PATTERN")]
    pub certificate_oidc_issuer_regexp: Vec<String>,
}
