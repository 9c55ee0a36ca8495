//! sigstore-cli: verify a Sigstore bundle against an artifact from the
//! command line.

mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use sigstore_verifier::types::result::VerificationOptions;
use sigstore_verifier::AttestationVerifier;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Verify(args) => run_verify(args).await,
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "sigstore_cli=info,sigstore_verifier=warn",
        1 => "sigstore_cli=debug,sigstore_verifier=info",
        _ => "sigstore_cli=debug,sigstore_verifier=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_verify(args: cli::VerifyArgs) -> Result<()> {
    let artifact_digest = config::resolve_artifact_digest(&args)?;
    let certificate_matchers = config::build_matchers(&args)?;
    let provider = config::build_trusted_root_provider(&args)?;

    let trusted_root = tokio::task::spawn_blocking(move || provider.load())
        .await
        .context("trust root loader task panicked")?
        .context("failed to load trusted root")?;

    let verifier = AttestationVerifier::new(trusted_root);
    let options = VerificationOptions {
        certificate_matchers,
        allow_insecure_sct: false,
        require_inclusion_proof: args.require_inclusion_proof,
    };

    let bundle_path = args.bundle_path.clone();
    let result = tokio::task::spawn_blocking(move || {
        verifier.verify_bundle(&bundle_path, &artifact_digest, &options)
    })
    .await
    .context("verification task panicked")?;

    match result {
        Ok(verification) => {
            println!("verification succeeded");
            println!("  leaf certificate: {}", hex::encode(verification.certificate_hashes.leaf));
            println!("  signing time:     {}", verification.signing_time.to_rfc3339());
            println!("  subject digest:   {}", hex::encode(&verification.subject_digest));
            if let Some(identity) = verification.oidc_identity {
                if let Some(issuer) = identity.issuer {
                    println!("  OIDC issuer:      {issuer}");
                }
                if let Some(subject) = identity.subject {
                    println!("  OIDC subject:     {subject}");
                }
            }
            Ok(())
        }
        Err(e) => {
            anyhow::bail!("verification failed: {e}");
        }
    }
}
