//! Translates parsed CLI arguments into the verifier's own types: a
//! [`TrustedRootProvider`], a digest to verify against, and a matcher list.

use anyhow::{bail, Context, Result};
use sigstore_verifier::matchers::{AllOf, AnyOf, CertificateMatcher, IssuerMatcher, SanField, SanMatcher};
use sigstore_verifier::trust::{
    FileTrustedRootProvider, PublicGoodTrustedRootProvider, StagingTrustedRootProvider,
    TrustedRootProvider,
};

use crate::cli::VerifyArgs;

/// `--trusted-root` reads a complete trust root straight off disk, offline.
/// Without it, the TUF client needs a bootstrap `root.json` to start its
/// own update from (`--tuf-root`, required in that case — see
/// [`crate::cli::VerifyArgs::tuf_root_path`]).
pub fn build_trusted_root_provider(args: &VerifyArgs) -> Result<Box<dyn TrustedRootProvider>> {
    if let Some(path) = &args.trusted_root_path {
        return Ok(Box::new(FileTrustedRootProvider::new(path.clone())));
    }

    let tuf_root_path = args
        .tuf_root_path
        .as_ref()
        .expect("clap enforces --tuf-root when --trusted-root is absent");
    let bootstrap_root = std::fs::read(tuf_root_path)
        .with_context(|| format!("failed to read bootstrap TUF root at {}", tuf_root_path.display()))?;

    if args.staging {
        Ok(Box::new(StagingTrustedRootProvider::new(
            args.tuf_cache_dir.clone(),
            &bootstrap_root,
        )))
    } else {
        Ok(Box::new(PublicGoodTrustedRootProvider::new(
            args.tuf_cache_dir.clone(),
            &bootstrap_root,
        )))
    }
}

/// SHA-256 digest of the artifact to verify, either read from `--artifact`
/// and hashed, or taken directly from `--digest`.
pub fn resolve_artifact_digest(args: &VerifyArgs) -> Result<Vec<u8>> {
    if let Some(hex_digest) = &args.digest {
        return sigstore_verifier::crypto::hash::hex_decode(hex_digest)
            .context("--digest is not valid hex");
    }

    let Some(artifact_path) = &args.artifact_path else {
        bail!("one of --artifact or --digest is required");
    };

    let bytes = std::fs::read(artifact_path)
        .with_context(|| format!("failed to read artifact at {}", artifact_path.display()))?;
    Ok(sigstore_verifier::crypto::hash::sha256(&bytes).to_vec())
}

/// Builds the identity matcher list per spec §4.H: literal/regex SAN
/// matchers OR'd together, literal/regex issuer matchers OR'd together, and
/// (when both are present) the two groups AND'd via [`AllOf`].
pub fn build_matchers(args: &VerifyArgs) -> Result<Vec<Box<dyn CertificateMatcher>>> {
    let mut identity_matchers: Vec<Box<dyn CertificateMatcher>> = Vec::new();
    for value in &args.certificate_identity {
        identity_matchers.push(Box::new(SanMatcher::literal(SanField::Uri, value.clone())));
    }
    for pattern in &args.certificate_identity_regexp {
        identity_matchers.push(Box::new(
            SanMatcher::regex(SanField::Uri, pattern)
                .with_context(|| format!("invalid --certificate-identity-regexp: {pattern}"))?,
        ));
    }

    let mut issuer_matchers: Vec<Box<dyn CertificateMatcher>> = Vec::new();
    for value in &args.certificate_oidc_issuer {
        issuer_matchers.push(Box::new(IssuerMatcher::literal(value.clone())));
    }
    for pattern in &args.certificate_oidc_issuer_regexp {
        issuer_matchers.push(Box::new(IssuerMatcher::regex(pattern).with_context(|| {
            format!("invalid --certificate-oidc-issuer-regexp: {pattern}")
        })?));
    }

    match (identity_matchers.is_empty(), issuer_matchers.is_empty()) {
        (true, true) => Ok(Vec::new()),
        (false, true) => Ok(identity_matchers),
        (true, false) => Ok(issuer_matchers),
        (false, false) => Ok(vec![Box::new(AllOf::of(vec![
            Box::new(AnyOf::of(identity_matchers)),
            Box::new(AnyOf::of(issuer_matchers)),
        ]))]),
    }
}
