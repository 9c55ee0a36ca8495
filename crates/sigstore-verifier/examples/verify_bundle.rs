//! Verify a Sigstore bundle against the public-good trust root, fetched
//! live over TUF. Requires the `fetcher` feature.

use std::env;
use std::path::PathBuf;

use sigstore_verifier::trust::{PublicGoodTrustedRootProvider, TrustedRootProvider};
use sigstore_verifier::types::result::VerificationOptions;
use sigstore_verifier::AttestationVerifier;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        eprintln!(
            "Usage: {} <bundle.json> <artifact> <embedded-tuf-root.json>",
            args[0]
        );
        std::process::exit(1);
    }

    let bundle_path = PathBuf::from(&args[1]);
    let artifact_path = PathBuf::from(&args[2]);
    let embedded_root_path = PathBuf::from(&args[3]);

    let artifact_bytes = match std::fs::read(&artifact_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: failed to read artifact: {e}");
            std::process::exit(1);
        }
    };
    let artifact_digest = sigstore_verifier::crypto::hash::sha256(&artifact_bytes);

    let embedded_root_json = match std::fs::read(&embedded_root_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: failed to read embedded TUF root: {e}");
            std::process::exit(1);
        }
    };

    let cache_dir = std::env::temp_dir().join("sigstore-verifier-example-cache");
    let provider = PublicGoodTrustedRootProvider::new(cache_dir, &embedded_root_json);

    let trusted_root = match provider.load() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: failed to load trusted root: {e}");
            std::process::exit(1);
        }
    };

    let verifier = AttestationVerifier::new(trusted_root);
    let options = VerificationOptions::default();

    match verifier.verify_bundle(&bundle_path, &artifact_digest, &options) {
        Ok(result) => {
            println!("verification succeeded\n");

            println!("certificate chain hashes:");
            println!("  leaf:   {}", hex::encode(result.certificate_hashes.leaf));
            for (i, hash) in result.certificate_hashes.intermediates.iter().enumerate() {
                println!("  int[{i}]: {}", hex::encode(hash));
            }
            println!("  root:   {}", hex::encode(result.certificate_hashes.root));
            println!();

            println!("signing time: {}", result.signing_time.to_rfc3339());
            println!("subject digest: {}", hex::encode(&result.subject_digest));

            if let Some(identity) = result.oidc_identity {
                println!("\noidc identity:");
                if let Some(issuer) = identity.issuer {
                    println!("  issuer: {issuer}");
                }
                if let Some(subject) = identity.subject {
                    println!("  subject: {subject}");
                }
            }
        }
        Err(e) => {
            eprintln!("verification failed: {e}");
            std::process::exit(1);
        }
    }
}
