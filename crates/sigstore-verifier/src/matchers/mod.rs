//! Component H: certificate identity matchers.
//!
//! A matcher is a predicate over the leaf certificate with a `describe()`
//! for diagnostics. Evaluation failures (a malformed extension, an
//! unparseable SAN) are distinguished from a clean "did not match" via
//! [`crate::error::MatcherError`] rather than folding both into `false`.

pub mod combinator;
pub mod issuer;
pub mod san;

pub use combinator::{AllOf, AnyOf};
pub use issuer::IssuerMatcher;
pub use san::{SanField, SanMatcher};

use x509_parser::certificate::X509Certificate;

use crate::error::MatcherError;

/// `1.3.6.1.4.1.57264.1.1` — the OIDC issuer URL Fulcio stamps into the
/// leaf certificate's extensions.
pub const OID_FULCIO_ISSUER: &[u64] = &[1, 3, 6, 1, 4, 1, 57264, 1, 1];
/// `1.3.6.1.4.1.57264.1.8` — the newer, v2 issuer extension OID.
pub const OID_FULCIO_ISSUER_V2: &[u64] = &[1, 3, 6, 1, 4, 1, 57264, 1, 8];

pub trait CertificateMatcher: std::fmt::Debug {
    /// Evaluate this matcher against the leaf certificate.
    fn matches(&self, cert: &X509Certificate) -> Result<bool, MatcherError>;

    fn describe(&self) -> String;
}

/// Apply a matcher list per spec §4.G step 4: success iff the list is empty
/// or at least one matcher matches. A raised [`MatcherError`] is fatal and
/// propagates rather than being treated as "no match".
pub fn any_matches(
    matchers: &[Box<dyn CertificateMatcher>],
    cert: &X509Certificate,
) -> Result<bool, MatcherError> {
    if matchers.is_empty() {
        return Ok(true);
    }
    for matcher in matchers {
        if matcher.matches(cert)? {
            return Ok(true);
        }
    }
    Ok(false)
}
