use x509_parser::certificate::X509Certificate;

use crate::error::MatcherError;
use crate::matchers::CertificateMatcher;

/// Conjoins matchers — typically a SAN matcher and an issuer matcher, e.g.
/// "the SAN email is `bob@example.com` AND the issuer is Google" — into
/// a single matcher that requires all of them to match.
#[derive(Debug)]
pub struct AllOf {
    matchers: Vec<Box<dyn CertificateMatcher>>,
}

impl AllOf {
    pub fn of(matchers: Vec<Box<dyn CertificateMatcher>>) -> Self {
        Self { matchers }
    }
}

impl CertificateMatcher for AllOf {
    fn matches(&self, cert: &X509Certificate) -> Result<bool, MatcherError> {
        for matcher in &self.matchers {
            if !matcher.matches(cert)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("all({})", parts.join(", "))
    }
}

/// Disjoins matchers — e.g. "the SAN email is one of these three
/// addresses" — into a single matcher that requires only one of them to
/// match. The top-level [`crate::matchers::any_matches`] already gives this
/// OR semantics across the whole matcher list; `AnyOf` exists so an OR group
/// can be nested inside an `AllOf`, e.g. "(identity is A or B) AND (issuer
/// is Google)".
#[derive(Debug)]
pub struct AnyOf {
    matchers: Vec<Box<dyn CertificateMatcher>>,
}

impl AnyOf {
    pub fn of(matchers: Vec<Box<dyn CertificateMatcher>>) -> Self {
        Self { matchers }
    }
}

impl CertificateMatcher for AnyOf {
    fn matches(&self, cert: &X509Certificate) -> Result<bool, MatcherError> {
        for matcher in &self.matchers {
            if matcher.matches(cert)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("any({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::issuer::IssuerMatcher;
    use crate::matchers::san::{SanField, SanMatcher};

    #[test]
    fn test_all_of_describe_joins_parts() {
        let combinator = AllOf::of(vec![
            Box::new(SanMatcher::literal(SanField::Email, "bob@example.com")),
            Box::new(IssuerMatcher::literal("https://accounts.google.com")),
        ]);
        let desc = combinator.describe();
        assert!(desc.starts_with("all("));
        assert!(desc.contains("bob@example.com"));
        assert!(desc.contains("accounts.google.com"));
    }

    #[test]
    fn test_any_of_describe_joins_parts() {
        let combinator = AnyOf::of(vec![
            Box::new(SanMatcher::literal(SanField::Email, "bob@example.com")),
            Box::new(SanMatcher::literal(SanField::Email, "alice@example.com")),
        ]);
        let desc = combinator.describe();
        assert!(desc.starts_with("any("));
        assert!(desc.contains("bob@example.com"));
        assert!(desc.contains("alice@example.com"));
    }
}
