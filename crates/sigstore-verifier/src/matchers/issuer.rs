use asn1_rs::{FromDer, Ia5String, Utf8String};
use regex::Regex;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::X509Extension;

use crate::error::MatcherError;
use crate::matchers::{CertificateMatcher, OID_FULCIO_ISSUER, OID_FULCIO_ISSUER_V2};

/// Matches the Fulcio OIDC-issuer extension (`1.3.6.1.4.1.57264.1.1`, or the
/// v2 form `1.3.6.1.4.1.57264.1.8`) against a literal or regex.
#[derive(Debug)]
pub enum IssuerMatcher {
    Literal(String),
    Regex(Regex),
}

impl IssuerMatcher {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| MatcherError::InvalidPattern(e.to_string()))
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            IssuerMatcher::Literal(value) => value == candidate,
            IssuerMatcher::Regex(pattern) => pattern.is_match(candidate),
        }
    }
}

impl CertificateMatcher for IssuerMatcher {
    fn matches(&self, cert: &X509Certificate) -> Result<bool, MatcherError> {
        let issuer = extract_issuer_extension(cert)?;
        match issuer {
            Some(value) => Ok(self.is_match(&value)),
            None => Ok(false),
        }
    }

    fn describe(&self) -> String {
        match self {
            IssuerMatcher::Literal(value) => format!("issuer == {value:?}"),
            IssuerMatcher::Regex(pattern) => format!("issuer =~ /{pattern}/"),
        }
    }
}

fn oid_is_issuer(ext: &X509Extension) -> bool {
    match ext.oid.iter() {
        Some(arcs) => {
            let arcs: Vec<u64> = arcs.collect();
            arcs == OID_FULCIO_ISSUER || arcs == OID_FULCIO_ISSUER_V2
        }
        None => false,
    }
}

/// Extracts the string value of the Fulcio issuer extension. Fulcio has
/// emitted this as both a bare IA5String and a UTF8String across certificate
/// versions; try both since the DER tag alone disambiguates which was used.
fn extract_issuer_extension(cert: &X509Certificate) -> Result<Option<String>, MatcherError> {
    let Some(ext) = cert.extensions().iter().find(|ext| oid_is_issuer(ext)) else {
        return Ok(None);
    };

    if let Ok((_, s)) = Ia5String::from_der(ext.value) {
        return Ok(Some(s.to_string()));
    }
    if let Ok((_, s)) = Utf8String::from_der(ext.value) {
        return Ok(Some(s.to_string()));
    }

    Err(MatcherError::EvaluationFailed(
        "issuer extension is neither an IA5String nor a UTF8String".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issuer_matcher_literal_match() {
        let matcher = IssuerMatcher::literal("https://accounts.google.com");
        assert!(matcher.is_match("https://accounts.google.com"));
        assert!(!matcher.is_match("https://github.com/login/oauth"));
    }

    #[test]
    fn test_issuer_matcher_rejects_invalid_regex() {
        let result = IssuerMatcher::regex("(unterminated");
        assert!(matches!(result, Err(MatcherError::InvalidPattern(_))));
    }
}
