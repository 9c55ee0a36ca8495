use regex::Regex;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};

use crate::error::MatcherError;
use crate::matchers::CertificateMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanField {
    Uri,
    Email,
}

impl std::fmt::Display for SanField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanField::Uri => write!(f, "SAN URI"),
            SanField::Email => write!(f, "SAN email"),
        }
    }
}

/// Matches a literal string or regex against one SAN field of the leaf
/// (URI or RFC 822 email), per spec §4.H's "string matchers".
#[derive(Debug)]
pub enum SanMatcher {
    Literal { field: SanField, value: String },
    Regex { field: SanField, pattern: Regex },
}

impl SanMatcher {
    pub fn literal(field: SanField, value: impl Into<String>) -> Self {
        Self::Literal {
            field,
            value: value.into(),
        }
    }

    pub fn regex(field: SanField, pattern: &str) -> Result<Self, MatcherError> {
        let compiled =
            Regex::new(pattern).map_err(|e| MatcherError::InvalidPattern(e.to_string()))?;
        Ok(Self::Regex {
            field,
            pattern: compiled,
        })
    }

    fn field(&self) -> SanField {
        match self {
            SanMatcher::Literal { field, .. } => *field,
            SanMatcher::Regex { field, .. } => *field,
        }
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            SanMatcher::Literal { value, .. } => value == candidate,
            SanMatcher::Regex { pattern, .. } => pattern.is_match(candidate),
        }
    }
}

impl CertificateMatcher for SanMatcher {
    fn matches(&self, cert: &X509Certificate) -> Result<bool, MatcherError> {
        let names = subject_alternative_names(cert)?;
        let field = self.field();
        for name in names {
            let candidate = match (&name, field) {
                (GeneralName::URI(uri), SanField::Uri) => *uri,
                (GeneralName::RFC822Name(email), SanField::Email) => *email,
                _ => continue,
            };
            if self.is_match(candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn describe(&self) -> String {
        match self {
            SanMatcher::Literal { field, value } => format!("{field} == {value:?}"),
            SanMatcher::Regex { field, pattern } => format!("{field} =~ /{pattern}/"),
        }
    }
}

fn subject_alternative_names<'a>(
    cert: &'a X509Certificate,
) -> Result<Vec<GeneralName<'a>>, MatcherError> {
    let ext = cert
        .subject_alternative_name()
        .map_err(|e| MatcherError::EvaluationFailed(e.to_string()))?;
    let Some(ext) = ext else {
        return Ok(Vec::new());
    };
    match ext.parsed_extension() {
        ParsedExtension::SubjectAlternativeName(san) => Ok(san.general_names.clone()),
        other => Err(MatcherError::EvaluationFailed(format!(
            "unexpected SAN extension shape: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matcher_describe() {
        let matcher = SanMatcher::literal(SanField::Email, "alice@example.com");
        assert!(matcher.describe().contains("alice@example.com"));
    }

    #[test]
    fn test_regex_matcher_rejects_invalid_pattern() {
        let result = SanMatcher::regex(SanField::Uri, "(unterminated");
        assert!(matches!(result, Err(MatcherError::InvalidPattern(_))));
    }

    #[test]
    fn test_is_match_literal() {
        let matcher = SanMatcher::literal(SanField::Uri, "https://example.com/workflow");
        assert!(matcher.is_match("https://example.com/workflow"));
        assert!(!matcher.is_match("https://example.com/other"));
    }

    #[test]
    fn test_is_match_regex() {
        let matcher = SanMatcher::regex(SanField::Email, "^.*@example\\.com$").unwrap();
        assert!(matcher.is_match("bob@example.com"));
        assert!(!matcher.is_match("bob@other.com"));
    }
}
