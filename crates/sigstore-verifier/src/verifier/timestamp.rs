//! Temporal binding (spec §4.G step 7): the leaf certificate must have been
//! valid at the Rekor entry's `integratedTime`. The boundary check itself is
//! unchanged from the teacher; only the surrounding plumbing — pulling the
//! single tlog entry out of the bundle's (non-optional) `tlog_entries` list —
//! needed to follow the current bundle shape.

use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use crate::error::{CertificateError, TimestampError};
use crate::parser::parse_integrated_time;
use crate::types::bundle::TransparencyLogEntry;

pub fn get_integrated_time(entry: &TransparencyLogEntry) -> Result<DateTime<Utc>, TimestampError> {
    parse_integrated_time(&entry.integrated_time)
}

/// Reject unless `not_before <= signing_time <= not_after`; both boundary
/// instants are accepted.
pub fn verify_signing_time_in_validity(
    signing_time: &DateTime<Utc>,
    cert: &X509Certificate,
) -> Result<(), CertificateError> {
    let validity = cert.validity();
    let not_before = validity.not_before.timestamp();
    let not_after = validity.not_after.timestamp();
    let signing_timestamp = signing_time.timestamp();

    if signing_timestamp < not_before || signing_timestamp > not_after {
        return Err(CertificateError::SigningTimeOutsideValidity {
            signing_time: signing_time.to_rfc3339(),
            not_before: validity.not_before.to_string(),
            not_after: validity.not_after.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bundle::LogId;

    #[test]
    fn test_get_integrated_time() {
        let entry = TransparencyLogEntry {
            log_index: Some("123".to_string()),
            log_id: LogId {
                key_id: String::new(),
            },
            kind_version: None,
            integrated_time: "1732068373".to_string(),
            inclusion_promise: None,
            inclusion_proof: None,
            canonicalized_body: String::new(),
        };

        let result = get_integrated_time(&entry);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().timestamp(), 1732068373);
    }
}
