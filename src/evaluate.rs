use chrono::{DateTime, Utc};

use crate::cert::CertificateRecord;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Verdicts derived from the certificate alone. No I/O happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustFlags {
    pub valid_now: bool,
    pub days_remaining: i64,
    pub domain_match: bool,
    pub self_signed: bool,
    /// Simplified: any certificate that is not self-signed counts as CA-issued.
    /// This is not chain validation.
    pub ca_valid: bool,
}

pub fn evaluate(record: &CertificateRecord, hostname: &str, now: DateTime<Utc>) -> TrustFlags {
    let valid_now = record.not_before <= now && now <= record.not_after;
    let self_signed = is_self_signed(record);
    TrustFlags {
        valid_now,
        days_remaining: days_remaining(record.not_after, now),
        domain_match: record.subject_cn.as_deref() == Some(hostname),
        self_signed,
        ca_valid: !self_signed,
    }
}

/// Floor of whole days until `not_after`; negative once expired.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (not_after - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

// Any issuer CN attribute equal to the subject CN, byte for byte. A subject
// without a CN never matches.
fn is_self_signed(record: &CertificateRecord) -> bool {
    record.subject_cn.as_deref().is_some_and(|subject| {
        record
            .issuer_attributes
            .iter()
            .any(|(k, v)| k == "CN" && v == subject)
    })
}
