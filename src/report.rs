use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::cert::CertificateRecord;
use crate::evaluate::TrustFlags;
use crate::revocation::RevocationVerdict;
use crate::util::join_pairs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    #[serde(serialize_with = "valid_invalid")]
    pub valid: bool,
    #[serde(serialize_with = "iso8601")]
    pub valid_from: DateTime<Utc>,
    #[serde(serialize_with = "iso8601")]
    pub valid_to: DateTime<Utc>,
}

/// Final result of one trust check. Field labels follow the wire format:
/// `Valid`/`Invalid`, `Yes`/`No`, and the revocation verdict label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustReport {
    pub validity: Validity,
    pub issuer: String,
    pub subject: String,
    #[serde(serialize_with = "yes_no")]
    pub valid_for_domain: bool,
    #[serde(serialize_with = "valid_invalid")]
    pub ca_valid: bool,
    #[serde(serialize_with = "yes_no")]
    pub self_signed: bool,
    pub revoked: RevocationVerdict,
    pub days_remaining: i64,
}

impl TrustReport {
    /// Only a parsed record can become a report.
    pub fn assemble(record: &CertificateRecord, flags: TrustFlags, revoked: RevocationVerdict) -> Self {
        TrustReport {
            validity: Validity {
                valid: flags.valid_now,
                valid_from: record.not_before,
                valid_to: record.not_after,
            },
            issuer: join_pairs(&record.issuer_attributes),
            subject: join_pairs(&record.subject_attributes),
            valid_for_domain: flags.domain_match,
            ca_valid: flags.ca_valid,
            self_signed: flags.self_signed,
            revoked,
            days_remaining: flags.days_remaining,
        }
    }
}

pub fn yes_no_label(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

pub fn valid_label(flag: bool) -> &'static str {
    if flag { "Valid" } else { "Invalid" }
}

/// `2020-01-01T00:00:00.000Z`
pub fn iso8601_string(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn yes_no<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(yes_no_label(*flag))
}

fn valid_invalid<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(valid_label(*flag))
}

fn iso8601<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso8601_string(t))
}
