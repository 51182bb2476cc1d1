use chrono::{DateTime, TimeZone, Utc};
use x509_parser::extensions::DistributionPointName;
use x509_parser::prelude::*;

use crate::error::TrustError;
use crate::util::{find_pair, name_pairs};

pub const OID_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";

/// id-ad-ocsp access method inside Authority Information Access.
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

/// A single certificate extension as it appeared in the encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    pub oid: String,
    pub critical: bool,
    pub value: Vec<u8>,
}

/// Trust-relevant fields decoded from one leaf certificate.
#[derive(Debug, Clone)]
pub struct CertificateRecord {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub subject_cn: Option<String>,
    pub issuer_cn: Option<String>,
    pub subject_attributes: Vec<(String, String)>,
    pub issuer_attributes: Vec<(String, String)>,
    /// Big-endian serial as encoded, leading zero padding removed.
    pub serial: Vec<u8>,
    pub raw_der: Vec<u8>,
    pub extensions: Vec<ExtensionRecord>,
    pub crl_distribution_points: Vec<String>,
    pub ocsp_responders: Vec<String>,
}

impl CertificateRecord {
    pub fn extension(&self, oid: &str) -> Option<&ExtensionRecord> {
        self.extensions.iter().find(|e| e.oid == oid)
    }

    pub fn serial_hex(&self) -> String {
        crate::util::hex(&self.serial)
    }
}

/// Decode a DER certificate. Trailing bytes after the certificate are
/// rejected.
pub fn parse_certificate(der: &[u8]) -> Result<CertificateRecord, TrustError> {
    let (rest, cert) =
        X509Certificate::from_der(der).map_err(|e| TrustError::MalformedCertificate(e.to_string()))?;
    if !rest.is_empty() {
        return Err(TrustError::MalformedCertificate(format!(
            "{} trailing byte(s) after certificate",
            rest.len()
        )));
    }

    let validity = cert.validity();
    let not_before = to_utc(validity.not_before.timestamp())?;
    let not_after = to_utc(validity.not_after.timestamp())?;

    let subject_attributes = name_pairs(cert.subject());
    let issuer_attributes = name_pairs(cert.issuer());
    let subject_cn = find_pair(&subject_attributes, "CN").map(str::to_string);
    let issuer_cn = find_pair(&issuer_attributes, "CN").map(str::to_string);

    let mut extensions = Vec::new();
    let mut crl_distribution_points = Vec::new();
    let mut ocsp_responders = Vec::new();
    for ext in cert.extensions() {
        extensions.push(ExtensionRecord {
            oid: ext.oid.to_id_string(),
            critical: ext.critical,
            value: ext.value.to_vec(),
        });
        match ext.parsed_extension() {
            ParsedExtension::CRLDistributionPoints(points) => {
                crl_distribution_points.extend(crl_uris(points));
            }
            ParsedExtension::AuthorityInfoAccess(aia) => {
                for ad in &aia.accessdescs {
                    if ad.access_method.to_id_string() == OID_AD_OCSP {
                        if let GeneralName::URI(uri) = &ad.access_location {
                            ocsp_responders.push(uri.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(CertificateRecord {
        not_before,
        not_after,
        subject_cn,
        issuer_cn,
        subject_attributes,
        issuer_attributes,
        serial: strip_leading_zeros(cert.raw_serial()).to_vec(),
        raw_der: der.to_vec(),
        extensions,
        crl_distribution_points,
        ocsp_responders,
    })
}

fn crl_uris(points: &CRLDistributionPoints<'_>) -> Vec<String> {
    let mut uris = Vec::new();
    for point in &points.points {
        if let Some(DistributionPointName::FullName(names)) = &point.distribution_point {
            for name in names {
                if let GeneralName::URI(uri) = name {
                    uris.push(uri.to_string());
                }
            }
        }
    }
    uris
}

fn to_utc(ts: i64) -> Result<DateTime<Utc>, TrustError> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| TrustError::MalformedCertificate(format!("validity timestamp {} out of range", ts)))
}

/// Serial comparison is on integer value, so `00 12 34` and `12 34` match.
pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
