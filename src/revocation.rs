use chrono::{DateTime, Utc};
use openssl::hash::MessageDigest;
use openssl::ocsp::{OcspCertId, OcspCertStatus, OcspRequest, OcspResponse, OcspResponseStatus};
use openssl::x509::X509;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::FromDer;
use x509_parser::revocation_list::CertificateRevocationList;

use crate::cert::{strip_leading_zeros, CertificateRecord};
use crate::error::RevocationError;
use crate::http::Transport;

/// Outcome of a revocation lookup as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RevocationVerdict {
    #[serde(rename = "Not Revoked")]
    NotRevoked,
    Revoked,
    Unknown,
    Expired,
    Error,
}

impl fmt::Display for RevocationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RevocationVerdict::NotRevoked => "Not Revoked",
            RevocationVerdict::Revoked => "Revoked",
            RevocationVerdict::Unknown => "Unknown",
            RevocationVerdict::Expired => "Expired",
            RevocationVerdict::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Which revocation mechanism to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RevocationMode {
    #[default]
    Crl,
    Ocsp,
}

/// Everything a checker may look at for one certificate.
pub struct RevocationSubject<'a> {
    pub record: &'a CertificateRecord,
    pub issuer_der: Option<&'a [u8]>,
    pub now: DateTime<Utc>,
}

/// One revocation strategy. `resolve` does the work and may fail; `classify`
/// turns a failure into this strategy's verdict. Callers use `check`, which
/// never fails.
pub trait RevocationChecker {
    fn name(&self) -> &'static str;

    fn resolve(&self, subject: &RevocationSubject<'_>) -> Result<RevocationVerdict, RevocationError>;

    fn classify(&self, err: &RevocationError) -> RevocationVerdict;

    fn check(&self, subject: &RevocationSubject<'_>) -> RevocationVerdict {
        match self.resolve(subject) {
            Ok(verdict) => {
                info!(checker = self.name(), %verdict, "revocation resolved");
                verdict
            }
            Err(err) => {
                let verdict = self.classify(&err);
                match &err {
                    RevocationError::EndpointNotFound | RevocationError::IssuerUnavailable => {
                        debug!(checker = self.name(), %verdict, "{}", err)
                    }
                    _ => warn!(checker = self.name(), %verdict, "revocation check failed: {}", err),
                }
                verdict
            }
        }
    }
}

pub fn checker_for<'a, T: Transport + 'a>(mode: RevocationMode, transport: T) -> Box<dyn RevocationChecker + 'a> {
    match mode {
        RevocationMode::Crl => Box::new(CrlChecker::new(transport)),
        RevocationMode::Ocsp => Box::new(OcspChecker::new(transport)),
    }
}

/// Looks the serial up in the CRL named by the first distribution point.
/// Every failure degrades to `Unknown`.
pub struct CrlChecker<T> {
    transport: T,
}

impl<T: Transport> CrlChecker<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> RevocationChecker for CrlChecker<T> {
    fn name(&self) -> &'static str {
        "crl"
    }

    fn resolve(&self, subject: &RevocationSubject<'_>) -> Result<RevocationVerdict, RevocationError> {
        let record = subject.record;
        let first = record
            .crl_distribution_points
            .first()
            .ok_or(RevocationError::EndpointNotFound)?;
        let url = normalize_crl_url(first);
        debug!(%url, "fetching CRL");

        let body = self.transport.get(&url).map_err(|e| RevocationError::FetchFailed {
            url: url.clone(),
            reason: format!("{:#}", e),
        })?;
        let revoked = crl_lists_serial(&body, &record.serial)
            .map_err(|reason| RevocationError::ParseFailed { url: url.clone(), reason })?;

        Ok(if revoked {
            RevocationVerdict::Revoked
        } else {
            RevocationVerdict::NotRevoked
        })
    }

    fn classify(&self, _err: &RevocationError) -> RevocationVerdict {
        RevocationVerdict::Unknown
    }
}

/// Distribution points without a scheme are fetched over https.
pub fn normalize_crl_url(uri: &str) -> String {
    if uri.contains("://") {
        uri.to_string()
    } else {
        format!("https://{}", uri)
    }
}

/// Decode a CRL body (DER, or PEM `X509 CRL`) and report whether `serial`
/// is on its revoked list.
pub fn crl_lists_serial(body: &[u8], serial: &[u8]) -> Result<bool, String> {
    let pem_der;
    let text = trim_pem_prefix(body);
    let der: &[u8] = if text.starts_with(b"-----BEGIN") {
        let (_, pem) = parse_x509_pem(text).map_err(|e| format!("invalid PEM: {}", e))?;
        if pem.label != "X509 CRL" {
            return Err(format!("expected X509 CRL, got {}", pem.label));
        }
        pem_der = pem.contents;
        &pem_der
    } else {
        body
    };

    let (_, crl) = CertificateRevocationList::from_der(der).map_err(|e| format!("invalid CRL: {}", e))?;
    let wanted = strip_leading_zeros(serial);
    let found = crl
        .iter_revoked_certificates()
        .any(|revoked| strip_leading_zeros(revoked.raw_serial()) == wanted);
    debug!(entries = crl.iter_revoked_certificates().count(), found, "scanned CRL");
    Ok(found)
}

// Skips a UTF-8 BOM and leading ASCII whitespace so PEM bodies are recognized.
fn trim_pem_prefix(body: &[u8]) -> &[u8] {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let start = body.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(body.len());
    &body[start..]
}

/// Asks the first AIA OCSP responder about the certificate. Needs the issuer
/// certificate to build the request.
pub struct OcspChecker<T> {
    transport: T,
}

impl<T: Transport> OcspChecker<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport> RevocationChecker for OcspChecker<T> {
    fn name(&self) -> &'static str {
        "ocsp"
    }

    fn resolve(&self, subject: &RevocationSubject<'_>) -> Result<RevocationVerdict, RevocationError> {
        let record = subject.record;
        let url = record
            .ocsp_responders
            .first()
            .ok_or(RevocationError::EndpointNotFound)?
            .clone();
        // Responders drop expired certificates; report that rather than asking.
        if subject.now > record.not_after {
            return Err(RevocationError::CertificateExpired);
        }
        let issuer_der = subject.issuer_der.ok_or(RevocationError::IssuerUnavailable)?;

        let local = |reason: openssl::error::ErrorStack| RevocationError::ParseFailed {
            url: url.clone(),
            reason: format!("building request: {}", reason),
        };
        let cert = X509::from_der(&record.raw_der).map_err(local)?;
        let issuer = X509::from_der(issuer_der).map_err(local)?;

        let mut request = OcspRequest::new().map_err(local)?;
        request
            .add_id(OcspCertId::from_cert(MessageDigest::sha1(), &cert, &issuer).map_err(local)?)
            .map_err(local)?;
        let request_der = request.to_der().map_err(local)?;
        debug!(%url, bytes = request_der.len(), "querying OCSP responder");

        let body = self
            .transport
            .post(&url, "application/ocsp-request", &request_der)
            .map_err(|e| RevocationError::FetchFailed {
                url: url.clone(),
                reason: format!("{:#}", e),
            })?;

        let parse_err = |reason: openssl::error::ErrorStack| RevocationError::ParseFailed {
            url: url.clone(),
            reason: reason.to_string(),
        };
        let response = OcspResponse::from_der(&body).map_err(parse_err)?;
        if response.status() != OcspResponseStatus::SUCCESSFUL {
            return Err(RevocationError::Responder {
                url: url.clone(),
                reason: responder_status_text(response.status()).to_string(),
            });
        }
        let basic = response.basic().map_err(parse_err)?;
        let id = OcspCertId::from_cert(MessageDigest::sha1(), &cert, &issuer).map_err(local)?;
        let status = basic.find_status(&id).ok_or_else(|| RevocationError::Responder {
            url: url.clone(),
            reason: "no status for this certificate in response".to_string(),
        })?;

        Ok(verdict_for_status(status.status))
    }

    fn classify(&self, err: &RevocationError) -> RevocationVerdict {
        if err.mentions_expiry() {
            return RevocationVerdict::Expired;
        }
        match err {
            RevocationError::EndpointNotFound | RevocationError::IssuerUnavailable => RevocationVerdict::Unknown,
            _ => RevocationVerdict::Error,
        }
    }
}

/// `good` is the only status that clears a certificate.
pub fn verdict_for_status(status: OcspCertStatus) -> RevocationVerdict {
    if status == OcspCertStatus::GOOD {
        RevocationVerdict::NotRevoked
    } else {
        RevocationVerdict::Revoked
    }
}

fn responder_status_text(status: OcspResponseStatus) -> &'static str {
    match status {
        OcspResponseStatus::MALFORMED_REQUEST => "malformed request",
        OcspResponseStatus::INTERNAL_ERROR => "internal error",
        OcspResponseStatus::TRY_LATER => "try later",
        OcspResponseStatus::SIG_REQUIRED => "signature required",
        OcspResponseStatus::UNAUTHORIZED => "unauthorized",
        _ => "unrecognized response status",
    }
}
