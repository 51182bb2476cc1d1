use thiserror::Error;

/// Failures that abort a trust check before any report exists.
#[derive(Debug, Error)]
pub enum TrustError {
    /// DNS, TCP, timeout or TLS handshake failure.
    #[error("connection error: {target}: {reason}")]
    Connection { target: String, reason: String },

    /// The handshake completed but the server sent no certificate.
    #[error("no certificate found: {target} completed the handshake without presenting one")]
    NoCertificate { target: String },

    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),
}

impl TrustError {
    pub(crate) fn connection(target: &str, reason: impl ToString) -> Self {
        TrustError::Connection {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Failures inside revocation resolution. These never leave the resolver;
/// each checker maps them to a verdict.
#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("no revocation endpoint in certificate")]
    EndpointNotFound,

    #[error("issuer certificate not available")]
    IssuerUnavailable,

    #[error("fetch from {url} failed: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("could not decode response from {url}: {reason}")]
    ParseFailed { url: String, reason: String },

    #[error("responder {url} reported: {reason}")]
    Responder { url: String, reason: String },

    #[error("certificate has expired")]
    CertificateExpired,
}

impl RevocationError {
    /// True when the failure text says the certificate itself is expired.
    pub fn mentions_expiry(&self) -> bool {
        match self {
            RevocationError::CertificateExpired => true,
            RevocationError::Responder { reason, .. }
            | RevocationError::ParseFailed { reason, .. } => {
                reason.to_ascii_lowercase().contains("expired")
            }
            _ => false,
        }
    }
}
