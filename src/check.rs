use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cert::{parse_certificate, OID_CRL_DISTRIBUTION_POINTS};
use crate::error::TrustError;
use crate::evaluate::evaluate;
use crate::fetch::{fetch_peer_certificates, FetchOptions};
use crate::report::TrustReport;
use crate::revocation::{RevocationChecker, RevocationSubject};

/// Runs fetch, parse, evaluation and revocation for one hostname.
/// Holds no state between checks.
pub struct TrustChecker<'a> {
    fetch: FetchOptions,
    revocation: Box<dyn RevocationChecker + 'a>,
}

impl<'a> TrustChecker<'a> {
    pub fn new(fetch: FetchOptions, revocation: Box<dyn RevocationChecker + 'a>) -> Self {
        Self { fetch, revocation }
    }

    /// Live check: the leaf comes from a handshake with `host`.
    pub fn check_host(&self, host: &str) -> Result<TrustReport, TrustError> {
        let peer = fetch_peer_certificates(host, &self.fetch)?;
        self.check_certificate(host, &peer.leaf, peer.issuer.as_deref(), Utc::now())
    }

    /// Offline check of an already captured certificate. Revocation outcomes
    /// never turn into an error here.
    pub fn check_certificate(
        &self,
        hostname: &str,
        der: &[u8],
        issuer_der: Option<&[u8]>,
        now: DateTime<Utc>,
    ) -> Result<TrustReport, TrustError> {
        let record = parse_certificate(der)?;
        debug!(
            subject = record.subject_cn.as_deref().unwrap_or("<none>"),
            serial = %record.serial_hex(),
            crl_points = record.crl_distribution_points.len(),
            ocsp_responders = record.ocsp_responders.len(),
            "parsed certificate"
        );
        if let Some(ext) = record.extension(OID_CRL_DISTRIBUTION_POINTS) {
            debug!(oid = %ext.oid, critical = ext.critical, bytes = ext.value.len(), "CRL distribution points extension");
        }

        let flags = evaluate(&record, hostname, now);
        let revoked = self.revocation.check(&RevocationSubject {
            record: &record,
            issuer_der,
            now,
        });

        Ok(TrustReport::assemble(&record, flags, revoked))
    }
}
