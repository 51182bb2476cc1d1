use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use openssl::x509::X509Ref;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::TrustError;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-connection options. `skip_verification` only affects this one
/// handshake; nothing is changed globally.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub port: u16,
    pub timeout: Duration,
    pub skip_verification: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            skip_verification: true,
        }
    }
}

/// Raw certificates captured from a handshake.
#[derive(Debug, Clone)]
pub struct PeerCertificates {
    pub leaf: Vec<u8>,
    /// DER of the chain certificate whose subject is the leaf's issuer, if sent.
    pub issuer: Option<Vec<u8>>,
}

/// Connect to `host`, complete a TLS handshake and return the peer's leaf
/// certificate. The socket is dropped before returning on every path.
pub fn fetch_peer_certificates(host: &str, opts: &FetchOptions) -> Result<PeerCertificates, TrustError> {
    let target = format!("{}:{}", host, opts.port);
    let tcp = connect_tcp(host, opts)?;
    tcp.set_read_timeout(Some(opts.timeout))
        .and_then(|_| tcp.set_write_timeout(Some(opts.timeout)))
        .map_err(|e| TrustError::connection(&target, e))?;

    let mut builder = SslConnector::builder(SslMethod::tls()).map_err(|e| TrustError::connection(&target, e))?;
    if opts.skip_verification {
        builder.set_verify(SslVerifyMode::NONE);
    }
    let connector = builder.build();

    // SNI still goes out for DNS names; openssl skips it for IP literals.
    let config = connector
        .configure()
        .map_err(|e| TrustError::connection(&target, e))?
        .verify_hostname(!opts.skip_verification);
    let mut ssl_stream = config
        .connect(host, tcp)
        .map_err(|e| TrustError::connection(&target, format!("TLS handshake failed: {}", e)))?;
    debug!(%target, version = ssl_stream.ssl().version_str(), "handshake complete");

    let captured = capture(&target, ssl_stream.ssl().peer_certificate().as_deref(), ssl_stream.ssl());

    // Best effort; the socket closes on drop regardless.
    let _ = ssl_stream.shutdown();
    drop(ssl_stream);

    let peer = captured?;
    info!(%target, bytes = peer.leaf.len(), issuer_sent = peer.issuer.is_some(), "captured leaf certificate");
    Ok(peer)
}

// NoCertificate is only reachable with anonymous cipher suites, which the
// default connector never offers; the branch is kept so that case is reported
// distinctly from a connection failure.
fn capture(target: &str, leaf: Option<&X509Ref>, ssl: &openssl::ssl::SslRef) -> Result<PeerCertificates, TrustError> {
    let leaf = leaf.ok_or_else(|| TrustError::NoCertificate { target: target.to_string() })?;
    let leaf_der = leaf
        .to_der()
        .map_err(|e| TrustError::MalformedCertificate(e.to_string()))?;

    let wanted = leaf.issuer_name().to_der().unwrap_or_default();
    let own_subject = leaf.subject_name().to_der().unwrap_or_default();
    let mut issuer = None;
    if let Some(stack) = ssl.peer_cert_chain() {
        for cert in stack {
            let subj = cert.subject_name().to_der().unwrap_or_default();
            if subj != wanted {
                continue;
            }
            // Self-issued leaves show up in their own chain; skip the leaf itself.
            if subj == own_subject && cert.to_der().ok().as_deref() == Some(&leaf_der[..]) {
                continue;
            }
            issuer = cert.to_der().ok();
            break;
        }
    }

    Ok(PeerCertificates { leaf: leaf_der, issuer })
}

fn connect_tcp(host: &str, opts: &FetchOptions) -> Result<TcpStream, TrustError> {
    let target = format!("{}:{}", host, opts.port);
    let addrs: Vec<SocketAddr> = (host, opts.port)
        .to_socket_addrs()
        .map_err(|e| TrustError::connection(&target, format!("DNS resolution failed: {}", e)))?
        .collect();
    if addrs.is_empty() {
        return Err(TrustError::connection(&target, "DNS resolution returned no addresses"));
    }

    let mut last_err = None;
    for addr in &addrs {
        debug!(%target, %addr, "connecting");
        match TcpStream::connect_timeout(addr, opts.timeout) {
            Ok(tcp) => return Ok(tcp),
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    let reason = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no address reachable".to_string());
    Err(TrustError::connection(&target, reason))
}
