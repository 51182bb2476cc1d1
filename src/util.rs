use anyhow::{Context, Result};
use openssl::hash::{hash, MessageDigest};
use openssl::x509::X509;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::prelude::*;

/// Flatten a distinguished name into `(short name, value)` pairs in encoding
/// order. Unregistered attribute types fall back to the dotted OID.
pub fn name_pairs(name: &X509Name<'_>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for attr in name.iter_attributes() {
        let oid = attr.attr_type().to_id_string();
        let key = match short_name(&oid) {
            Some(label) => label.to_string(),
            None => oid2abbrev(attr.attr_type(), oid_registry())
                .map(|s| s.to_string())
                .unwrap_or(oid),
        };
        let value = match attr.as_str() {
            Ok(s) => s.to_string(),
            Err(_) => hex(attr.attr_value().data),
        };
        out.push((key, value));
    }
    out
}

fn short_name(oid: &str) -> Option<&'static str> {
    let label = match oid {
        "2.5.4.3" => "CN",
        "2.5.4.5" => "serialNumber",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "1.2.840.113549.1.9.1" => "E",
        _ => return None,
    };
    Some(label)
}

/// `CN: example.test, O: Example` style rendering.
pub fn join_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// First value stored under `key` (e.g. "CN").
pub fn find_pair<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Read certificates from PEM (one or many) or a single DER blob and
/// return them as DER, in file order.
pub fn load_certificates(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    if let Ok(stack) = X509::stack_from_pem(data) {
        if !stack.is_empty() {
            return stack
                .iter()
                .map(|c| c.to_der().context("failed to re-encode PEM certificate"))
                .collect();
        }
    }
    let cert = X509::from_der(data).context("input is neither PEM nor DER certificate")?;
    Ok(vec![cert.to_der()?])
}

/// Colon-separated SHA-256 fingerprint (uppercase hex).
pub fn fingerprint_sha256(der: &[u8]) -> Result<String> {
    let d = hash(MessageDigest::sha256(), der)?;
    Ok(d.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":"))
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
