use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostnameError {
    #[error("Domain cannot be empty")]
    Empty,
    #[error("Domain must be a valid hostname")]
    Invalid,
}

/// Accepts IP literals and RFC 1123 DNS names (a single trailing dot is allowed).
pub fn validate_hostname(input: &str) -> Result<(), HostnameError> {
    if input.is_empty() {
        return Err(HostnameError::Empty);
    }
    if input.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    let name = input.strip_suffix('.').unwrap_or(input);
    if name.is_empty() || name.len() > 253 {
        return Err(HostnameError::Invalid);
    }
    for label in name.split('.') {
        let ok = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !ok {
            return Err(HostnameError::Invalid);
        }
    }
    Ok(())
}

/// clap value parser wrapper.
pub fn parse_hostname(input: &str) -> Result<String, HostnameError> {
    validate_hostname(input)?;
    Ok(input.to_string())
}
