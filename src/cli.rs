use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::hostname::parse_hostname;
use crate::revocation::RevocationMode;

/// Top-level CLI with subcommands.
#[derive(Parser, Debug)]
#[command(name = "tls-trust", version, about = "Certificate trust and revocation checker")]
pub struct Cli {
    /// Emit debug logs (RUST_LOG overrides)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a live server and report on its leaf certificate
    Check(CheckArgs),
    /// Report on a certificate file (PEM or DER) without connecting
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct RevocationArgs {
    /// Revocation mechanism to consult
    #[arg(long = "revocation", value_enum, default_value_t = RevocationMode::Crl, env = "TLS_TRUST_REVOCATION")]
    pub mode: RevocationMode,

    /// Timeout in seconds for each network operation
    #[arg(long = "timeout", default_value_t = 10, env = "TLS_TRUST_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Domain name or IP of the server to connect to
    #[arg(value_parser = parse_hostname)]
    pub host: String,

    /// Port of the server (default: 443)
    #[arg(short = 'p', long = "port", default_value_t = 443, env = "TLS_TRUST_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    #[command(flatten)]
    pub revocation: RevocationArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Certificate file; with a PEM bundle the first certificate is the leaf
    #[arg(short = 'f', long = "file", required = true)]
    pub file: PathBuf,

    /// Hostname to match against the subject common name
    #[arg(long = "host", required = true, value_parser = parse_hostname)]
    pub host: String,

    /// Issuer certificate (PEM or DER), needed for OCSP
    #[arg(short = 'i', long = "issuer")]
    pub issuer: Option<PathBuf>,

    #[command(flatten)]
    pub revocation: RevocationArgs,
}
