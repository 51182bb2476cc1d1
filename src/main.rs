use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cert;
mod check;
mod cli;
mod error;
mod evaluate;
mod fetch;
mod hostname;
mod http;
mod print;
mod report;
mod revocation;
mod util;

use crate::check::TrustChecker;
use crate::cli::{CheckArgs, Cli, Command, InspectArgs};
use crate::fetch::FetchOptions;
use crate::http::HttpTransport;
use crate::print::print_report;
use crate::report::TrustReport;
use crate::revocation::checker_for;
use crate::util::{fingerprint_sha256, load_certificates};

/// Entry point wiring CLI, logging, the trust pipeline and output.

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Check(args) => run_check(args, cli.json)?,
        Command::Inspect(args) => run_inspect(args, cli.json)?,
    }

    Ok(())
}

// Logs go to stderr so `--json` output stays machine readable.
fn init_logging(verbose: bool) {
    let default = if verbose { "tls_trust=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_check(args: &CheckArgs, json: bool) -> Result<()> {
    let timeout = Duration::from_secs(args.revocation.timeout);
    let transport = HttpTransport::new(timeout)?;
    let fetch = FetchOptions {
        port: args.port,
        timeout,
        skip_verification: true,
    };
    let checker = TrustChecker::new(fetch, checker_for(args.revocation.mode, transport));

    let report = checker.check_host(&args.host)?;
    emit(&args.host, None, &report, json)
}

// Offline mode: read the leaf (and optionally its issuer) from disk.
fn run_inspect(args: &InspectArgs, json: bool) -> Result<()> {
    let certs = read_certificates(&args.file)?;
    let leaf = certs
        .first()
        .with_context(|| format!("no certificates found in {}", args.file.display()))?;

    // Issuer: explicit file wins, otherwise the second certificate of a bundle.
    let issuer = match &args.issuer {
        Some(path) => read_certificates(path)?.into_iter().next(),
        None => certs.get(1).cloned(),
    };

    let timeout = Duration::from_secs(args.revocation.timeout);
    let transport = HttpTransport::new(timeout)?;
    let fetch = FetchOptions {
        timeout,
        ..FetchOptions::default()
    };
    let checker = TrustChecker::new(fetch, checker_for(args.revocation.mode, transport));

    let report = checker.check_certificate(&args.host, leaf, issuer.as_deref(), Utc::now())?;
    let fingerprint = fingerprint_sha256(leaf)?;
    emit(&args.host, Some(&fingerprint), &report, json)
}

fn read_certificates(path: &Path) -> Result<Vec<Vec<u8>>> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read certificate from {}", path.display()))?;
    load_certificates(&data).with_context(|| format!("failed to parse certificates from {}", path.display()))
}

fn emit(host: &str, fingerprint: Option<&str>, report: &TrustReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    } else {
        print_report(host, fingerprint, report)
    }
}
