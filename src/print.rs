use anyhow::Result;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::report::{iso8601_string, valid_label, yes_no_label, TrustReport};
use crate::revocation::RevocationVerdict;

pub fn print_bold(stdout: &mut StandardStream, s: &str) -> Result<()> {
    stdout.set_color(ColorSpec::new().set_bold(true))?;
    write!(stdout, "{}", s)?;
    stdout.reset()?;
    Ok(())
}

fn print_field(stdout: &mut StandardStream, label: &str, value: &str, good: Option<bool>) -> Result<()> {
    write!(stdout, "  ")?;
    print_bold(stdout, &format!("{}:", label))?;
    write!(stdout, " ")?;
    match good {
        Some(true) => stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?,
        Some(false) => stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?,
        None => stdout.set_color(ColorSpec::new().set_fg(Some(Color::Blue)))?,
    }
    write!(stdout, "{}", value)?;
    stdout.reset()?;
    writeln!(stdout)?;
    Ok(())
}

// Human view of a report: one line per field, verdicts colored green/red.
pub fn print_report(host: &str, fingerprint: Option<&str>, report: &TrustReport) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    writeln!(&mut stdout, "--- Certificate trust report for {} ---", host)?;

    let v = &report.validity;
    print_field(&mut stdout, "Validity", valid_label(v.valid), Some(v.valid))?;
    print_field(&mut stdout, "Valid from", &iso8601_string(&v.valid_from), None)?;
    print_field(&mut stdout, "Valid to", &iso8601_string(&v.valid_to), None)?;
    print_field(
        &mut stdout,
        "Days remaining",
        &report.days_remaining.to_string(),
        Some(report.days_remaining >= 0),
    )?;
    print_field(&mut stdout, "Subject", &report.subject, None)?;
    print_field(&mut stdout, "Issuer", &report.issuer, None)?;
    print_field(
        &mut stdout,
        "Valid for domain",
        yes_no_label(report.valid_for_domain),
        Some(report.valid_for_domain),
    )?;
    print_field(&mut stdout, "CA valid", valid_label(report.ca_valid), Some(report.ca_valid))?;
    print_field(&mut stdout, "Self-signed", yes_no_label(report.self_signed), Some(!report.self_signed))?;
    let revoked_ok = match report.revoked {
        RevocationVerdict::NotRevoked => Some(true),
        RevocationVerdict::Revoked | RevocationVerdict::Expired => Some(false),
        RevocationVerdict::Unknown | RevocationVerdict::Error => None,
    };
    print_field(&mut stdout, "Revocation", &report.revoked.to_string(), revoked_ok)?;
    if let Some(fp) = fingerprint {
        print_field(&mut stdout, "SHA-256 Fingerprint", fp, None)?;
    }
    Ok(())
}
