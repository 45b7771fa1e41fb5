//! `relist check` — pre-flight diagnostics.
//!
//! Runs every probe even after a failure so one pass shows the whole
//! picture, then exits with the first failure's code.

use std::path::Path;

use relist_io::read_ledger;

use crate::bridge::BridgeClient;
use crate::config::Settings;
use crate::CliError;

pub fn cmd_check(settings: &Settings, ledger: &Path) -> Result<(), CliError> {
    let mut first_failure: Option<CliError> = None;

    eprintln!("bridge_url: {}", settings.bridge_url);
    eprintln!("profile:    {}", if settings.profile.is_empty() { "(unset)" } else { &settings.profile });
    eprintln!("ledger:     {}", ledger.display());
    eprintln!();

    let client = BridgeClient::new(&settings.bridge_url);
    match client.health() {
        Ok(()) => eprintln!("ok: bridge reachable"),
        Err(e) => {
            eprintln!("failed: {}", e.message);
            first_failure.get_or_insert(e);
        }
    }

    if settings.profile.is_empty() {
        eprintln!("note: no profile configured; `relist run` will need --profile");
    } else {
        match client.fetch_listings(&settings.profile) {
            Ok(payload) => eprintln!(
                "ok: profile {} scanned ({} listing(s), scan {})",
                settings.profile,
                payload.listings.len(),
                if payload.scan_complete { "complete" } else { "incomplete" },
            ),
            Err(e) => {
                eprintln!("failed: {}", e.message);
                first_failure.get_or_insert(e);
            }
        }
    }

    match read_ledger(ledger) {
        Ok(read) => eprintln!(
            "ok: ledger readable ({} row(s), {} skipped)",
            read.rows.len(),
            read.skipped.len(),
        ),
        Err(e) => {
            eprintln!("failed: {}", e);
            first_failure.get_or_insert(CliError::ledger(e));
        }
    }

    match first_failure {
        None => {
            eprintln!();
            eprintln!("all checks passed");
            Ok(())
        }
        Some(mut err) => {
            // Details already printed per check.
            err.message = String::new();
            Err(err)
        }
    }
}
