//! Marketplace bridge connector.
//!
//! The bridge is a local HTTP service that owns the authenticated
//! marketplace session. This module speaks to it two ways:
//!
//! - **Observation** (`fetch_listings`): run-fatal on failure, retried
//!   with backoff inside this module, surfaced as a [`CliError`] with a
//!   bridge exit code. Without an observation there is nothing to
//!   reconcile.
//! - **Mutation** (`set_price` via [`PriceMutator`]): one attempt per
//!   call, classified transient/permanent. The executor owns the retry
//!   policy so failures stay isolated per item.

use std::thread;
use std::time::Duration;

use serde::Deserialize;

use relist_engine::error::MutationError;
use relist_engine::execute::PriceMutator;
use relist_engine::model::RawListing;
use relist_engine::money::format_minor;

use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

const MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("relist/", env!("CARGO_PKG_VERSION"));

// ── Wire types ──────────────────────────────────────────────────────

/// One scan of the profile's listings as the bridge saw them.
///
/// `scan_complete` defaults to false when the bridge omits it: an
/// observation of unknown completeness must not drive removals.
#[derive(Debug, Deserialize)]
pub struct ObservationPayload {
    #[serde(default)]
    pub scan_complete: bool,
    #[serde(default)]
    pub listings: Vec<RawListing>,
}

// ── BridgeClient ────────────────────────────────────────────────────

pub struct BridgeClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Single unretried probe, used by `relist check`.
    pub fn health(&self) -> Result<(), CliError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.http.get(&url).send().map_err(|e| CliError {
            code: exit_codes::EXIT_BRIDGE_UPSTREAM,
            message: format!("bridge unreachable at {}: {}", self.base_url, e),
            hint: Some("is the bridge running? check bridge_url in relist.toml".to_string()),
        })?;

        let status = resp.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            Err(self.status_error("health check", status, &body_message(resp)))
        }
    }

    /// Fetch the current listing scan, with retry and exponential
    /// backoff on 429/5xx/network failures. 429 honors Retry-After.
    pub fn fetch_listings(&self, profile: &str) -> Result<ObservationPayload, CliError> {
        let url = format!("{}/profiles/{}/listings", self.base_url, profile);
        let mut backoff_secs = 1u64;

        for attempt in 0..=MAX_RETRIES {
            let result = self.http.get(&url).send();

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // Auth and validation errors: fail immediately
                    if status == 401 || status == 403 {
                        return Err(CliError {
                            code: exit_codes::EXIT_BRIDGE_AUTH,
                            message: format!(
                                "bridge auth failed ({}): {}",
                                status,
                                body_message(resp),
                            ),
                            hint: Some("log in to the marketplace in the bridge again".to_string()),
                        });
                    }
                    if status >= 400 && status < 500 && status != 429 {
                        return Err(self.status_error("listing fetch", status, &body_message(resp)));
                    }

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            let code = if status == 429 {
                                exit_codes::EXIT_BRIDGE_RATE_LIMIT
                            } else {
                                exit_codes::EXIT_BRIDGE_UPSTREAM
                            };
                            return Err(CliError {
                                code,
                                message: format!(
                                    "bridge {} after {} attempts (HTTP {})",
                                    if status == 429 { "rate limited" } else { "error" },
                                    MAX_RETRIES,
                                    status,
                                ),
                                hint: None,
                            });
                        }

                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .unwrap_or(backoff_secs)
                        } else {
                            backoff_secs
                        };

                        eprintln!(
                            "warning: retry {}/{} in {}s (HTTP {})",
                            attempt + 1,
                            MAX_RETRIES,
                            wait,
                            status,
                        );
                        thread::sleep(Duration::from_secs(wait));
                        backoff_secs *= 2;
                        continue;
                    }

                    let payload: ObservationPayload = resp.json().map_err(|e| CliError {
                        code: exit_codes::EXIT_BRIDGE_UPSTREAM,
                        message: format!("failed to parse bridge listing response: {}", e),
                        hint: None,
                    })?;
                    return Ok(payload);
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == MAX_RETRIES {
                        return Err(CliError {
                            code: exit_codes::EXIT_BRIDGE_UPSTREAM,
                            message: format!(
                                "bridge unreachable after {} attempts: {}",
                                MAX_RETRIES, e,
                            ),
                            hint: Some(
                                "is the bridge running? check bridge_url in relist.toml"
                                    .to_string(),
                            ),
                        });
                    }

                    eprintln!(
                        "warning: retry {}/{} in {}s ({})",
                        attempt + 1,
                        MAX_RETRIES,
                        backoff_secs,
                        e,
                    );
                    thread::sleep(Duration::from_secs(backoff_secs));
                    backoff_secs *= 2;
                }
            }
        }

        unreachable!()
    }

    fn status_error(&self, what: &str, status: u16, msg: &str) -> CliError {
        let code = match status {
            401 | 403 => exit_codes::EXIT_BRIDGE_AUTH,
            400 | 422 => exit_codes::EXIT_BRIDGE_VALIDATION,
            429 => exit_codes::EXIT_BRIDGE_RATE_LIMIT,
            _ => exit_codes::EXIT_BRIDGE_UPSTREAM,
        };
        CliError {
            code,
            message: format!("bridge {} failed ({}): {}", what, status, msg),
            hint: None,
        }
    }
}

/// Best-effort extraction of the bridge's error message from a JSON
/// body, falling back to the raw status line.
fn body_message(resp: reqwest::blocking::Response) -> String {
    let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or("no detail")
        .to_string()
}

impl PriceMutator for BridgeClient {
    fn set_price(&mut self, item_id: &str, target_minor: i64) -> Result<(), MutationError> {
        let url = format!("{}/items/{}/price", self.base_url, item_id);
        let body = serde_json::json!({ "price": format_minor(target_minor) });

        let resp = self
            .http
            .put(&url)
            .json(&body)
            .send()
            .map_err(|e| MutationError::Transient(format!("bridge unreachable: {}", e)))?;

        let status = resp.status().as_u16();
        match status {
            200 | 204 => Ok(()),
            429 => Err(MutationError::Transient(format!(
                "rate limited updating item {}",
                item_id,
            ))),
            s if s >= 500 => Err(MutationError::Transient(format!(
                "bridge error (HTTP {}) updating item {}",
                s, item_id,
            ))),
            401 | 403 => Err(MutationError::Permanent(format!(
                "auth rejected updating item {} ({})",
                item_id,
                body_message(resp),
            ))),
            404 | 410 => Err(MutationError::Permanent(format!(
                "item {} no longer editable (HTTP {})",
                item_id, status,
            ))),
            s => Err(MutationError::Permanent(format!(
                "price rejected for item {} (HTTP {}): {}",
                item_id,
                s,
                body_message(resp),
            ))),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
