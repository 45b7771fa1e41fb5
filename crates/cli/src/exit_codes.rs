//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | run              | Sync-run codes (ledger, config)          |
//! | 50-59   | bridge           | Marketplace bridge connector codes       |
//!
//! A run that completes but records per-item mutation failures still
//! exits 0; failures are reported in the summary and the JSON report.
//! Non-zero exits are reserved for runs that could not complete.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// Ledger unreadable, unwritable, or failed write verification.
pub const EXIT_RUN_LEDGER: u8 = 3;

/// Config file unreadable or malformed TOML.
pub const EXIT_RUN_CONFIG: u8 = 4;

/// Worklist export destination could not be written.
pub const EXIT_RUN_WORKLIST: u8 = 5;

// =============================================================================
// Bridge (50-59) — marketplace bridge connector
// =============================================================================

/// Auth rejected by the bridge (401/403). The session is gone; no
/// amount of retrying recovers it.
pub const EXIT_BRIDGE_AUTH: u8 = 51;

/// Bad request rejected by the bridge (400/422).
pub const EXIT_BRIDGE_VALIDATION: u8 = 52;

/// Rate limited after retries (429).
pub const EXIT_BRIDGE_RATE_LIMIT: u8 = 53;

/// Bridge error (5xx) or network failure after retries.
pub const EXIT_BRIDGE_UPSTREAM: u8 = 54;
