//! `relist-io` — CSV ledger persistence.
//!
//! The ledger is the user-facing control panel: one row per ever-seen
//! item, status transitions only, never deletions. Reads are lenient
//! (malformed rows drop and count), writes are strict (full replacement,
//! verified by read-back).

pub mod ledger;

pub use ledger::{read_ledger, write_ledger, write_and_verify, LedgerError, LedgerRead};
