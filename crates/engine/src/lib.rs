//! `relist-engine` — Listing reconciliation and price-update planning engine.
//!
//! Pure engine crate: receives pre-loaded listings and ledger rows, returns
//! mutation plans and execution results. No CLI or network dependencies.

pub mod error;
pub mod execute;
pub mod model;
pub mod money;
pub mod plan;
pub mod price;
pub mod reconcile;
pub mod snapshot;

pub use error::MutationError;
pub use execute::{execute, ExecutorOptions, PriceMutator};
pub use model::{ExecutionResult, Listing, MutationPlan, PriceAction, TrackedItem};
pub use plan::{plan, ApprovedPlan, Filters, Mode};
pub use reconcile::{apply_outcomes, apply_plan, reconcile, ReconcileOptions};
pub use snapshot::{normalize, Snapshot};
