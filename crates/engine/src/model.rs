use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A listing as delivered by the automation bridge, before validation.
/// `price` is the scraped text ("13.00", "€13,00", …) — parsing happens
/// in the snapshot step so a bad price drops one record, not the run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListing {
    pub item_id: String,
    pub title: String,
    pub price: String,
    pub url: String,
}

/// A validated live listing, one per item_id per run.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub item_id: String,
    pub title: String,
    pub price_minor: i64,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Removed,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// One ledger row. The ledger is append-mostly: rows transition status,
/// they are never deleted. `change_percent` and `floor_minor` are the only
/// user-editable fields; everything else is owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedItem {
    pub item_id: String,
    pub url: String,
    pub title: String,
    /// Last observed live price, minor units.
    pub current_minor: i64,
    /// Last planned target price, minor units.
    pub computed_minor: i64,
    /// User-set minimum price. Unset ⇒ no floor.
    pub floor_minor: Option<i64>,
    /// User-set percentage. Unset ⇒ configured default applies.
    pub change_percent: Option<f64>,
    pub status: ItemStatus,
    pub last_updated: String,
}

// ---------------------------------------------------------------------------
// Mutation plan
// ---------------------------------------------------------------------------

/// A planned price change for one already-tracked, active item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAction {
    pub item_id: String,
    pub title: String,
    pub url: String,
    pub current_minor: i64,
    pub target_minor: i64,
    pub change_percent: f64,
    /// Target was raised to the user's floor price.
    pub floored: bool,
    /// Target was clamped up to the 0.01 minimum.
    pub clamped: bool,
}

/// Output of one reconciliation pass. The four id sets are pairwise
/// disjoint: an item is new, removed, reactivated, or repriced — never two
/// of those in the same run. Newly added and reactivated items get their
/// first price action on the *next* run, after the user has had a chance
/// to edit their percentage.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MutationPlan {
    pub additions: Vec<TrackedItem>,
    pub removals: Vec<String>,
    pub reactivations: Vec<String>,
    pub price_actions: Vec<PriceAction>,
    /// Items evaluated but left alone (percent 0, or inside tolerance).
    pub unchanged: usize,
    /// Removals were withheld because the scan was not confirmed complete.
    pub removals_suppressed: bool,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationErrorKind {
    Transient,
    Permanent,
}

/// Outcome of one mutation attempt sequence against the marketplace.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub item_id: String,
    pub target_minor: i64,
    pub attempted: bool,
    pub succeeded: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<MutationErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Record-level issues
// ---------------------------------------------------------------------------

/// One unusable observed or persisted record: dropped, counted, reported.
/// Never aborts the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub detail: String,
}

impl RecordIssue {
    pub fn new(item_id: impl Into<Option<String>>, detail: impl Into<String>) -> Self {
        Self { item_id: item_id.into(), detail: detail.into() }
    }
}
