//! The reconciliation pass: diff a fresh observation against the persisted
//! ledger and produce a mutation plan.
//!
//! Every item classifies into exactly one of: addition, removal,
//! reactivation, or price action. Additions and reactivations never carry a
//! price action in the same run — the user gets one run to edit the
//! percentage before the engine touches the price.

use crate::model::{ItemStatus, MutationPlan, PriceAction, TrackedItem};
use crate::money::format_minor;
use crate::price;
use crate::snapshot::Snapshot;

/// Price changes within this many minor units of the current price are
/// rounding churn, not intent, and are dropped.
pub const TOLERANCE_MINOR: i64 = 1;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Applied when a row's change_percent is unset.
    pub default_percent: f64,
    /// The observation collaborator confirmed a full inventory scan.
    /// Without this, absence proves nothing and removals are suppressed.
    pub scan_complete: bool,
    /// Timestamp stamped onto rows the engine writes ("%Y-%m-%d %H:%M:%S").
    pub now: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            default_percent: price::DEFAULT_CHANGE_PERCENT,
            scan_complete: true,
            now: String::new(),
        }
    }
}

pub fn reconcile(snapshot: &Snapshot, opts: &ReconcileOptions) -> MutationPlan {
    let mut plan = MutationPlan::default();

    // BTreeMap iteration keeps every plan list ascending by item_id.
    for (item_id, listing) in &snapshot.observed {
        match snapshot.persisted.get(item_id) {
            None => {
                plan.additions.push(TrackedItem {
                    item_id: listing.item_id.clone(),
                    url: listing.url.clone(),
                    title: listing.title.clone(),
                    current_minor: listing.price_minor,
                    computed_minor: listing.price_minor,
                    floor_minor: None,
                    change_percent: None,
                    status: ItemStatus::Active,
                    last_updated: opts.now.clone(),
                });
            }
            Some(row) if row.status == ItemStatus::Removed => {
                // Same id reappearing after removal: relisted, not new.
                // The one transition back out of Removed.
                plan.reactivations.push(item_id.clone());
            }
            Some(row) => {
                let percent = row.change_percent.unwrap_or(opts.default_percent);
                if percent == 0.0 {
                    // Explicit no-op, distinct from "not yet evaluated".
                    plan.unchanged += 1;
                    continue;
                }
                // Fresh observed price, never the stale persisted one.
                let computed = price::compute(listing.price_minor, percent, row.floor_minor);
                if computed.clamped {
                    plan.warnings.push(format!(
                        "item {item_id}: {percent}% of {} is non-positive; clamped to {}",
                        format_minor(listing.price_minor),
                        format_minor(computed.target_minor),
                    ));
                }
                if (computed.target_minor - listing.price_minor).abs() > TOLERANCE_MINOR {
                    plan.price_actions.push(PriceAction {
                        item_id: item_id.clone(),
                        title: listing.title.clone(),
                        url: listing.url.clone(),
                        current_minor: listing.price_minor,
                        target_minor: computed.target_minor,
                        change_percent: percent,
                        floored: computed.floored,
                        clamped: computed.clamped,
                    });
                } else {
                    plan.unchanged += 1;
                }
            }
        }
    }

    if opts.scan_complete {
        // A record that was observed but dropped as malformed is not
        // evidence of absence.
        let skipped_ids: std::collections::BTreeSet<&str> = snapshot
            .skipped
            .iter()
            .filter_map(|i| i.item_id.as_deref())
            .collect();
        for (item_id, row) in &snapshot.persisted {
            if row.status == ItemStatus::Active
                && !snapshot.observed.contains_key(item_id)
                && !skipped_ids.contains(item_id.as_str())
            {
                plan.removals.push(item_id.clone());
            }
        }
    } else {
        plan.removals_suppressed = true;
        plan.warnings.push(
            "observation scan not confirmed complete; removals suppressed this run".into(),
        );
    }

    plan
}

/// Fold a plan back into the ledger rows (the bookkeeping half of a run,
/// performed in every mode). Returns the full replacement row set: active
/// rows first, then removed rows, each ascending by item_id.
pub fn apply_plan(snapshot: &Snapshot, plan: &MutationPlan, now: &str) -> Vec<TrackedItem> {
    let mut rows = snapshot.persisted.clone();

    for addition in &plan.additions {
        rows.insert(addition.item_id.clone(), addition.clone());
    }

    for item_id in &plan.removals {
        if let Some(row) = rows.get_mut(item_id) {
            row.status = ItemStatus::Removed;
            // change_percent survives removal so a relisted item keeps
            // the user's setting.
        }
    }

    for item_id in &plan.reactivations {
        if let Some(row) = rows.get_mut(item_id) {
            row.status = ItemStatus::Active;
            if let Some(listing) = snapshot.observed.get(item_id) {
                row.current_minor = listing.price_minor;
                row.computed_minor = listing.price_minor;
                row.title = listing.title.clone();
                row.url = listing.url.clone();
            }
        }
    }

    // Refresh still-active tracked items from the live observation.
    for (item_id, listing) in &snapshot.observed {
        if plan.reactivations.contains(item_id) {
            continue;
        }
        if let Some(row) = rows.get_mut(item_id) {
            if row.status == ItemStatus::Active {
                row.current_minor = listing.price_minor;
                row.computed_minor = listing.price_minor;
                row.title = listing.title.clone();
                row.url = listing.url.clone();
            }
        }
    }
    for action in &plan.price_actions {
        if let Some(row) = rows.get_mut(&action.item_id) {
            row.computed_minor = action.target_minor;
        }
    }

    let mut out: Vec<TrackedItem> = rows.into_values().collect();
    for row in &mut out {
        row.last_updated = now.to_string();
    }
    out.sort_by(|a, b| {
        (a.status == ItemStatus::Removed, &a.item_id).cmp(&(b.status == ItemStatus::Removed, &b.item_id))
    });
    out
}

/// Record execution outcomes on the ledger rows. The ledger reflects
/// reality, not intent: the price moves only when the mutation succeeded,
/// the timestamp moves for every attempted item.
pub fn apply_outcomes(
    rows: &mut [TrackedItem],
    results: &[crate::model::ExecutionResult],
    now: &str,
) {
    for result in results {
        if !result.attempted {
            continue;
        }
        if let Some(row) = rows.iter_mut().find(|r| r.item_id == result.item_id) {
            if result.succeeded {
                row.current_minor = result.target_minor;
                row.computed_minor = result.target_minor;
            }
            row.last_updated = now.to_string();
        }
    }
}
