//! Execution planning: selection filters and mode policy over a mutation
//! plan. Filters narrow the marketplace mutations only — additions,
//! removals, and reactivations are bookkeeping and are never filtered.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{MutationPlan, PriceAction};

/// The three execution modes, mutually exclusive per run. Bookkeeping is
/// identical in all three; they differ only in what happens to the
/// approved price actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Report the plan; mutate nothing.
    DryRun,
    /// Hand approved actions to the executor.
    Apply,
    /// Emit a human worklist; never call the mutation interface.
    Manual,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Apply => write!(f, "apply"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Optional, AND-combined selection filters over price actions.
#[derive(Debug, Default, Clone)]
pub struct Filters {
    /// Keep only these item ids.
    pub only_ids: Option<BTreeSet<String>>,
    /// Keep only titles containing this substring, case-insensitive.
    pub title_contains: Option<String>,
    /// Cap the action count, applied last, order preserved.
    pub limit: Option<usize>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.only_ids.is_none() && self.title_contains.is_none() && self.limit.is_none()
    }
}

/// The approved slice of a mutation plan for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovedPlan {
    pub mode: Mode,
    pub actions: Vec<PriceAction>,
    /// Price actions excluded by filters (still counted for the summary).
    pub filtered_out: usize,
}

pub fn plan(mutation_plan: &MutationPlan, filters: &Filters, mode: Mode) -> ApprovedPlan {
    let needle = filters.title_contains.as_ref().map(|s| s.to_lowercase());

    let mut actions: Vec<PriceAction> = mutation_plan
        .price_actions
        .iter()
        .filter(|action| {
            if let Some(ids) = &filters.only_ids {
                if !ids.contains(&action.item_id) {
                    return false;
                }
            }
            if let Some(needle) = &needle {
                if !action.title.to_lowercase().contains(needle.as_str()) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect();

    if let Some(limit) = filters.limit {
        actions.truncate(limit);
    }

    ApprovedPlan {
        mode,
        filtered_out: mutation_plan.price_actions.len() - actions.len(),
        actions,
    }
}
