//! Boundary normalization: raw observed listings and persisted ledger rows
//! become maps keyed by item_id. Individually malformed records are dropped
//! and counted — the observation source is scraped HTML, so bad entries are
//! expected and must never abort a run.

use std::collections::BTreeMap;

use crate::model::{Listing, RawListing, RecordIssue, TrackedItem};
use crate::money::parse_scraped_price;

/// Normalized inputs for one reconciliation run. BTreeMap keys give every
/// downstream pass ascending item_id order for free.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub observed: BTreeMap<String, Listing>,
    pub persisted: BTreeMap<String, TrackedItem>,
    pub skipped: Vec<RecordIssue>,
}

pub fn normalize(observed: Vec<RawListing>, persisted: Vec<TrackedItem>) -> Snapshot {
    let mut snapshot = Snapshot::default();

    for raw in observed {
        let item_id = raw.item_id.trim().to_string();
        if item_id.is_empty() {
            snapshot
                .skipped
                .push(RecordIssue::new(None, "observed listing without item_id"));
            continue;
        }

        let price_minor = match parse_scraped_price(&raw.price) {
            Ok(p) => p,
            Err(e) => {
                snapshot.skipped.push(RecordIssue::new(
                    Some(item_id.clone()),
                    format!("unparsable price {:?}: {e}", raw.price),
                ));
                continue;
            }
        };

        let mut title = raw.title.trim().to_string();
        if title.is_empty() {
            title = format!("Item {item_id}");
        }

        if snapshot.observed.contains_key(&item_id) {
            snapshot.skipped.push(RecordIssue::new(
                Some(item_id),
                "duplicate item_id in observation; first occurrence kept",
            ));
            continue;
        }

        snapshot.observed.insert(
            item_id.clone(),
            Listing { item_id, title, price_minor, url: raw.url.trim().to_string() },
        );
    }

    for mut row in persisted {
        row.item_id = row.item_id.trim().to_string();
        if row.item_id.is_empty() {
            snapshot
                .skipped
                .push(RecordIssue::new(None, "ledger row without item_id"));
            continue;
        }
        if snapshot.persisted.contains_key(&row.item_id) {
            snapshot.skipped.push(RecordIssue::new(
                Some(row.item_id),
                "duplicate item_id in ledger; first occurrence kept",
            ));
            continue;
        }
        row.title = row.title.trim().to_string();
        snapshot.persisted.insert(row.item_id.clone(), row);
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemStatus;

    fn raw(id: &str, title: &str, price: &str) -> RawListing {
        RawListing {
            item_id: id.into(),
            title: title.into(),
            price: price.into(),
            url: format!("https://example.test/items/{id}"),
        }
    }

    fn row(id: &str) -> TrackedItem {
        TrackedItem {
            item_id: id.into(),
            url: String::new(),
            title: "x".into(),
            current_minor: 1000,
            computed_minor: 1000,
            floor_minor: None,
            change_percent: None,
            status: ItemStatus::Active,
            last_updated: String::new(),
        }
    }

    #[test]
    fn parses_and_trims() {
        let s = normalize(vec![raw("7", "  Wool coat  ", "€45,00")], vec![]);
        let listing = &s.observed["7"];
        assert_eq!(listing.title, "Wool coat");
        assert_eq!(listing.price_minor, 4500);
        assert!(s.skipped.is_empty());
    }

    #[test]
    fn drops_and_counts_malformed() {
        let s = normalize(
            vec![raw("", "No id", "10.00"), raw("2", "Bad price", "sold"), raw("3", "Ok", "5.00")],
            vec![],
        );
        assert_eq!(s.observed.len(), 1);
        assert_eq!(s.skipped.len(), 2);
        assert!(s.observed.contains_key("3"));
    }

    #[test]
    fn duplicate_observation_keeps_first() {
        let s = normalize(vec![raw("1", "First", "10.00"), raw("1", "Second", "20.00")], vec![]);
        assert_eq!(s.observed.len(), 1);
        assert_eq!(s.observed["1"].price_minor, 1000);
        assert_eq!(s.skipped.len(), 1);
    }

    #[test]
    fn blank_title_gets_placeholder() {
        let s = normalize(vec![raw("9", "   ", "1.00")], vec![]);
        assert_eq!(s.observed["9"].title, "Item 9");
    }

    #[test]
    fn duplicate_ledger_row_keeps_first() {
        let mut second = row("5");
        second.current_minor = 9999;
        let s = normalize(vec![], vec![row("5"), second]);
        assert_eq!(s.persisted.len(), 1);
        assert_eq!(s.persisted["5"].current_minor, 1000);
        assert_eq!(s.skipped.len(), 1);
    }
}
