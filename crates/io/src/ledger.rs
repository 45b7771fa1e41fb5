use std::fmt;
use std::io::Write;
use std::path::Path;

use relist_engine::model::{ItemStatus, RecordIssue, TrackedItem};
use relist_engine::money::{format_minor, parse_money_string};

/// Column order is fixed; it is the contract the user edits against.
/// `change_percent` and `floor_price` are theirs, the rest is ours.
pub const LEDGER_HEADER: [&str; 9] = [
    "item_id",
    "url",
    "title",
    "current_price",
    "new_price",
    "floor_price",
    "change_percent",
    "status",
    "last_updated",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum LedgerError {
    /// File unreadable/unwritable. Run-fatal: nothing can be computed
    /// safely without the persisted state.
    Io(String),
    /// Header is missing a required column.
    MissingColumn(String),
    /// Rows written to the ledger could not be read back.
    WriteVerify { missing: Vec<String> },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "ledger IO error: {msg}"),
            Self::MissingColumn(col) => write!(f, "ledger missing column '{col}'"),
            Self::WriteVerify { missing } => {
                write!(f, "ledger verify failed: {} row(s) absent after write ({})",
                    missing.len(),
                    missing.join(", "))
            }
        }
    }
}

impl std::error::Error for LedgerError {}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LedgerRead {
    pub rows: Vec<TrackedItem>,
    pub skipped: Vec<RecordIssue>,
}

/// Read all persisted rows. A missing file is an empty ledger (first
/// run), not an error. Malformed user-editable fields degrade to unset;
/// a row without a usable item_id or current price is dropped and
/// counted.
pub fn read_ledger(path: &Path) -> Result<LedgerRead, LedgerError> {
    if !path.exists() {
        return Ok(LedgerRead::default());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| LedgerError::Io(format!("cannot read {}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LedgerError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, LedgerError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LedgerError::MissingColumn(name.into()))
    };

    let id_idx = idx("item_id")?;
    let url_idx = idx("url")?;
    let title_idx = idx("title")?;
    let current_idx = idx("current_price")?;
    let new_idx = idx("new_price")?;
    let floor_idx = idx("floor_price")?;
    let percent_idx = idx("change_percent")?;
    let status_idx = idx("status")?;
    let updated_idx = idx("last_updated")?;

    let mut out = LedgerRead::default();

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                out.skipped.push(RecordIssue::new(None, format!("unreadable row: {e}")));
                continue;
            }
        };
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let item_id = field(id_idx).to_string();
        if item_id.is_empty() {
            out.skipped.push(RecordIssue::new(None, "row without item_id"));
            continue;
        }

        let current_minor = match parse_money_string(field(current_idx)) {
            Ok(v) => v,
            Err(e) => {
                out.skipped.push(RecordIssue::new(
                    Some(item_id),
                    format!("bad current_price {:?}: {e}", field(current_idx)),
                ));
                continue;
            }
        };

        // Engine-owned but tolerated: a broken new_price falls back to
        // the current price instead of dropping the row.
        let computed_minor = parse_money_string(field(new_idx)).unwrap_or(current_minor);

        let floor_minor = match field(floor_idx) {
            "" => None,
            s => match parse_money_string(s) {
                Ok(v) => Some(v),
                Err(e) => {
                    out.skipped.push(RecordIssue::new(
                        Some(item_id.clone()),
                        format!("bad floor_price {s:?} ignored: {e}"),
                    ));
                    None
                }
            },
        };

        let change_percent = match field(percent_idx) {
            "" => None,
            s => match s.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    out.skipped.push(RecordIssue::new(
                        Some(item_id.clone()),
                        format!("bad change_percent {s:?}; default applies"),
                    ));
                    None
                }
            },
        };

        let status = match field(status_idx).to_lowercase().as_str() {
            "" | "active" => ItemStatus::Active,
            "removed" | "sold" => ItemStatus::Removed,
            other => {
                out.skipped.push(RecordIssue::new(
                    Some(item_id.clone()),
                    format!("unknown status {other:?}; treated as active"),
                ));
                ItemStatus::Active
            }
        };

        out.rows.push(TrackedItem {
            item_id,
            url: field(url_idx).to_string(),
            title: field(title_idx).to_string(),
            current_minor,
            computed_minor,
            floor_minor,
            change_percent,
            status,
            last_updated: field(updated_idx).to_string(),
        });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

fn format_percent(p: f64) -> String {
    if p == p.trunc() {
        format!("{}", p as i64)
    } else {
        format!("{p}")
    }
}

/// Full-replacement write. Header always written, even for an empty
/// ledger; rows land in the order given by the caller (active first,
/// removed after — the engine's apply step sorts).
pub fn write_ledger(path: &Path, rows: &[TrackedItem]) -> Result<(), LedgerError> {
    let file = std::fs::File::create(path)
        .map_err(|e| LedgerError::Io(format!("cannot create {}: {e}", path.display())))?;
    let writer = std::io::BufWriter::new(file);

    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer
        .write_record(LEDGER_HEADER)
        .map_err(|e| LedgerError::Io(format!("CSV write error: {e}")))?;

    for row in rows {
        csv_writer
            .write_record([
                row.item_id.as_str(),
                row.url.as_str(),
                row.title.as_str(),
                &format_minor(row.current_minor),
                &format_minor(row.computed_minor),
                &row.floor_minor.map(format_minor).unwrap_or_default(),
                &row.change_percent.map(format_percent).unwrap_or_default(),
                &row.status.to_string(),
                row.last_updated.as_str(),
            ])
            .map_err(|e| LedgerError::Io(format!("CSV write error: {e}")))?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| LedgerError::Io(format!("CSV flush error: {e}")))?
        .flush()
        .map_err(|e| LedgerError::Io(format!("CSV flush error: {e}")))?;

    Ok(())
}

/// Write then read back. A row absent after write is an error, not a
/// silent no-op.
pub fn write_and_verify(path: &Path, rows: &[TrackedItem]) -> Result<(), LedgerError> {
    write_ledger(path, rows)?;

    let reread = read_ledger(path)?;
    let present: std::collections::BTreeSet<&str> =
        reread.rows.iter().map(|r| r.item_id.as_str()).collect();
    let missing: Vec<String> = rows
        .iter()
        .filter(|r| !present.contains(r.item_id.as_str()))
        .map(|r| r.item_id.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::WriteVerify { missing })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> TrackedItem {
        TrackedItem {
            item_id: id.into(),
            url: format!("https://example.test/items/{id}"),
            title: format!("Item {id}"),
            current_minor: 5000,
            computed_minor: 5500,
            floor_minor: Some(3000),
            change_percent: Some(10.0),
            status: ItemStatus::Active,
            last_updated: "2026-02-01 09:00:00".into(),
        }
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let read = read_ledger(&dir.path().join("no-such.csv")).unwrap();
        assert!(read.rows.is_empty());
        assert!(read.skipped.is_empty());
    }

    #[test]
    fn write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let rows = vec![row("1"), row("2")];

        write_and_verify(&path, &rows).unwrap();
        let read = read_ledger(&path).unwrap();
        assert_eq!(read.rows, rows);
        assert!(read.skipped.is_empty());
    }

    #[test]
    fn empty_write_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        write_ledger(&path, &[]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("item_id,url,title,current_price"));
    }

    #[test]
    fn user_edits_read_back_leniently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        // Blank percent, garbage floor, unknown status, one rotten row.
        std::fs::write(
            &path,
            "item_id,url,title,current_price,new_price,floor_price,change_percent,status,last_updated\n\
             1,https://x/1,Shoe,50.00,55.00,,,active,2026-02-01 09:00:00\n\
             2,https://x/2,Bag,12.00,12.00,cheap,-15,pending,2026-02-01 09:00:00\n\
             3,https://x/3,Hat,not-a-price,,,,active,\n",
        )
        .unwrap();

        let read = read_ledger(&path).unwrap();
        assert_eq!(read.rows.len(), 2);

        assert_eq!(read.rows[0].change_percent, None);
        assert_eq!(read.rows[0].floor_minor, None);

        assert_eq!(read.rows[1].change_percent, Some(-15.0));
        assert_eq!(read.rows[1].floor_minor, None);
        assert_eq!(read.rows[1].status, ItemStatus::Active);

        // Hat dropped (no usable price), plus two field-level notes.
        assert_eq!(read.skipped.len(), 3);
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "item_id,title\n1,Shoe\n").unwrap();
        let err = read_ledger(&path).unwrap_err();
        assert!(matches!(err, LedgerError::MissingColumn(_)));
    }

    #[test]
    fn removed_rows_survive_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut sold = row("9");
        sold.status = ItemStatus::Removed;
        write_and_verify(&path, &[row("1"), sold]).unwrap();

        let read = read_ledger(&path).unwrap();
        assert_eq!(read.rows[1].status, ItemStatus::Removed);
    }
}
