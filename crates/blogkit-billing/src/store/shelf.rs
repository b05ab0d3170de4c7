use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use indexmap::IndexMap;

use super::{BillStore, Bills, StoreError, StoreResult, io_error};
use crate::pricing::LineItem;

type Shelf = IndexMap<String, Bills>;

/// Single-file key-value store mapping ISO dates to that day's bills.
///
/// Every call opens the file, reads (or read-modify-writes) it and closes it
/// again. Writes land in a sibling `.tmp` file which is then renamed over the
/// shelf.
#[derive(Clone)]
pub struct ShelfStore {
    path: PathBuf,
}

impl fmt::Debug for ShelfStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShelfStore").field("path", &self.path).finish()
    }
}

impl ShelfStore {
    /// Open the shelf at `path`, creating an empty one if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        if !store.path.exists() {
            store.save(&Shelf::new())?;
        }
        Ok(store)
    }

    /// Create a fresh, empty shelf at `path`, discarding any previous content.
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.save(&Shelf::new())?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dates that have at least one stored entry, in insertion order.
    pub fn dates(&self) -> StoreResult<Vec<NaiveDate>> {
        self.load()?.keys().map(|key| parse_key(key)).collect()
    }

    fn load(&self) -> StoreResult<Shelf> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Shelf::new()),
            Err(err) => return Err(io_error(&self.path, err)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, shelf: &Shelf) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let bytes = serde_json::to_vec(shelf).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_key(key: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|e| StoreError::Corrupt {
        what: "date key",
        detail: format!("{key}: {e}"),
    })
}

impl BillStore for ShelfStore {
    fn bills_for_date(&self, date: NaiveDate) -> StoreResult<Bills> {
        let mut shelf = self.load()?;
        Ok(shelf.swap_remove(&date_key(date)).unwrap_or_default())
    }

    fn write_order(&self, date: NaiveDate, user: &str, line_items: &[LineItem]) -> StoreResult<()> {
        let mut shelf = self.load()?;
        shelf
            .entry(date_key(date))
            .or_default()
            .entry(user.to_string())
            .or_default()
            .push(line_items.to_vec());
        self.save(&shelf)?;
        tracing::debug!(store = ?self.path, %date, user, items = line_items.len(), "order written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{TaxTable, example_items, make_line_items};
    use crate::store::conformance;
    use tempfile::TempDir;

    fn fresh(dir: &TempDir) -> ShelfStore {
        ShelfStore::create(dir.path().join("bills.json")).expect("create")
    }

    #[test]
    fn empty_date_has_no_bills() {
        let dir = TempDir::new().expect("tmp");
        conformance::empty_date_has_no_bills(&fresh(&dir));
    }

    #[test]
    fn write_then_read_day() {
        let dir = TempDir::new().expect("tmp");
        conformance::write_then_read_day(&fresh(&dir));
    }

    #[test]
    fn range_collects_by_user() {
        let dir = TempDir::new().expect("tmp");
        conformance::range_collects_by_user(&fresh(&dir));
    }

    #[test]
    fn same_day_orders_keep_write_order() {
        let dir = TempDir::new().expect("tmp");
        conformance::same_day_orders_keep_write_order(&fresh(&dir));
    }

    #[test]
    fn create_discards_previous_content() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let lines = make_line_items(&example_items(), &TaxTable::default());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        store.write_order(date, "steve", &lines).expect("write");
        assert_eq!(store.dates().expect("dates"), vec![date]);

        let store = ShelfStore::create(store.path()).expect("recreate");
        assert!(store.dates().expect("dates").is_empty());
    }

    #[test]
    fn open_keeps_existing_content() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let lines = make_line_items(&example_items(), &TaxTable::default());
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        store.write_order(date, "steve", &lines).expect("write");

        let reopened = ShelfStore::open(store.path()).expect("open");
        let bills = reopened.bills_for_date(date).expect("read");
        assert_eq!(bills["steve"][0], lines);
    }

    #[test]
    fn garbage_file_is_reported_as_json_error() {
        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("bills.json");
        std::fs::write(&path, b"not json").expect("write");
        let store = ShelfStore::open(&path).expect("open");
        let err = store
            .bills_for_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
            .expect_err("should fail");
        assert!(matches!(err, StoreError::Json { .. }), "unexpected error: {err:?}");
    }
}
