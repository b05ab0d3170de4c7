//! Date-keyed, user-partitioned bill storage and its backends.

mod mem;
mod shelf;
mod sqlite;

pub use mem::MemStore;
pub use shelf::ShelfStore;
pub use sqlite::SqliteStore;

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{Days, NaiveDate};
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::pricing::LineItem;

pub type StoreResult<T> = Result<T, StoreError>;
pub type DynBillStore = Arc<dyn BillStore>;

/// One order: the line items a user bought in a single purchase.
pub type Bill = Vec<LineItem>;

/// A day's bills keyed by user, in first-insertion order.
pub type Bills = IndexMap<String, Vec<Bill>>;

/// Trait implemented by every bill backend.
pub trait BillStore: Send + Sync {
    /// All bills recorded on `date`; empty when nothing was stored.
    fn bills_for_date(&self, date: NaiveDate) -> StoreResult<Bills>;

    /// Append one bill for `user` on `date`.
    fn write_order(&self, date: NaiveDate, user: &str, line_items: &[LineItem]) -> StoreResult<()>;

    /// Every user's bills across `days` consecutive dates starting at `start`.
    fn bills_for_range_by_user(&self, start: NaiveDate, days: u32) -> StoreResult<Bills> {
        let mut by_user = Bills::new();
        for offset in 0..days {
            let Some(date) = start.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            for (user, bills) in self.bills_for_date(date)? {
                by_user.entry(user).or_default().extend(bills);
            }
        }
        Ok(by_user)
    }
}

/// Which persistent backend to use for a store path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Shelf,
    Sqlite,
}

impl Backend {
    /// Open the store at `path`, keeping existing content.
    pub fn open(self, path: &Path) -> StoreResult<DynBillStore> {
        Ok(match self {
            Backend::Shelf => Arc::new(ShelfStore::open(path)?),
            Backend::Sqlite => Arc::new(SqliteStore::open(path)?),
        })
    }

    /// Start an empty store at `path`, discarding existing content.
    pub fn create(self, path: &Path) -> StoreResult<DynBillStore> {
        Ok(match self {
            Backend::Shelf => Arc::new(ShelfStore::create(path)?),
            Backend::Sqlite => Arc::new(SqliteStore::create(path)?),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt {what} in store: {detail}")]
    Corrupt { what: &'static str, detail: String },
    #[error("amount {value} has fractions of a cent and cannot be stored exactly")]
    SubCent { value: Decimal },
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source: err,
    }
}
