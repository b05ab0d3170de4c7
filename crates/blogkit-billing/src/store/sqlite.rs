use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, Row, named_params};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use super::{BillStore, Bills, StoreError, StoreResult, io_error};
use crate::pricing::{LineItem, PurchasedItem};

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS Invoice (
    id INTEGER PRIMARY KEY,
    date INTEGER NOT NULL,
    user TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Item (
    invoice_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    unit_price INTEGER NOT NULL,
    units INTEGER NOT NULL,
    net_price INTEGER NOT NULL,
    tax_percent INTEGER NOT NULL,
    FOREIGN KEY(invoice_id) REFERENCES Invoice(id)
);

CREATE INDEX IF NOT EXISTS invoice_by_date ON Invoice(date);
";

/// Invoices and their items in two SQLite tables.
///
/// Dates are stored as proleptic Gregorian ordinals (0001-01-01 is day 1) and
/// money as integer hundredths. A connection is opened per call.
#[derive(Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish()
    }
}

/// One row of the invoice/item join. Item columns are NULL for empty invoices.
struct ItemRow {
    invoice_id: i64,
    user: String,
    name: Option<String>,
    category: Option<String>,
    unit_price: Option<i64>,
    units: Option<i64>,
    net_price: Option<i64>,
    tax_percent: Option<i64>,
}

impl ItemRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            invoice_id: row.get("id")?,
            user: row.get("user")?,
            name: row.get("name")?,
            category: row.get("category")?,
            unit_price: row.get("unit_price")?,
            units: row.get("units")?,
            net_price: row.get("net_price")?,
            tax_percent: row.get("tax_percent")?,
        })
    }

    fn into_line_item(self) -> StoreResult<Option<LineItem>> {
        let (Some(name), Some(category), Some(unit_price), Some(units), Some(net_price), Some(pct)) = (
            self.name,
            self.category,
            self.unit_price,
            self.units,
            self.net_price,
            self.tax_percent,
        ) else {
            return Ok(None);
        };
        let units = u32::try_from(units).map_err(|_| corrupt("units", units))?;
        let tax_percent = u32::try_from(pct).map_err(|_| corrupt("tax_percent", pct))?;
        Ok(Some(LineItem {
            item: PurchasedItem::new(name, category, from_cents("unit_price", unit_price)?, units),
            net_price: from_cents("net_price", net_price)?,
            tax_percent,
        }))
    }
}

fn corrupt(what: &'static str, value: i64) -> StoreError {
    StoreError::Corrupt {
        what,
        detail: value.to_string(),
    }
}

fn from_cents(what: &'static str, cents: i64) -> StoreResult<Decimal> {
    if cents < 0 {
        return Err(corrupt(what, cents));
    }
    Ok(Decimal::new(cents, 2))
}

/// Amounts must be whole cents; anything finer is refused rather than rounded.
fn to_cents(value: Decimal) -> StoreResult<i64> {
    let cents = value * Decimal::ONE_HUNDRED;
    if !cents.fract().is_zero() {
        return Err(StoreError::SubCent { value });
    }
    cents.to_i64().ok_or_else(|| StoreError::Corrupt {
        what: "amount",
        detail: value.to_string(),
    })
}

fn ordinal(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

impl SqliteStore {
    /// Use the database at `path`, creating the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.connect()?;
        Ok(store)
    }

    /// Remove any database at `path` and start an empty one.
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(io_error(path, err)),
        }
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StoreResult<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

impl BillStore for SqliteStore {
    fn bills_for_date(&self, date: NaiveDate) -> StoreResult<Bills> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT Invoice.id AS id, Invoice.user AS user, Item.name AS name,
                    Item.category AS category, Item.unit_price AS unit_price,
                    Item.units AS units, Item.net_price AS net_price,
                    Item.tax_percent AS tax_percent
             FROM Invoice LEFT JOIN Item ON Invoice.id = Item.invoice_id
             WHERE Invoice.date = :date
             ORDER BY Invoice.id, Item.rowid",
        )?;
        let rows = stmt.query_map(named_params! { ":date": ordinal(date) }, ItemRow::from_row)?;

        let mut bills = Bills::new();
        let mut current_invoice = None;
        for row in rows {
            let row = row?;
            let user_bills = bills.entry(row.user.clone()).or_default();
            if current_invoice != Some(row.invoice_id) {
                current_invoice = Some(row.invoice_id);
                user_bills.push(Vec::new());
            }
            if let Some(line) = row.into_line_item()? {
                if let Some(bill) = user_bills.last_mut() {
                    bill.push(line);
                }
            }
        }
        Ok(bills)
    }

    fn write_order(&self, date: NaiveDate, user: &str, line_items: &[LineItem]) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO Invoice(date, user) VALUES(:date, :user)",
            named_params! { ":date": ordinal(date), ":user": user },
        )?;
        let invoice_id = tx.last_insert_rowid();
        {
            let mut insert = tx.prepare(
                "INSERT INTO Item VALUES(:invoice_id, :name, :category, :unit_price,
                                         :units, :net_price, :tax_percent)",
            )?;
            for line in line_items {
                insert.execute(named_params! {
                    ":invoice_id": invoice_id,
                    ":name": line.item.name,
                    ":category": line.item.category,
                    ":unit_price": to_cents(line.item.unit_price)?,
                    ":units": line.item.units,
                    ":net_price": to_cents(line.net_price)?,
                    ":tax_percent": line.tax_percent,
                })?;
            }
        }
        tx.commit()?;
        tracing::debug!(store = ?self.path, %date, user, invoice_id, "invoice written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{TaxTable, example_items, make_line_items};
    use crate::store::conformance;
    use tempfile::TempDir;

    fn fresh(dir: &TempDir) -> SqliteStore {
        SqliteStore::create(dir.path().join("bills.db")).expect("create")
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
    fn dates_are_stored_as_gregorian_ordinals() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let lines = make_line_items(&example_items(), &TaxTable::default());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        store.write_order(date, "steve", &lines).expect("write");

        let conn = Connection::open(store.path()).expect("open");
        let (stored, price): (i64, i64) = conn
            .query_row(
                "SELECT Invoice.date, Item.unit_price FROM Invoice JOIN Item
                 ON Invoice.id = Item.invoice_id ORDER BY Item.rowid LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("query");
        assert_eq!(stored, 737_425);
        assert_eq!(price, 2112);
    }

    #[test]
    fn empty_order_is_kept_as_empty_bill() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let date = NaiveDate::from_ymd_opt(2022, 2, 2).unwrap();
        store.write_order(date, "nobody", &[]).expect("write");
        let bills = store.bills_for_date(date).expect("read");
        assert_eq!(bills["nobody"], vec![Vec::<LineItem>::new()]);
    }

    #[test]
    fn sub_cent_amounts_are_refused() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let lager = PurchasedItem::new("Lager", "beer", Decimal::new(125, 3), 3);
        let lines = make_line_items(&[lager], &TaxTable::default());
        let date = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();

        let err = store.write_order(date, "steve", &lines).unwrap_err();
        assert!(
            matches!(err, StoreError::SubCent { value } if value == Decimal::new(125, 3)),
            "unexpected error: {err:?}"
        );
        assert!(store.bills_for_date(date).expect("read").is_empty());
    }

    #[test]
    fn negative_cents_are_corrupt() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let lines = make_line_items(&example_items(), &TaxTable::default());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        store.write_order(date, "steve", &lines).expect("write");

        let conn = Connection::open(store.path()).expect("open");
        conn.execute("UPDATE Item SET net_price = -5", [])
            .expect("update");
        let err = store.bills_for_date(date).unwrap_err();
        assert!(
            matches!(err, StoreError::Corrupt { what: "net_price", .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn create_removes_previous_database() {
        let dir = TempDir::new().expect("tmp");
        let store = fresh(&dir);
        let lines = make_line_items(&example_items(), &TaxTable::default());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        store.write_order(date, "steve", &lines).expect("write");

        let store = SqliteStore::create(store.path()).expect("recreate");
        assert!(store.bills_for_date(date).expect("read").is_empty());
    }
}
