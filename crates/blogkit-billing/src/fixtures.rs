//! Build bill stores from JSON fixture descriptions.
//!
//! A fixture directory looks like:
//!
//! ```text
//! <data>/src/<unit>.json        products, orders, tax_percent, users
//! <data>/defaults/<key>.json    fallback for any key a unit omits
//! <data>/fixtures/<unit>        generated store
//! ```
//!
//! `products` maps a product name to `[category, price]`; `orders` maps an ISO
//! date to a list of `[user, [[product, quantity], ...]]` entries, each of
//! which becomes one bill.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::pricing::{DEFAULT_TAX_PERCENT, PurchasedItem, TaxTable, make_line_items};
use crate::store::{Backend, StoreError};

const FIXTURE_KEYS: [&str; 4] = ["products", "orders", "tax_percent", "users"];

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("fixture '{unit}': neither data nor defaults for '{key}'")]
    MissingKey { unit: String, key: &'static str },
    #[error("fixture '{unit}': invalid structure: {source}")]
    Shape {
        unit: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("fixture '{unit}': invalid date '{date}'")]
    BadDate { unit: String, date: String },
    #[error("fixture '{unit}': unknown product '{product}'")]
    UnknownProduct { unit: String, product: String },
    #[error("fixture '{unit}': unknown user '{user}'")]
    UnknownUser { unit: String, user: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct FixtureData {
    products: BTreeMap<String, (String, Decimal)>,
    orders: IndexMap<String, Vec<(String, Vec<(String, u32)>)>>,
    tax_percent: BTreeMap<String, u32>,
    users: Vec<String>,
}

/// Summary of a generated fixture store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSummary {
    pub path: PathBuf,
    pub dates: usize,
    pub bills: usize,
}

/// Where the generated store for `unit` lives.
pub fn location(data_dir: &Path, unit: &str) -> PathBuf {
    data_dir.join("fixtures").join(unit)
}

/// Generate a fresh store for `unit` from its JSON description.
pub fn build_fixture(
    data_dir: &Path,
    unit: &str,
    backend: Backend,
) -> Result<FixtureSummary, FixtureError> {
    let data = load_fixture(data_dir, unit)?;
    let table = TaxTable::new(data.tax_percent.clone(), DEFAULT_TAX_PERCENT);

    let mut orders = Vec::new();
    for (date_text, entries) in &data.orders {
        let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|_| {
            FixtureError::BadDate {
                unit: unit.to_string(),
                date: date_text.clone(),
            }
        })?;
        for (user, lines) in entries {
            if !data.users.is_empty() && !data.users.contains(user) {
                return Err(FixtureError::UnknownUser {
                    unit: unit.to_string(),
                    user: user.clone(),
                });
            }
            let items = lines
                .iter()
                .map(|(product, quantity)| {
                    let (category, price) = data.products.get(product).ok_or_else(|| {
                        FixtureError::UnknownProduct {
                            unit: unit.to_string(),
                            product: product.clone(),
                        }
                    })?;
                    Ok(PurchasedItem::new(product, category, *price, *quantity))
                })
                .collect::<Result<Vec<_>, FixtureError>>()?;
            orders.push((date, user.as_str(), make_line_items(&items, &table)));
        }
    }

    let path = location(data_dir, unit);
    let store = backend.create(&path)?;
    for (date, user, line_items) in &orders {
        store.write_order(*date, user, line_items)?;
    }
    tracing::info!(unit, path = ?path, bills = orders.len(), "fixture built");
    Ok(FixtureSummary {
        path,
        dates: data.orders.len(),
        bills: orders.len(),
    })
}

fn load_fixture(data_dir: &Path, unit: &str) -> Result<FixtureData, FixtureError> {
    let source_path = data_dir.join("src").join(format!("{unit}.json"));
    let mut data = match read_json(&source_path)? {
        Value::Object(map) => map,
        other => {
            return Err(FixtureError::Shape {
                unit: unit.to_string(),
                source: serde::de::Error::custom(format!("expected an object, got {other}")),
            });
        }
    };
    for key in FIXTURE_KEYS {
        default_key(&mut data, data_dir, unit, key)?;
    }
    serde_json::from_value(Value::Object(data)).map_err(|source| FixtureError::Shape {
        unit: unit.to_string(),
        source,
    })
}

fn default_key(
    data: &mut Map<String, Value>,
    data_dir: &Path,
    unit: &str,
    key: &'static str,
) -> Result<(), FixtureError> {
    if data.contains_key(key) {
        return Ok(());
    }
    let path = data_dir.join("defaults").join(format!("{key}.json"));
    if !path.exists() {
        return Err(FixtureError::MissingKey {
            unit: unit.to_string(),
            key,
        });
    }
    tracing::debug!(unit, key, path = ?path, "using default");
    data.insert(key.to_string(), read_json(&path)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, FixtureError> {
    let bytes = fs::read(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| FixtureError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BillStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, value: Value) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    }

    fn seed(dir: &Path) {
        write(
            dir,
            "src/test_data_01.json",
            json!({
                "orders": {
                    "2020-01-01": [["steve", [["Bordeaux", 6], ["Viognier", 6]]]],
                    "2020-01-02": [["alex", [["Lager", 12]]], ["steve", [["Bordeaux", 1]]]]
                }
            }),
        );
        write(
            dir,
            "defaults/products.json",
            json!({
                "Bordeaux": ["wine", "21.12"],
                "Viognier": ["wine", "23.99"],
                "Lager": ["beer", "1.50"]
            }),
        );
        write(dir, "defaults/tax_percent.json", json!({"wine": 10, "beer": 8}));
        write(dir, "defaults/users.json", json!(["steve", "alex"]));
    }

    #[test]
    fn builds_identical_stores_for_both_backends() {
        let dir = TempDir::new().expect("tmp");
        seed(dir.path());
        let jan1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let jan2 = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

        let shelf = build_fixture(dir.path(), "test_data_01", Backend::Shelf).expect("shelf");
        assert_eq!(shelf.dates, 2);
        assert_eq!(shelf.bills, 3);
        let shelf_store = Backend::Shelf.open(&shelf.path).expect("open");
        let from_shelf = shelf_store.bills_for_range_by_user(jan1, 2).expect("range");

        fs::remove_file(&shelf.path).expect("remove shelf");
        let sql = build_fixture(dir.path(), "test_data_01", Backend::Sqlite).expect("sqlite");
        let sql_store = Backend::Sqlite.open(&sql.path).expect("open");
        let from_sql = sql_store.bills_for_range_by_user(jan1, 2).expect("range");

        assert_eq!(from_shelf, from_sql);
        assert_eq!(from_shelf["steve"].len(), 2);
        assert_eq!(from_shelf["steve"][0].len(), 2);
        let alex = &sql_store.bills_for_date(jan2).expect("day")["alex"][0][0];
        assert_eq!(alex.tax_percent, 8);
        assert_eq!(alex.net_price, "18.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn missing_key_without_default_is_reported() {
        let dir = TempDir::new().expect("tmp");
        seed(dir.path());
        fs::remove_file(dir.path().join("defaults/users.json")).unwrap();
        let err = build_fixture(dir.path(), "test_data_01", Backend::Shelf).expect_err("fail");
        assert!(matches!(err, FixtureError::MissingKey { key: "users", .. }), "{err}");
    }

    #[test]
    fn unknown_product_is_reported() {
        let dir = TempDir::new().expect("tmp");
        seed(dir.path());
        write(
            dir.path(),
            "src/bad.json",
            json!({"orders": {"2020-01-01": [["steve", [["Merlot", 1]]]]}}),
        );
        let err = build_fixture(dir.path(), "bad", Backend::Shelf).expect_err("fail");
        assert!(
            matches!(&err, FixtureError::UnknownProduct { product, .. } if product == "Merlot"),
            "{err}"
        );
    }

    #[test]
    fn unknown_user_is_reported() {
        let dir = TempDir::new().expect("tmp");
        seed(dir.path());
        write(
            dir.path(),
            "src/stranger.json",
            json!({"orders": {"2020-01-01": [["mallory", [["Lager", 1]]]]}}),
        );
        let err = build_fixture(dir.path(), "stranger", Backend::Sqlite).expect_err("fail");
        assert!(matches!(err, FixtureError::UnknownUser { .. }), "{err}");
    }
}
