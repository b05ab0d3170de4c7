//! Aggregations over stored bills.

use std::io::{self, Write};

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::pricing::{LineItem, to_cents};
use crate::store::{BillStore, StoreResult};

/// Total sales tax collected on `date`, quantized to cents after every addition.
pub fn sales_tax_for_date(store: &dyn BillStore, date: NaiveDate) -> StoreResult<Decimal> {
    let bills = store.bills_for_date(date)?;
    let total = bills
        .values()
        .flatten()
        .flatten()
        .fold(Decimal::ZERO, |acc, line| to_cents(acc + line.sales_tax()));
    Ok(total)
}

/// Each user's total spend across `days` days from `start`, in first-seen order.
pub fn spending_by_user(
    store: &dyn BillStore,
    start: NaiveDate,
    days: u32,
) -> StoreResult<IndexMap<String, Decimal>> {
    let by_user = store.bills_for_range_by_user(start, days)?;
    Ok(by_user
        .into_iter()
        .map(|(user, bills)| {
            let total: Decimal = bills.iter().flatten().map(LineItem::total_price).sum();
            (user, total)
        })
        .collect())
}

/// Users whose spend over the range strictly exceeds `threshold`.
pub fn discount_report(
    store: &dyn BillStore,
    start: NaiveDate,
    days: u32,
    threshold: Decimal,
) -> StoreResult<Vec<(String, Decimal)>> {
    let rows = spending_by_user(store, start, days)?
        .into_iter()
        .filter(|(_, total)| *total > threshold)
        .collect();
    Ok(rows)
}

pub fn write_discount_report(out: &mut impl Write, rows: &[(String, Decimal)]) -> io::Result<()> {
    for (user, total) in rows {
        writeln!(out, "{user:<20} {:>9}", format!("{total:.2}"))?;
    }
    Ok(())
}
