//! Printed invoice layout.

use std::io::{self, Write};

use chrono::NaiveDate;

use crate::pricing::{LineItem, PurchasedItem, TaxTable, make_line_items, total_price};
use crate::store::{BillStore, StoreError};

/// Render one line per item: units, name, category, rate, unit price, line total.
pub fn write_detail(out: &mut impl Write, line_items: &[LineItem]) -> io::Result<()> {
    for line in line_items {
        writeln!(
            out,
            "{:<2} {:<16} ({:<16}) {:<2}% {:.2} {:.2}",
            line.item.units,
            line.item.name,
            line.item.category,
            line.tax_percent,
            line.item.unit_price,
            line.total_price(),
        )?;
    }
    Ok(())
}

/// Render the bill total followed by its detail lines.
pub fn write_bill(out: &mut impl Write, line_items: &[LineItem]) -> io::Result<()> {
    writeln!(out, "Total: {:.2}", total_price(line_items))?;
    write_detail(out, line_items)
}

#[derive(Debug, thiserror::Error)]
pub enum BillError {
    #[error("write bill: {0}")]
    Output(#[from] io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Price `items`, print the bill to `out`, and record it for `user` on `date`.
pub fn bill_and_save(
    store: &dyn BillStore,
    out: &mut impl Write,
    items: &[PurchasedItem],
    table: &TaxTable,
    user: &str,
    date: NaiveDate,
) -> Result<Vec<LineItem>, BillError> {
    let line_items = make_line_items(items, table);
    write_bill(out, &line_items)?;
    store.write_order(date, user, &line_items)?;
    tracing::info!(user, %date, total = %total_price(&line_items), "bill saved");
    Ok(line_items)
}
