//! Item pricing and sales-tax computation.
//!
//! All money is carried as [`Decimal`]. The only rounding step is the
//! per-line sales tax, which is quantized to cents (half-even) so that a
//! line's total and the sum over a bill agree with what gets printed.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Tax rate applied to categories missing from the table.
pub const DEFAULT_TAX_PERCENT: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub units: u32,
}

impl PurchasedItem {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: Decimal,
        units: u32,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            unit_price,
            units,
        }
    }
}

/// The two wines used throughout the worked examples.
pub fn example_items() -> Vec<PurchasedItem> {
    vec![
        PurchasedItem::new("Bordeaux", "wine", Decimal::new(2112, 2), 6),
        PurchasedItem::new("Viognier", "wine", Decimal::new(2399, 2), 6),
    ]
}

/// Sales-tax percentages by product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTable {
    rates: BTreeMap<String, u32>,
    #[serde(default = "default_tax_percent")]
    fallback: u32,
}

fn default_tax_percent() -> u32 {
    DEFAULT_TAX_PERCENT
}

impl Default for TaxTable {
    fn default() -> Self {
        let rates = [("beer", 8), ("wine", 10), ("spirits", 13), ("staples", 0)]
            .into_iter()
            .map(|(category, pct)| (category.to_string(), pct))
            .collect();
        Self {
            rates,
            fallback: DEFAULT_TAX_PERCENT,
        }
    }
}

impl TaxTable {
    pub fn new(rates: BTreeMap<String, u32>, fallback: u32) -> Self {
        Self { rates, fallback }
    }

    pub fn percent_for(&self, category: &str) -> u32 {
        self.rates.get(category).copied().unwrap_or(self.fallback)
    }

    pub fn percent_for_item(&self, item: &PurchasedItem) -> u32 {
        self.percent_for(&item.category)
    }
}

/// A purchased item together with its computed net price and tax rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item: PurchasedItem,
    pub net_price: Decimal,
    pub tax_percent: u32,
}

impl LineItem {
    /// Sales tax on the line, rounded to cents.
    pub fn sales_tax(&self) -> Decimal {
        let raw = self.net_price * Decimal::from(self.tax_percent) / Decimal::ONE_HUNDRED;
        to_cents(raw)
    }

    pub fn total_price(&self) -> Decimal {
        self.net_price + self.sales_tax()
    }
}

/// Price of a single item, net of tax.
pub fn net_price(item: &PurchasedItem) -> Decimal {
    item.unit_price * Decimal::from(item.units)
}

/// Price of a single item including tax, without any rounding.
pub fn post_tax_price(item: &PurchasedItem, table: &TaxTable) -> Decimal {
    let pct = Decimal::from(100 + table.percent_for_item(item));
    net_price(item) * pct / Decimal::ONE_HUNDRED
}

pub fn make_line_items(items: &[PurchasedItem], table: &TaxTable) -> Vec<LineItem> {
    items
        .iter()
        .map(|item| LineItem {
            item: item.clone(),
            net_price: net_price(item),
            tax_percent: table.percent_for_item(item),
        })
        .collect()
}

/// Plain sum of item prices, ignoring tax.
pub fn total_net(items: &[PurchasedItem]) -> Decimal {
    items.iter().map(net_price).sum()
}

/// Sum of item prices with tax applied, unrounded.
pub fn total_with_tax(items: &[PurchasedItem], table: &TaxTable) -> Decimal {
    items.iter().map(|item| post_tax_price(item, table)).sum()
}

/// Sum of line totals; each line's tax is already rounded to cents.
pub fn total_price(line_items: &[LineItem]) -> Decimal {
    line_items.iter().map(LineItem::total_price).sum()
}

pub(crate) fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}
