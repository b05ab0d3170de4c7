//! Invoice pricing, bill persistence, and the reports built on top of them.

pub mod fixtures;
pub mod invoice;
pub mod pricing;
pub mod report;
pub mod store;

pub use fixtures::{FixtureError, build_fixture};
pub use invoice::{BillError, bill_and_save, write_bill, write_detail};
pub use pricing::{LineItem, PurchasedItem, TaxTable, example_items, make_line_items};
pub use report::{discount_report, sales_tax_for_date, spending_by_user, write_discount_report};
pub use store::{
    Backend, Bill, BillStore, Bills, DynBillStore, MemStore, ShelfStore, SqliteStore, StoreError,
    StoreResult,
};
