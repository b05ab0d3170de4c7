//! `blogkit bill` commands.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use blogkit_billing::{
    BillStore, DynBillStore, PurchasedItem, TaxTable, bill_and_save, discount_report,
    example_items,
    pricing::{DEFAULT_TAX_PERCENT, total_price},
    sales_tax_for_date, write_bill, write_discount_report,
};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::{print_success, print_text_or_json};

#[derive(Subcommand, Debug)]
pub enum BillCommand {
    /// Create an empty bill store
    Init(InitArgs),
    /// Price a purchase, print the bill and store it
    Save(SaveArgs),
    /// Show stored bills for a date range, grouped by user
    Show(RangeArgs),
    /// Total sales tax collected on a date
    Tax(TaxArgs),
    /// Users whose spending over a range exceeds a threshold
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing store
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Customer name
    #[arg(long)]
    pub user: String,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// JSON list of purchased items (defaults to the two example wines)
    #[arg(long)]
    pub items: Option<PathBuf>,

    /// JSON map of category to tax percent (defaults to the built-in table)
    #[arg(long)]
    pub tax_table: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// First date of the range (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Number of consecutive days
    #[arg(long, default_value_t = 1)]
    pub days: u32,
}

#[derive(Args, Debug)]
pub struct TaxArgs {
    /// Date to total (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Minimum spend; only users above it are listed
    #[arg(long, default_value = "0")]
    pub threshold: Decimal,
}

pub fn cmd_bill(opts: &GlobalOpts, cmd: &BillCommand) -> Result<()> {
    match cmd {
        BillCommand::Init(args) => cmd_init(opts, args),
        BillCommand::Save(args) => cmd_save(opts, args),
        BillCommand::Show(args) => cmd_show(opts, args),
        BillCommand::Tax(args) => cmd_tax(opts, args),
        BillCommand::Report(args) => cmd_report(opts, args),
    }
}

fn open_store(opts: &GlobalOpts) -> Result<DynBillStore> {
    opts.backend()
        .open(&opts.bills)
        .with_context(|| format!("open bill store {}", opts.bills.display()))
}

fn cmd_init(opts: &GlobalOpts, args: &InitArgs) -> Result<()> {
    if opts.bills.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to replace it",
            opts.bills.display()
        );
    }
    opts.backend()
        .create(&opts.bills)
        .with_context(|| format!("create bill store {}", opts.bills.display()))?;
    print_success(
        opts,
        json!({
            "path": opts.bills.display().to_string(),
            "backend": format!("{:?}", opts.backend).to_lowercase(),
        }),
        vec![],
    )
}

fn cmd_save(opts: &GlobalOpts, args: &SaveArgs) -> Result<()> {
    let items: Vec<PurchasedItem> = match &args.items {
        Some(path) => read_json(path)?,
        None => example_items(),
    };
    let table = match &args.tax_table {
        Some(path) => {
            let rates: BTreeMap<String, u32> = read_json(path)?;
            TaxTable::new(rates, DEFAULT_TAX_PERCENT)
        }
        None => TaxTable::default(),
    };
    let store = open_store(opts)?;
    let mut text = Vec::new();
    let line_items = bill_and_save(store.as_ref(), &mut text, &items, &table, &args.user, args.date)
        .context("save bill")?;
    print_text_or_json(
        opts,
        String::from_utf8_lossy(&text).into_owned(),
        json!({
            "user": args.user,
            "date": args.date,
            "total": total_price(&line_items),
            "lines": line_items,
        }),
    )
}

fn cmd_show(opts: &GlobalOpts, args: &RangeArgs) -> Result<()> {
    let store = open_store(opts)?;
    let by_user = store
        .bills_for_range_by_user(args.start, args.days)
        .context("read bills")?;
    let mut text = Vec::new();
    for (user, bills) in &by_user {
        for bill in bills {
            writeln!(text, "[{user}]")?;
            write_bill(&mut text, bill)?;
        }
    }
    print_text_or_json(
        opts,
        String::from_utf8_lossy(&text).into_owned(),
        serde_json::to_value(&by_user)?,
    )
}

fn cmd_tax(opts: &GlobalOpts, args: &TaxArgs) -> Result<()> {
    let store = open_store(opts)?;
    let tax = sales_tax_for_date(store.as_ref(), args.date).context("total sales tax")?;
    print_text_or_json(
        opts,
        format!("{tax:.2}\n"),
        json!({ "date": args.date, "sales_tax": tax }),
    )
}

fn cmd_report(opts: &GlobalOpts, args: &ReportArgs) -> Result<()> {
    let store = open_store(opts)?;
    let rows = discount_report(
        store.as_ref(),
        args.range.start,
        args.range.days,
        args.threshold,
    )
    .context("build discount report")?;
    let mut text = Vec::new();
    write_discount_report(&mut text, &rows)?;
    let data: Vec<_> = rows
        .iter()
        .map(|(user, total)| json!({ "user": user, "total": total }))
        .collect();
    print_text_or_json(opts, String::from_utf8_lossy(&text).into_owned(), json!(data))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}
