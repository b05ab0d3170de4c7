//! `blogkit fixtures build`: generate bill stores from JSON descriptions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use blogkit_billing::build_fixture;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

#[derive(Subcommand, Debug)]
pub enum FixturesCommand {
    /// Build one store per fixture unit
    Build(BuildArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Fixture units to build (`<data>/src/<unit>.json`)
    #[arg(required = true)]
    pub units: Vec<String>,

    /// Fixture data directory
    #[arg(long, default_value = "data")]
    pub data: PathBuf,
}

pub fn cmd_fixtures(opts: &GlobalOpts, cmd: &FixturesCommand) -> Result<()> {
    match cmd {
        FixturesCommand::Build(args) => cmd_build(opts, args),
    }
}

fn cmd_build(opts: &GlobalOpts, args: &BuildArgs) -> Result<()> {
    let mut built = Vec::with_capacity(args.units.len());
    for unit in &args.units {
        let summary = build_fixture(&args.data, unit, opts.backend())
            .with_context(|| format!("build fixture '{unit}'"))?;
        built.push(json!({
            "unit": unit,
            "path": summary.path.display().to_string(),
            "dates": summary.dates,
            "bills": summary.bills,
        }));
    }
    print_success(opts, json!(built), vec![])
}
