//! Global CLI options.

use std::path::PathBuf;

use blogkit_billing::Backend;
use clap::{Args, ValueEnum};

/// Global options for CLI commands.
///
/// These options apply to all commands and can be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Bill store path (env: BLOGKIT_BILLS)
    #[arg(long, global = true, env = "BLOGKIT_BILLS", default_value = "bills.db")]
    pub bills: PathBuf,

    /// Bill store backend (env: BLOGKIT_BACKEND)
    #[arg(
        long,
        value_enum,
        default_value_t = BackendArg::Sqlite,
        global = true,
        env = "BLOGKIT_BACKEND"
    )]
    pub backend: BackendArg,

    /// Document database (env: BLOGKIT_DOCS_DB)
    #[arg(long, global = true, env = "BLOGKIT_DOCS_DB", default_value = "docs.db")]
    pub docs_db: PathBuf,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress notices
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// Single JSON file keyed by date
    Shelf,
    /// SQLite database with Invoice and Item tables
    Sqlite,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Shelf => Backend::Shelf,
            BackendArg::Sqlite => Backend::Sqlite,
        }
    }
}

impl GlobalOpts {
    pub fn backend(&self) -> Backend {
        self.backend.into()
    }

    pub fn wants_json(&self) -> bool {
        self.json || self.pretty
    }
}
