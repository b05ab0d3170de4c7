mod commands;
mod opts;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::bill::BillCommand;
use commands::doc::DocCommand;
use commands::fixtures::FixturesCommand;
use commands::serve::ServeArgs;
use commands::snippets::SnippetsCommand;
use opts::GlobalOpts;

#[derive(Parser, Debug)]
#[command(name = "blogkit", version, about = "Billing examples and blog tooling")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bill pricing and reports
    #[command(subcommand)]
    Bill(BillCommand),

    /// Generate bill stores from fixture descriptions
    #[command(subcommand)]
    Fixtures(FixturesCommand),

    /// Docs fetching and rendering
    #[command(subcommand)]
    Doc(DocCommand),

    /// Work with snippet markers in source files
    #[command(subcommand)]
    Snippets(SnippetsCommand),

    /// Serve rendered posts over HTTP
    Serve(ServeArgs),
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    setup_logging();

    let cli = Cli::parse();
    let opts = &cli.opts;

    match &cli.command {
        Command::Bill(cmd) => commands::bill::cmd_bill(opts, cmd),
        Command::Fixtures(cmd) => commands::fixtures::cmd_fixtures(opts, cmd),
        Command::Doc(cmd) => commands::doc::cmd_doc(opts, cmd).await,
        Command::Snippets(cmd) => commands::snippets::cmd_snippets(opts, cmd),
        Command::Serve(args) => commands::serve::cmd_serve(opts, args).await,
    }
}
