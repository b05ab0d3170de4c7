//! `blogkit snippets`: work with marked source ranges.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use blogkit_docs::{DocStore, SnippetMarkers, extract_to_dir, reconcile, render_document, snippet_ranges};
use clap::{Args, Subcommand};
use serde_json::json;

use crate::opts::GlobalOpts;
use crate::output::print_success;

#[derive(Subcommand, Debug)]
pub enum SnippetsCommand {
    /// List the line ranges of each snippet in a file
    Ranges(FileArgs),
    /// Write each snippet of a file to its own file
    Extract(ExtractArgs),
    /// Replace snippet bodies in a source file with the code from a stored post
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Source file containing snippet markers
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Source file containing snippet markers
    pub file: PathBuf,

    /// Output directory
    #[arg(long, default_value = "extracted")]
    pub out: PathBuf,

    /// Extension for the written files
    #[arg(long, default_value = "py")]
    pub ext: String,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Source file containing snippet markers
    pub file: PathBuf,

    /// Stored document whose code listings replace the snippet bodies
    #[arg(long)]
    pub doc: String,

    /// Output path (default: `<file>_new`)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn cmd_snippets(opts: &GlobalOpts, cmd: &SnippetsCommand) -> Result<()> {
    match cmd {
        SnippetsCommand::Ranges(args) => cmd_ranges(opts, args),
        SnippetsCommand::Extract(args) => cmd_extract(opts, args),
        SnippetsCommand::Reconcile(args) => cmd_reconcile(opts, args),
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn cmd_ranges(opts: &GlobalOpts, args: &FileArgs) -> Result<()> {
    let lines = read_lines(&args.file)?;
    let ranges = snippet_ranges(&lines, &SnippetMarkers::default())
        .with_context(|| format!("scan {}", args.file.display()))?;
    let data: Vec<_> = ranges
        .iter()
        .map(|r| json!({ "start": r.start, "end": r.end }))
        .collect();
    print_success(opts, json!(data), vec![])
}

fn cmd_extract(opts: &GlobalOpts, args: &ExtractArgs) -> Result<()> {
    let lines = read_lines(&args.file)?;
    let written = extract_to_dir(&lines, &SnippetMarkers::default(), &args.out, &args.ext)
        .with_context(|| format!("extract snippets from {}", args.file.display()))?;
    let paths: Vec<_> = written.iter().map(|p| p.display().to_string()).collect();
    print_success(opts, json!(paths), vec![])
}

fn cmd_reconcile(opts: &GlobalOpts, args: &ReconcileArgs) -> Result<()> {
    let store = DocStore::open(&opts.docs_db)
        .with_context(|| format!("open document store {}", opts.docs_db.display()))?;
    let document = store.load_by_key(&args.doc)?.document()?;
    let post = render_document(&document).with_context(|| format!("render {}", args.doc))?;
    let bodies: Vec<Vec<String>> = post.snippets.into_iter().map(|s| s.lines).collect();

    let source = read_lines(&args.file)?;
    let merged = reconcile(&source, &bodies, &SnippetMarkers::default())
        .with_context(|| format!("reconcile {}", args.file.display()))?;

    let out = args.out.clone().unwrap_or_else(|| {
        let mut name = args.file.clone().into_os_string();
        name.push("_new");
        PathBuf::from(name)
    });
    let mut text = merged.join("\n");
    text.push('\n');
    fs::write(&out, &text).with_context(|| format!("write {}", out.display()))?;

    let mut warnings = Vec::new();
    if merged != source {
        warnings.push(format!(
            "{} differs from {}; the post's code has been edited",
            out.display(),
            args.file.display()
        ));
    }
    print_success(
        opts,
        json!({
            "path": out.display().to_string(),
            "snippets": bodies.len(),
            "changed": merged != source,
        }),
        warnings,
    )
}
