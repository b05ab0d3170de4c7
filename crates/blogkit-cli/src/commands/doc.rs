//! `blogkit doc` commands.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use blogkit_docs::{
    DocStore, DocsClient, DocsConfig, JsonCache, Outline, render_document, write_snippets,
};
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use crate::opts::GlobalOpts;
use crate::output::{print_success, print_text_or_json};

#[derive(Subcommand, Debug)]
pub enum DocCommand {
    /// Fetch a document from the Docs API and store it
    Pull(PullArgs),
    /// Store a document from a local JSON file
    Import(ImportArgs),
    /// Render a stored document to HTML and keep the result
    Render(RenderArgs),
    /// Print a stored document's raw JSON
    Json(IdArgs),
    /// Print a stored document's text grouped by style
    Outline(IdArgs),
    /// List stored documents
    List,
    /// Mark a rendered document as published
    Publish(IdArgs),
    /// Print the URL a document is served at
    Url(UrlArgs),
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Document id (or slug, once rendered)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Document id
    pub id: String,

    /// Also keep the raw JSON in this cache directory
    #[arg(long, env = "BLOGKIT_DOCS_CACHE")]
    pub cache: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Document id to store under
    pub id: String,

    /// JSON file as returned by `documents.get`
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Document id (or slug)
    pub id: String,

    /// Also write the HTML to this file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write the post's code listings to this directory
    #[arg(long)]
    pub snippets: Option<PathBuf>,

    /// Extension for written code listings
    #[arg(long, default_value = "py")]
    pub ext: String,
}

#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Document id (or slug)
    pub id: String,

    /// Server base URL
    #[arg(long, env = "BLOGKIT_BASE_URL", default_value = "http://localhost:5000")]
    pub base: String,
}

pub async fn cmd_doc(opts: &GlobalOpts, cmd: &DocCommand) -> Result<()> {
    match cmd {
        DocCommand::Pull(args) => cmd_pull(opts, args).await,
        DocCommand::Import(args) => cmd_import(opts, args),
        DocCommand::Render(args) => cmd_render(opts, args),
        DocCommand::Json(args) => cmd_json(opts, args),
        DocCommand::Outline(args) => cmd_outline(opts, args),
        DocCommand::List => cmd_list(opts),
        DocCommand::Publish(args) => cmd_publish(opts, args),
        DocCommand::Url(args) => cmd_url(opts, args),
    }
}

fn open_store(opts: &GlobalOpts) -> Result<DocStore> {
    DocStore::open(&opts.docs_db)
        .with_context(|| format!("open document store {}", opts.docs_db.display()))
}

async fn cmd_pull(opts: &GlobalOpts, args: &PullArgs) -> Result<()> {
    let client = DocsClient::new(DocsConfig::from_env()).context("configure docs client")?;
    let document = client
        .fetch(&args.id)
        .await
        .with_context(|| format!("fetch document {}", args.id))?;
    let mut warnings = Vec::new();
    if let Some(dir) = &args.cache {
        let path = JsonCache::new(dir).save(&args.id, &document)?;
        warnings.push(format!("cached raw JSON at {}", path.display()));
    }
    save_document(opts, &args.id, &document, warnings)
}

fn cmd_import(opts: &GlobalOpts, args: &ImportArgs) -> Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let document: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse {}", args.file.display()))?;
    save_document(opts, &args.id, &document, vec![])
}

fn save_document(
    opts: &GlobalOpts,
    id: &str,
    document: &Value,
    warnings: Vec<String>,
) -> Result<()> {
    let mut store = open_store(opts)?;
    store.save(id, document)?;
    let record = store.load(id)?;
    print_success(
        opts,
        json!({ "document_id": id, "title": record.title }),
        warnings,
    )
}

fn cmd_render(opts: &GlobalOpts, args: &RenderArgs) -> Result<()> {
    let store = open_store(opts)?;
    let record = store.load_by_key(&args.id)?;
    let document = record.document()?;
    let post = render_document(&document)
        .with_context(|| format!("render document {}", record.document_id))?;
    store.set_html(&record.document_id, &post.html, &post.title)?;

    if let Some(out) = &args.out {
        fs::write(out, &post.html).with_context(|| format!("write {}", out.display()))?;
    }
    let written = match &args.snippets {
        Some(dir) => write_snippets(&post.snippets, dir, &args.ext)
            .with_context(|| format!("write snippets to {}", dir.display()))?,
        None => Vec::new(),
    };

    let slug = store.load(&record.document_id)?.slug;
    print_success(
        opts,
        json!({
            "document_id": record.document_id,
            "title": post.title,
            "slug": slug,
            "series": post.series,
            "snippets": post.snippets.len(),
            "fonts": post.fonts,
            "written": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        }),
        vec![],
    )
}

fn cmd_json(opts: &GlobalOpts, args: &IdArgs) -> Result<()> {
    let record = open_store(opts)?.load_by_key(&args.id)?;
    let value: Value = serde_json::from_str(&record.json).context("stored document json")?;
    let mut text = record.json;
    text.push('\n');
    print_text_or_json(opts, text, value)
}

fn cmd_outline(opts: &GlobalOpts, args: &IdArgs) -> Result<()> {
    let record = open_store(opts)?.load_by_key(&args.id)?;
    let value: Value = serde_json::from_str(&record.json).context("stored document json")?;
    let outline = Outline::parse(&value);
    let groups = outline.style_groups();

    let mut text = String::new();
    if let Some(title) = &outline.title {
        text.push_str(&format!("Title: {title}\n"));
    }
    for group in &groups {
        let style = serde_json::to_string(&group.text_style)?;
        text.push_str(&format!("\n:::::::: Style: {style} ::::::::\n{}", group.text));
    }
    text.push('\n');
    print_text_or_json(
        opts,
        text,
        json!({
            "title": outline.title,
            "document_id": outline.document_id,
            "groups": groups,
        }),
    )
}

fn cmd_list(opts: &GlobalOpts) -> Result<()> {
    let docs = open_store(opts)?.list()?;
    print_success(opts, serde_json::to_value(docs)?, vec![])
}

fn cmd_publish(opts: &GlobalOpts, args: &IdArgs) -> Result<()> {
    let store = open_store(opts)?;
    let record = store.load_by_key(&args.id)?;
    let when = store.publish(&record.document_id)?;
    print_success(
        opts,
        json!({ "document_id": record.document_id, "when_published": when }),
        vec![],
    )
}

fn cmd_url(opts: &GlobalOpts, args: &UrlArgs) -> Result<()> {
    let url = format!("{}/blog/{}", args.base.trim_end_matches('/'), args.id);
    print_success(opts, Value::String(url), vec![])
}
