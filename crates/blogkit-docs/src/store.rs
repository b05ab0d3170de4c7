//! SQLite store of fetched documents and their rendered HTML.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, named_params};
use serde::Serialize;
use serde_json::Value;

use crate::model::Document;

pub const NO_TITLE: &str = "++ NO TITLE ++";

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id integer primary key autoincrement,
    documentId varchar,
    json varchar,
    html varchar,
    title varchar,
    slug varchar,
    status varchar,
    when_published datetime
);
CREATE INDEX IF NOT EXISTS documents_document_id ON documents (documentId);
";

const COLUMNS: &str = "id, documentId, json, html, title, slug, status, when_published";

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("document '{document_id}' not found")]
    NotFound { document_id: String },
    #[error("document '{document_id}' has not been rendered")]
    NotRendered { document_id: String },
    #[error("invalid document id '{0}'")]
    InvalidId(String),
    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One row of the `documents` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocRecord {
    pub id: i64,
    pub document_id: String,
    pub json: String,
    pub html: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
    pub when_published: Option<String>,
}

impl DocRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            document_id: row.get(1)?,
            json: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            html: row.get(3)?,
            title: row.get(4)?,
            slug: row.get(5)?,
            status: row.get(6)?,
            when_published: row.get(7)?,
        })
    }

    pub fn document(&self) -> Result<Document, DocError> {
        Ok(Document::from_json(&self.json)?)
    }

    pub fn is_published(&self) -> bool {
        self.status.as_deref() == Some(STATUS_PUBLISHED)
    }
}

/// Listing entry without the document bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocSummary {
    pub document_id: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
    pub when_published: Option<String>,
    pub rendered: bool,
}

pub struct DocStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for DocStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStore").field("path", &self.path).finish()
    }
}

impl DocStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DocError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = ?path, "document store opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self, DocError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn cached(&self, document_id: &str) -> Result<bool, DocError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM documents WHERE documentId = :id",
            named_params! { ":id": document_id },
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn load(&self, document_id: &str) -> Result<DocRecord, DocError> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM documents WHERE documentId = :id"),
                named_params! { ":id": document_id },
                DocRecord::from_row,
            )
            .optional()?
            .ok_or_else(|| DocError::NotFound {
                document_id: document_id.to_string(),
            })
    }

    /// Look a document up by document id, falling back to its slug.
    pub fn load_by_key(&self, key: &str) -> Result<DocRecord, DocError> {
        match self.load(key) {
            Err(DocError::NotFound { .. }) => self
                .conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM documents WHERE slug = :slug ORDER BY id LIMIT 1"),
                    named_params! { ":slug": key },
                    DocRecord::from_row,
                )
                .optional()?
                .ok_or_else(|| DocError::NotFound {
                    document_id: key.to_string(),
                }),
            other => other,
        }
    }

    /// Store `document`, replacing any earlier copy. The record starts as an
    /// unrendered draft.
    pub fn save(&mut self, document_id: &str, document: &Value) -> Result<(), DocError> {
        let title = document
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(NO_TITLE);
        let json = serde_json::to_string(document)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM documents WHERE documentId = :id",
            named_params! { ":id": document_id },
        )?;
        tx.execute(
            "INSERT INTO documents (documentId, title, json, status)
             VALUES (:id, :title, :json, :status)",
            named_params! {
                ":id": document_id,
                ":title": title,
                ":json": json,
                ":status": STATUS_DRAFT,
            },
        )?;
        tx.commit()?;
        tracing::info!(document_id, title, "document saved");
        Ok(())
    }

    /// Store rendered HTML and derive the document's slug from `title`. A slug
    /// already taken by another document gets the document id appended.
    pub fn set_html(&self, document_id: &str, html: &str, title: &str) -> Result<(), DocError> {
        let slug = self.unique_slug(&slugify(title, document_id), document_id)?;
        let changed = self.conn.execute(
            "UPDATE documents SET html = :html, title = :title, slug = :slug WHERE documentId = :id",
            named_params! {
                ":html": html,
                ":title": title,
                ":slug": slug,
                ":id": document_id,
            },
        )?;
        self.require_row(changed, document_id)?;
        tracing::info!(document_id, slug = %slug, bytes = html.len(), "html stored");
        Ok(())
    }

    /// Mark a rendered document as published now.
    pub fn publish(&self, document_id: &str) -> Result<String, DocError> {
        let record = self.load(document_id)?;
        if record.html.is_none() {
            return Err(DocError::NotRendered {
                document_id: document_id.to_string(),
            });
        }
        let when = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "UPDATE documents SET status = :status, when_published = :when WHERE documentId = :id",
            named_params! {
                ":status": STATUS_PUBLISHED,
                ":when": when,
                ":id": document_id,
            },
        )?;
        tracing::info!(document_id, when = %when, "document published");
        Ok(when)
    }

    pub fn list(&self) -> Result<Vec<DocSummary>, DocError> {
        let mut stmt = self.conn.prepare(
            "SELECT documentId, title, slug, status, when_published, html IS NOT NULL
             FROM documents ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DocSummary {
                document_id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
                status: row.get(3)?,
                when_published: row.get(4)?,
                rendered: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn unique_slug(&self, base: &str, document_id: &str) -> Result<String, DocError> {
        let id_part = slugify(document_id, "doc");
        let mut candidate = base.to_string();
        let mut n = 1;
        while self.key_taken(&candidate, document_id)? {
            n += 1;
            candidate = if n == 2 {
                format!("{base}-{id_part}")
            } else {
                format!("{base}-{id_part}-{n}")
            };
        }
        Ok(candidate)
    }

    /// Whether `key` already addresses a document other than `document_id`.
    fn key_taken(&self, key: &str, document_id: &str) -> Result<bool, DocError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM documents
             WHERE (slug = :key OR documentId = :key) AND documentId != :id",
            named_params! { ":key": key, ":id": document_id },
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn require_row(&self, changed: usize, document_id: &str) -> Result<(), DocError> {
        if changed == 0 {
            return Err(DocError::NotFound {
                document_id: document_id.to_string(),
            });
        }
        Ok(())
    }
}

/// URL slug for a title: lowercase ASCII words joined by `-`. Titles without
/// any usable characters fall back to `fallback`.
pub fn slugify(title: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}
