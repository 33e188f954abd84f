//! SQLite DDL for document store databases.
//!
//! All `CREATE TABLE` / `CREATE TRIGGER` statements live here so they are
//! reviewable and testable in isolation.

use rusqlite::Connection;

/// Current schema version stamped into fresh databases.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL for one document store database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent. The
/// FTS index is an external-content table over `documents`, kept in sync
/// by triggers; both sides tokenize with `porter unicode61` so query terms
/// and indexed text stem identically.
const SCHEMA_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- Schema version tracking.
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Stored documents. `likes` is the popularity field used for sentinel
-- ordering; `added_at` is epoch seconds.
CREATE TABLE IF NOT EXISTS documents (
    id          INTEGER PRIMARY KEY,
    title       TEXT,
    url         TEXT NOT NULL,
    description TEXT,
    doc_type    TEXT,
    language    TEXT,
    likes       INTEGER NOT NULL DEFAULT 0,
    added_at    INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_documents_doc_type ON documents(doc_type);
CREATE INDEX IF NOT EXISTS idx_documents_language ON documents(language);
CREATE INDEX IF NOT EXISTS idx_documents_likes    ON documents(likes);

-- Full-text index over title/url/description.
CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    title,
    url,
    description,
    content = 'documents',
    content_rowid = 'id',
    tokenize = 'porter unicode61'
);

-- Keep the FTS index in sync with the content table.
CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
    INSERT INTO documents_fts(rowid, title, url, description)
    VALUES (new.id, new.title, new.url, new.description);
END;

CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, title, url, description)
    VALUES ('delete', old.id, old.title, old.url, old.description);
END;

CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
    INSERT INTO documents_fts(documents_fts, rowid, title, url, description)
    VALUES ('delete', old.id, old.title, old.url, old.description);
    INSERT INTO documents_fts(rowid, title, url, description)
    VALUES (new.id, new.title, new.url, new.description);
END;
"#;

/// Apply the full schema to an open connection.
///
/// Safe to call multiple times. Inserts the current schema version into
/// `schema_meta` if not already present.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Seed schema version if this is a fresh database.
    let version_str = CURRENT_SCHEMA_VERSION.to_string();
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![version_str],
    )?;

    Ok(())
}

/// Read the current schema version from the database.
///
/// Returns `None` if the `schema_meta` table is empty or the key is missing.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
