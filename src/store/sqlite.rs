//! SQLite-backed document store.
//!
//! One database file per configured store. Queries follow the context's
//! shape: sentinel queries return everything under the filters in
//! popularity order, text queries run an FTS5 relevance search, empty
//! queries fall back to a filter match or a bounded random sample.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use magpie_search::{LocalBatch, LocalSource, Origin, QueryContext, RawResult};
use rusqlite::Connection;

use super::schema::{apply_schema, read_schema_version};
use crate::error::{AppError, Result};
use crate::text;

/// How many documents an empty, unfiltered query samples.
const RANDOM_SAMPLE_SIZE: usize = 10;

/// Fields for inserting a document (seeding and tests).
pub struct NewDocument<'a> {
    pub title: Option<&'a str>,
    pub url: &'a str,
    pub description: Option<&'a str>,
    pub doc_type: Option<&'a str>,
    pub language: Option<&'a str>,
    pub likes: i64,
}

/// A single document store backed by one SQLite database file.
///
/// Thread-safe via an internal `Mutex<Connection>`. All statements are
/// short-lived point queries; WAL mode keeps concurrent readers cheap.
pub struct DocumentStore {
    name: String,
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl DocumentStore {
    /// Open (or create) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened.
    pub fn open(name: impl Into<String>, path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self {
            name: name.into(),
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Store name, used in logs and the admin listing.
    pub fn store_name(&self) -> &str {
        &self.name
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the schema version stamp.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let conn = self.lock()?;
        read_schema_version(&conn).map_err(AppError::from)
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM documents", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Insert a document, returning its rowid.
    pub fn insert_document(&self, doc: &NewDocument<'_>) -> Result<i64> {
        let conn = self.lock()?;
        let now = now_epoch_secs();
        conn.execute(
            "INSERT INTO documents (title, url, description, doc_type, language, likes, added_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                doc.title,
                doc.url,
                doc.description,
                doc.doc_type,
                doc.language,
                doc.likes,
                now
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Execute a query under the context's filters.
    ///
    /// Branches on the context shape:
    /// - sentinel → filter match, `likes` descending, no score
    /// - text search → FTS5 match with `-bm25` native score
    /// - type filter without text → unordered filter match, no score
    /// - otherwise → bounded random sample (language filter still applies)
    pub fn search(&self, ctx: &QueryContext) -> Result<LocalBatch> {
        if ctx.is_sentinel() {
            self.search_sentinel(ctx)
        } else if ctx.is_text_search() {
            self.search_text(ctx)
        } else if !ctx.type_filter.is_empty() {
            self.search_filtered(ctx)
        } else {
            self.search_sample(ctx)
        }
    }

    /// Distinct `doc_type` values across all documents, raw (before
    /// synonym consolidation).
    pub fn distinct_types(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT doc_type FROM documents \
             WHERE doc_type IS NOT NULL ORDER BY doc_type",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut types = Vec::new();
        for r in rows {
            types.push(r?);
        }
        Ok(types)
    }

    /// Case-insensitive title substring matches, for suggestions and
    /// autocompletion. Returns `(title, url)` pairs.
    pub fn title_matches(&self, term: &str, limit: usize) -> Result<Vec<(String, String)>> {
        let conn = self.lock()?;
        let pattern = format!("%{}%", escape_like(term));
        let mut stmt = conn.prepare(
            "SELECT title, url FROM documents \
             WHERE title IS NOT NULL AND title LIKE ?1 ESCAPE '\\' \
             ORDER BY likes DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![pattern, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut matches = Vec::new();
        for r in rows {
            matches.push(r?);
        }
        Ok(matches)
    }

    /// URLs of documents whose title equals `term` exactly. At most two
    /// rows are fetched; the caller only needs to know whether the match
    /// is unique.
    pub fn exact_title_urls(&self, term: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT url FROM documents WHERE title = ?1 LIMIT 2")?;
        let rows = stmt.query_map(rusqlite::params![term], |row| row.get::<_, String>(0))?;
        let mut urls = Vec::new();
        for r in rows {
            urls.push(r?);
        }
        Ok(urls)
    }

    // -----------------------------------------------------------------------
    // Query branches
    // -----------------------------------------------------------------------

    fn search_sentinel(&self, ctx: &QueryContext) -> Result<LocalBatch> {
        let conn = self.lock()?;
        let (clause, params) = filter_clause(ctx, "WHERE");
        let sql = format!(
            "SELECT title, url, description FROM documents {clause} ORDER BY likes DESC"
        );
        let records = Self::collect_unscored(&conn, &sql, &params)?;
        Ok(LocalBatch::new(records))
    }

    fn search_text(&self, ctx: &QueryContext) -> Result<LocalBatch> {
        let match_expr = fts_match_expression(&ctx.query);
        if match_expr.is_empty() {
            return Ok(LocalBatch::default());
        }

        let conn = self.lock()?;
        let (clause, filter_params) = filter_clause_prefixed(ctx, "AND", "d.");
        let sql = format!(
            "SELECT d.title, d.url, d.description, -bm25(documents_fts) AS score \
             FROM documents_fts JOIN documents d ON d.id = documents_fts.rowid \
             WHERE documents_fts MATCH ?1 {clause} ORDER BY score DESC"
        );

        let mut params: Vec<String> = vec![match_expr];
        params.extend(filter_params);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawResult {
                title: row.get(0)?,
                url: row.get(1)?,
                description: row.get(2)?,
                origin: Origin::Local,
                score: Some(row.get::<_, f64>(3)?),
            })
        })?;

        let mut records = Vec::new();
        for r in rows {
            records.push(r?);
        }
        Ok(LocalBatch::new(records))
    }

    fn search_filtered(&self, ctx: &QueryContext) -> Result<LocalBatch> {
        let conn = self.lock()?;
        let (clause, params) = filter_clause(ctx, "WHERE");
        let sql = format!("SELECT title, url, description FROM documents {clause}");
        let records = Self::collect_unscored(&conn, &sql, &params)?;
        Ok(LocalBatch::new(records))
    }

    fn search_sample(&self, ctx: &QueryContext) -> Result<LocalBatch> {
        let conn = self.lock()?;
        let (clause, params) = filter_clause(ctx, "WHERE");
        let sql = format!(
            "SELECT title, url, description FROM documents {clause} \
             ORDER BY RANDOM() LIMIT {RANDOM_SAMPLE_SIZE}"
        );
        // type_filter is empty on this branch, so the clause is the
        // language filter or nothing.
        let records = Self::collect_unscored(&conn, &sql, &params)?;
        Ok(LocalBatch::new(records))
    }

    fn collect_unscored(
        conn: &Connection,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<RawResult>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawResult {
                title: row.get(0)?,
                url: row.get(1)?,
                description: row.get(2)?,
                origin: Origin::Local,
                score: None,
            })
        })?;
        let mut records = Vec::new();
        for r in rows {
            records.push(r?);
        }
        Ok(records)
    }

    /// Acquire the connection mutex.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::Store(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl LocalSource for DocumentStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, ctx: &QueryContext) -> magpie_search::Result<LocalBatch> {
        self.search(ctx)
            .map_err(|e| magpie_search::SearchError::Source(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SQL helpers
// ---------------------------------------------------------------------------

/// Build the filter clause for `doc_type`/`language`, introduced by
/// `intro` (`WHERE` or `AND`). Returns the clause and its bind values.
fn filter_clause(ctx: &QueryContext, intro: &str) -> (String, Vec<String>) {
    filter_clause_prefixed(ctx, intro, "")
}

fn filter_clause_prefixed(
    ctx: &QueryContext,
    intro: &str,
    column_prefix: &str,
) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if !ctx.type_filter.is_empty() {
        let placeholders = vec!["?"; ctx.type_filter.len()].join(", ");
        conditions.push(format!("{column_prefix}doc_type IN ({placeholders})"));
        params.extend(ctx.type_filter.iter().cloned());
    }
    if let Some(lang) = &ctx.lang_filter {
        conditions.push(format!("{column_prefix}language = ?"));
        params.push(lang.clone());
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!("{intro} {}", conditions.join(" AND ")), params)
    }
}

/// Build an FTS5 MATCH expression: OR-joined quoted tokens, so any single
/// term can hit and FTS syntax characters in the input stay inert.
fn fts_match_expression(query: &str) -> String {
    text::tokenize(query)
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Escape `%`/`_`/`\` for a LIKE pattern with `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn now_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn test_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let store =
            DocumentStore::open("test", &dir.path().join("test.db")).expect("open DocumentStore");
        (dir, store)
    }

    fn seed(store: &DocumentStore, title: &str, url: &str, doc_type: &str, likes: i64) {
        store
            .insert_document(&NewDocument {
                title: Some(title),
                url,
                description: Some("seeded"),
                doc_type: Some(doc_type),
                language: Some("en-US"),
                likes,
            })
            .expect("insert");
    }

    fn ctx(raw: &str, processed: &str) -> QueryContext {
        QueryContext {
            raw_query: raw.to_owned(),
            query: processed.to_owned(),
            type_filter: Vec::new(),
            lang_filter: None,
            page: 1,
            per_page: 10,
        }
    }

    #[test]
    fn text_search_scores_and_orders_by_relevance() {
        let (_dir, store) = test_store();
        seed(&store, "Magpie behaviour", "https://a.com", "wiki", 0);
        seed(&store, "Magpie magpie magpie", "https://b.com", "wiki", 0);
        seed(&store, "Unrelated crow", "https://c.com", "wiki", 0);

        let batch = store.search(&ctx("magpie", "magpie")).expect("search");
        assert_eq!(batch.matched, 2);
        assert!(batch.records.iter().all(|r| r.score.is_some()));
        // The repeated-term document ranks first.
        assert_eq!(batch.records[0].url, "https://b.com");
    }

    #[test]
    fn text_search_matches_inflected_forms() {
        let (_dir, store) = test_store();
        seed(&store, "Running clusters", "https://a.com", "wiki", 0);

        // Preprocessing stems "running" to "run"; porter on the store side
        // stems the indexed title the same way.
        let batch = store.search(&ctx("running clusters", "run clusters")).expect("search");
        assert_eq!(batch.matched, 1);
    }

    #[test]
    fn text_search_or_joins_tokens() {
        let (_dir, store) = test_store();
        seed(&store, "Alpha", "https://a.com", "wiki", 0);
        seed(&store, "Beta", "https://b.com", "wiki", 0);

        let batch = store.search(&ctx("alpha beta", "alpha beta")).expect("search");
        assert_eq!(batch.matched, 2);
    }

    #[test]
    fn fts_syntax_characters_stay_inert() {
        let (_dir, store) = test_store();
        seed(&store, "C* algebra notes", "https://a.com", "wiki", 0);

        // Unquoted, `NOT` and `*` would be FTS5 operators.
        let batch = store.search(&ctx("NOT algebra*", "NOT algebra")).expect("search");
        assert_eq!(batch.matched, 1);
    }

    #[test]
    fn sentinel_orders_by_likes() {
        let (_dir, store) = test_store();
        seed(&store, "Low", "https://low.com", "wiki", 1);
        seed(&store, "High", "https://high.com", "wiki", 50);
        seed(&store, "Mid", "https://mid.com", "news", 10);

        let batch = store.search(&ctx("#all", "#all")).expect("search");
        let urls: Vec<_> = batch.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://high.com", "https://mid.com", "https://low.com"]);
        assert!(batch.records.iter().all(|r| r.score.is_none()));
    }

    #[test]
    fn sentinel_applies_type_filter() {
        let (_dir, store) = test_store();
        seed(&store, "Wiki page", "https://w.com", "wiki", 5);
        seed(&store, "News item", "https://n.com", "news", 9);

        let mut context = ctx("#all", "#all");
        context.type_filter = vec!["wiki".to_owned()];
        let batch = store.search(&context).expect("search");
        assert_eq!(batch.matched, 1);
        assert_eq!(batch.records[0].url, "https://w.com");
    }

    #[test]
    fn type_group_filter_matches_any_member() {
        let (_dir, store) = test_store();
        seed(&store, "One", "https://one.com", "wiki", 0);
        seed(&store, "Two", "https://two.com", "encyclopedia", 0);
        seed(&store, "Three", "https://three.com", "news", 0);

        let mut context = ctx("", "");
        context.type_filter = vec!["wiki".to_owned(), "encyclopedia".to_owned()];
        let batch = store.search(&context).expect("search");
        assert_eq!(batch.matched, 2);
        assert!(batch.records.iter().all(|r| r.score.is_none()));
    }

    #[test]
    fn empty_query_samples_at_most_ten() {
        let (_dir, store) = test_store();
        for i in 0..25 {
            seed(&store, &format!("Doc {i}"), &format!("https://d{i}.com"), "wiki", 0);
        }

        let batch = store.search(&ctx("", "")).expect("search");
        assert_eq!(batch.records.len(), 10);
        assert_eq!(batch.matched, 10);
    }

    #[test]
    fn language_filter_applies_to_sample() {
        let (_dir, store) = test_store();
        seed(&store, "English", "https://en.com", "wiki", 0);
        store
            .insert_document(&NewDocument {
                title: Some("Deutsch"),
                url: "https://de.com",
                description: None,
                doc_type: Some("wiki"),
                language: Some("de-DE"),
                likes: 0,
            })
            .expect("insert");

        let mut context = ctx("", "");
        context.lang_filter = Some("de-DE".to_owned());
        let batch = store.search(&context).expect("search");
        assert_eq!(batch.matched, 1);
        assert_eq!(batch.records[0].url, "https://de.com");
    }

    #[test]
    fn language_filter_intersects_text_search() {
        let (_dir, store) = test_store();
        seed(&store, "Magpie", "https://en.com", "wiki", 0);
        store
            .insert_document(&NewDocument {
                title: Some("Magpie"),
                url: "https://de.com",
                description: None,
                doc_type: Some("wiki"),
                language: Some("de-DE"),
                likes: 0,
            })
            .expect("insert");

        let mut context = ctx("magpie", "magpie");
        context.lang_filter = Some("en-US".to_owned());
        let batch = store.search(&context).expect("search");
        assert_eq!(batch.matched, 1);
        assert_eq!(batch.records[0].url, "https://en.com");
    }

    #[test]
    fn all_stopword_query_falls_back_to_sample() {
        let (_dir, store) = test_store();
        seed(&store, "Something", "https://s.com", "wiki", 0);

        // Raw text present but preprocessing removed everything.
        let batch = store.search(&ctx("the of", "")).expect("search");
        assert_eq!(batch.records.len(), 1);
        assert!(batch.records[0].score.is_none());
    }

    #[test]
    fn distinct_types_are_sorted_and_unique() {
        let (_dir, store) = test_store();
        seed(&store, "A", "https://a.com", "wiki", 0);
        seed(&store, "B", "https://b.com", "news", 0);
        seed(&store, "C", "https://c.com", "wiki", 0);

        let types = store.distinct_types().expect("types");
        assert_eq!(types, vec!["news", "wiki"]);
    }

    #[test]
    fn title_matches_are_case_insensitive_substrings() {
        let (_dir, store) = test_store();
        seed(&store, "Nextcloud Server", "https://nc.com", "wiki", 3);
        seed(&store, "OwnCloud", "https://oc.com", "wiki", 9);
        seed(&store, "Unrelated", "https://u.com", "wiki", 0);

        let matches = store.title_matches("cloud", 5).expect("matches");
        assert_eq!(matches.len(), 2);
        // Popularity order.
        assert_eq!(matches[0].0, "OwnCloud");
    }

    #[test]
    fn title_match_escapes_like_wildcards() {
        let (_dir, store) = test_store();
        seed(&store, "100% organic", "https://o.com", "wiki", 0);
        seed(&store, "100 degrees", "https://d.com", "wiki", 0);

        let matches = store.title_matches("100%", 5).expect("matches");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1, "https://o.com");
    }

    #[test]
    fn exact_title_urls_distinguishes_unique_matches() {
        let (_dir, store) = test_store();
        seed(&store, "Unique Title", "https://u.com", "wiki", 0);
        seed(&store, "Shared Title", "https://s1.com", "wiki", 0);
        seed(&store, "Shared Title", "https://s2.com", "wiki", 0);

        assert_eq!(store.exact_title_urls("Unique Title").expect("q"), vec!["https://u.com"]);
        assert_eq!(store.exact_title_urls("Shared Title").expect("q").len(), 2);
        assert!(store.exact_title_urls("Missing").expect("q").is_empty());
    }

    #[test]
    fn schema_version_is_stamped() {
        let (_dir, store) = test_store();
        assert_eq!(store.schema_version().expect("version"), Some(1));
    }

    #[test]
    fn reopen_preserves_documents() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("persist.db");
        {
            let store = DocumentStore::open("persist", &path).expect("open");
            seed(&store, "Kept", "https://kept.com", "wiki", 0);
        }
        let store = DocumentStore::open("persist", &path).expect("reopen");
        assert_eq!(store.document_count().expect("count"), 1);
    }
}
