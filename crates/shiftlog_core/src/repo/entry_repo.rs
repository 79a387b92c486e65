//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide entry persistence with store-assigned identity and
//!   optimistic versioning.
//! - Translate field-predicate search parameters into indexed queries.
//!
//! # Invariants
//! - `id`, `owner` and `created_at` are never rewritten by updates.
//! - The search path only accepts canonical millisecond timestamps for
//!   time bounds; relative expressions are rewritten upstream.
//! - Reference link rows are replaced atomically with the entry row.

use crate::model::attachment::AttachmentMeta;
use crate::model::entry::{Entry, EntryId, Markup};
use crate::repo::{RepoError, RepoResult};
use crate::search::time::parse_canonical;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    owner,
    source,
    description,
    markup,
    created_at,
    version
FROM entries";

const SEARCH_DEFAULT_LIMIT: u32 = 100;
const SEARCH_LIMIT_MAX: u32 = 500;

/// Search parameter multimap as received from the query boundary.
///
/// Keys are matched case-insensitively; unknown keys are ignored.
pub type SearchParams = BTreeMap<String, Vec<String>>;

/// Entry payload ready for persistence, before identity assignment.
///
/// Produced by the service layer after reference validation and body
/// preprocessing have both succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub owner: String,
    pub source: String,
    pub description: Option<String>,
    pub markup: Markup,
    pub logbooks: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

/// Repository interface for entry CRUD and search operations.
pub trait EntryRepository {
    /// Persists a new entry, assigning id/created_at/version, and returns
    /// the stored representation (read-after-write).
    fn create_entry(&self, new_entry: &NewEntry) -> RepoResult<Entry>;
    /// Gets one entry with its reference and attachment catalogs.
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>>;
    /// Optimistic update: the entry's `version` must match storage or the
    /// call fails with `Conflict`.
    fn update_entry(&self, entry: &Entry) -> RepoResult<Entry>;
    /// Runs a field-predicate search, newest first.
    fn search_entries(&self, params: &SearchParams) -> RepoResult<Vec<Entry>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&self, new_entry: &NewEntry) -> RepoResult<Entry> {
        let id = Uuid::new_v4();
        let created_at = Utc::now().timestamp_millis();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO entries (id, owner, source, description, markup, created_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1);",
            params![
                id.to_string(),
                new_entry.owner.as_str(),
                new_entry.source.as_str(),
                new_entry.description.as_deref(),
                new_entry.markup.as_str(),
                created_at,
            ],
        )?;
        insert_reference_links(&tx, &id.to_string(), &new_entry.logbooks, &new_entry.tags)?;
        tx.commit()?;

        self.get_entry(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("entry `{id}` missing after create")))
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        let id_text = id.to_string();
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id_text.as_str()])?;
        if let Some(row) = rows.next()? {
            let entry = parse_entry_row(self.conn, row)?;
            return Ok(Some(entry));
        }
        Ok(None)
    }

    fn update_entry(&self, entry: &Entry) -> RepoResult<Entry> {
        let id_text = entry.id.to_string();

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE entries
             SET source = ?1, description = ?2, markup = ?3, version = version + 1
             WHERE id = ?4 AND version = ?5;",
            params![
                entry.source.as_str(),
                entry.description.as_deref(),
                entry.markup.as_str(),
                id_text.as_str(),
                entry.version,
            ],
        )?;

        if changed == 0 {
            return if entry_exists(&tx, &id_text)? {
                Err(RepoError::Conflict {
                    collection: "entry",
                    key: id_text,
                })
            } else {
                Err(RepoError::NotFound {
                    collection: "entry",
                    key: id_text,
                })
            };
        }

        tx.execute(
            "DELETE FROM entry_logbooks WHERE entry_id = ?1;",
            [id_text.as_str()],
        )?;
        tx.execute(
            "DELETE FROM entry_tags WHERE entry_id = ?1;",
            [id_text.as_str()],
        )?;
        tx.execute(
            "DELETE FROM entry_attachments WHERE entry_id = ?1;",
            [id_text.as_str()],
        )?;
        insert_reference_links(&tx, &id_text, &entry.logbooks, &entry.tags)?;
        for meta in &entry.attachments {
            tx.execute(
                "INSERT INTO entry_attachments (entry_id, attachment_id) VALUES (?1, ?2);",
                params![id_text.as_str(), meta.id.as_str()],
            )?;
        }
        tx.commit()?;

        self.get_entry(entry.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("entry `{}` missing after update", entry.id))
        })
    }

    fn search_entries(&self, params: &SearchParams) -> RepoResult<Vec<Entry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        let mut limit = SEARCH_DEFAULT_LIMIT;

        for (key, values) in params {
            if values.is_empty() {
                continue;
            }
            match key.to_ascii_lowercase().as_str() {
                "owner" => {
                    sql.push_str(&format!(
                        " AND owner IN ({})",
                        placeholders(values.len())
                    ));
                    bind_values.extend(values.iter().cloned().map(Value::Text));
                }
                "logbook" | "logbooks" => {
                    sql.push_str(&format!(
                        " AND EXISTS (
                            SELECT 1 FROM entry_logbooks el
                            WHERE el.entry_id = entries.id
                              AND el.logbook_name IN ({})
                        )",
                        placeholders(values.len())
                    ));
                    bind_values.extend(values.iter().cloned().map(Value::Text));
                }
                "tag" | "tags" => {
                    sql.push_str(&format!(
                        " AND EXISTS (
                            SELECT 1 FROM entry_tags et
                            WHERE et.entry_id = entries.id
                              AND et.tag_name IN ({})
                        )",
                        placeholders(values.len())
                    ));
                    bind_values.extend(values.iter().cloned().map(Value::Text));
                }
                "text" | "search" => {
                    if let Some(match_expr) = build_match_expression(values) {
                        sql.push_str(
                            " AND entries.rowid IN (
                                SELECT rowid FROM entries_fts WHERE entries_fts MATCH ?
                            )",
                        );
                        bind_values.push(Value::Text(match_expr));
                    }
                }
                "start" => {
                    let bound = parse_time_bound(key, &values[0])?;
                    sql.push_str(" AND created_at >= ?");
                    bind_values.push(Value::Integer(bound));
                }
                "end" => {
                    let bound = parse_time_bound(key, &values[0])?;
                    sql.push_str(" AND created_at <= ?");
                    bind_values.push(Value::Integer(bound));
                }
                "limit" | "size" => {
                    limit = normalize_search_limit(values[0].parse().ok());
                }
                // Unknown keys are not this layer's contract; skip them.
                _ => {}
            }
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(self.conn, row)?);
        }
        Ok(entries)
    }
}

/// Normalizes the search limit: default 100, capped at 500.
pub fn normalize_search_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => SEARCH_DEFAULT_LIMIT,
        Some(value) if value > SEARCH_LIMIT_MAX => SEARCH_LIMIT_MAX,
        Some(value) => value,
    }
}

fn placeholders(count: usize) -> String {
    let mut out = String::from("?");
    for _ in 1..count {
        out.push_str(", ?");
    }
    out
}

fn parse_time_bound(key: &str, value: &str) -> RepoResult<i64> {
    parse_canonical(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "non-canonical time bound `{value}` for search key `{key}`"
        ))
    })
}

fn build_match_expression(values: &[String]) -> Option<String> {
    let terms = values
        .iter()
        .flat_map(|value| value.split_whitespace())
        .filter(|term| !term.is_empty())
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn insert_reference_links(
    tx: &Transaction<'_>,
    entry_id: &str,
    logbooks: &BTreeSet<String>,
    tags: &BTreeSet<String>,
) -> RepoResult<()> {
    for name in logbooks {
        tx.execute(
            "INSERT INTO entry_logbooks (entry_id, logbook_name) VALUES (?1, ?2);",
            params![entry_id, name.as_str()],
        )?;
    }
    for name in tags {
        tx.execute(
            "INSERT INTO entry_tags (entry_id, tag_name) VALUES (?1, ?2);",
            params![entry_id, name.as_str()],
        )?;
    }
    Ok(())
}

fn entry_exists(tx: &Transaction<'_>, entry_id: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM entries WHERE id = ?1);",
        [entry_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_entry_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Entry> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in entries.id")))?;

    let markup_text: String = row.get("markup")?;
    let markup = Markup::parse(&markup_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid markup `{markup_text}` in entries.markup"))
    })?;

    let logbooks = load_reference_names(
        conn,
        "SELECT logbook_name FROM entry_logbooks WHERE entry_id = ?1;",
        &id_text,
    )?;
    let tags = load_reference_names(
        conn,
        "SELECT tag_name FROM entry_tags WHERE entry_id = ?1;",
        &id_text,
    )?;
    let attachments = load_attachment_catalog(conn, &id_text)?;

    Ok(Entry {
        id,
        owner: row.get("owner")?,
        created_at: row.get("created_at")?,
        source: row.get("source")?,
        description: row.get("description")?,
        markup,
        logbooks,
        tags,
        attachments,
        version: row.get("version")?,
    })
}

fn load_reference_names(
    conn: &Connection,
    sql: &str,
    entry_id: &str,
) -> RepoResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([entry_id])?;
    let mut names = BTreeSet::new();
    while let Some(row) = rows.next()? {
        names.insert(row.get::<_, String>(0)?);
    }
    Ok(names)
}

fn load_attachment_catalog(conn: &Connection, entry_id: &str) -> RepoResult<Vec<AttachmentMeta>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.filename, a.content_type
         FROM entry_attachments ea
         INNER JOIN attachments a ON a.id = ea.attachment_id
         WHERE ea.entry_id = ?1
         ORDER BY ea.rowid ASC;",
    )?;
    let mut rows = stmt.query([entry_id])?;
    let mut catalog = Vec::new();
    while let Some(row) = rows.next()? {
        catalog.push(AttachmentMeta {
            id: row.get(0)?,
            filename: row.get(1)?,
            content_type: row.get(2)?,
        });
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::{build_match_expression, normalize_search_limit, placeholders};

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(normalize_search_limit(None), 100);
        assert_eq!(normalize_search_limit(Some(0)), 100);
        assert_eq!(normalize_search_limit(Some(25)), 25);
        assert_eq!(normalize_search_limit(Some(9999)), 500);
    }

    #[test]
    fn placeholders_match_value_count() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn match_expression_quotes_and_joins_terms() {
        let expr =
            build_match_expression(&["beam dump".to_string(), "rf".to_string()]).unwrap();
        assert_eq!(expr, "\"beam\" AND \"dump\" AND \"rf\"");
    }

    #[test]
    fn match_expression_empty_for_blank_values() {
        assert!(build_match_expression(&["   ".to_string()]).is_none());
    }
}
