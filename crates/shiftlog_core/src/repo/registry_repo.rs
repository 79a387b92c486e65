//! Logbook/tag registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lifecycle persistence for the two named-record collections.
//! - Keep collection-specific SQL behind one shared implementation.
//!
//! # Invariants
//! - `create` is read-after-write: the returned record is re-fetched from
//!   storage, not echoed back from the caller's input.
//! - `soft_delete` only flips `state`; rows are never removed.
//! - Deleting an already-inactive record succeeds (idempotent).

use crate::model::registry::{NamedRecord, State};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};

/// Identifies which named-record collection a repository operates on.
///
/// Both collections share one schema shape; only the table differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    table: &'static str,
    label: &'static str,
}

/// Logbook collection descriptor.
pub const LOGBOOKS: Collection = Collection {
    table: "logbooks",
    label: "logbook",
};

/// Tag collection descriptor.
pub const TAGS: Collection = Collection {
    table: "tags",
    label: "tag",
};

impl Collection {
    /// Human-readable collection name used in errors and logs.
    pub fn label(self) -> &'static str {
        self.label
    }
}

/// Repository interface for logbook/tag lifecycle operations.
pub trait RegistryRepository {
    /// Lists all records, active and inactive, in name order.
    fn list(&self) -> RepoResult<Vec<NamedRecord>>;
    /// Lists only records with `state = Active`.
    fn list_active(&self) -> RepoResult<Vec<NamedRecord>>;
    /// Finds one record by its natural key.
    fn find(&self, name: &str) -> RepoResult<Option<NamedRecord>>;
    /// Creates a record; fails with `Conflict` when the name exists.
    fn create(&self, record: &NamedRecord) -> RepoResult<NamedRecord>;
    /// Soft-deletes by name and returns the updated record.
    fn soft_delete(&self, name: &str) -> RepoResult<NamedRecord>;
    /// Collection this repository operates on.
    fn collection(&self) -> Collection;
}

/// SQLite-backed registry repository shared by logbooks and tags.
pub struct SqliteRegistryRepository<'conn> {
    conn: &'conn Connection,
    collection: Collection,
}

impl<'conn> SqliteRegistryRepository<'conn> {
    /// Repository over the logbook collection.
    pub fn logbooks(conn: &'conn Connection) -> Self {
        Self {
            conn,
            collection: LOGBOOKS,
        }
    }

    /// Repository over the tag collection.
    pub fn tags(conn: &'conn Connection) -> Self {
        Self {
            conn,
            collection: TAGS,
        }
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT name, owner, state, version FROM {}",
            self.collection.table
        )
    }

    fn query_records(&self, sql: &str) -> RepoResult<Vec<NamedRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row, self.collection)?);
        }
        Ok(records)
    }
}

impl RegistryRepository for SqliteRegistryRepository<'_> {
    fn list(&self) -> RepoResult<Vec<NamedRecord>> {
        self.query_records(&format!("{} ORDER BY name ASC;", self.select_sql()))
    }

    fn list_active(&self) -> RepoResult<Vec<NamedRecord>> {
        self.query_records(&format!(
            "{} WHERE state = 'active' ORDER BY name ASC;",
            self.select_sql()
        ))
    }

    fn find(&self, name: &str) -> RepoResult<Option<NamedRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE name = ?1;", self.select_sql()))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row, self.collection)?));
        }
        Ok(None)
    }

    fn create(&self, record: &NamedRecord) -> RepoResult<NamedRecord> {
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO {} (name, owner, state, version) VALUES (?1, ?2, ?3, 1);",
                self.collection.table
            ),
            params![
                record.name.as_str(),
                record.owner.as_str(),
                record.state.as_str(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_key_collision(&err) => {
                return Err(RepoError::Conflict {
                    collection: self.collection.label,
                    key: record.name.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        self.find(&record.name)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "{} `{}` missing after create",
                self.collection.label, record.name
            ))
        })
    }

    fn soft_delete(&self, name: &str) -> RepoResult<NamedRecord> {
        let current = self.find(name)?.ok_or_else(|| RepoError::NotFound {
            collection: self.collection.label,
            key: name.to_string(),
        })?;

        // Updating state to the value it already holds must not fail;
        // SQLite counts matched rows, so an inactive record still updates.
        let changed = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET state = ?1, version = version + 1
                 WHERE name = ?2 AND version = ?3;",
                self.collection.table
            ),
            params![State::Inactive.as_str(), name, current.version],
        )?;

        if changed == 0 {
            return Err(RepoError::Conflict {
                collection: self.collection.label,
                key: name.to_string(),
            });
        }

        self.find(name)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "{} `{name}` missing after soft delete",
                self.collection.label
            ))
        })
    }

    fn collection(&self) -> Collection {
        self.collection
    }
}

fn parse_record_row(row: &Row<'_>, collection: Collection) -> RepoResult<NamedRecord> {
    let state_text: String = row.get("state")?;
    let state = State::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid state `{state_text}` in {}.state",
            collection.table
        ))
    })?;

    Ok(NamedRecord {
        name: row.get("name")?,
        owner: row.get("owner")?,
        state,
        version: row.get("version")?,
    })
}

fn is_key_collision(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
    )
}
