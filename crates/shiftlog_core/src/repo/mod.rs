//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-collection data access contracts over the entity store.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes use optimistic version checks; a lost race surfaces as
//!   `RepoError::Conflict`, never a silent overwrite.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attachment_repo;
pub mod entry_repo;
pub mod registry_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// The addressed document does not exist in its collection.
    NotFound {
        collection: &'static str,
        key: String,
    },
    /// Create collided with an existing key, or an optimistic update
    /// targeted a stale version.
    Conflict {
        collection: &'static str,
        key: String,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, key } => {
                write!(f, "{collection} document not found: {key}")
            }
            Self::Conflict { collection, key } => {
                write!(f, "{collection} document conflict: {key}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
