//! Logbook/tag lifecycle service.
//!
//! # Responsibility
//! - Provide create/list/find/soft-delete entry points per collection.
//! - Enforce the degrade-to-empty policy for read-only listings.
//!
//! # Invariants
//! - Listing operations never propagate storage failures; they log and
//!   return empty results.
//! - Soft delete is idempotent: deleting an inactive record succeeds.

use crate::model::registry::NamedRecord;
use crate::repo::registry_repo::RegistryRepository;
use crate::repo::RepoError;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for registry lifecycle use-cases.
#[derive(Debug)]
pub enum RegistryServiceError {
    /// Submitted name is blank.
    InvalidName(String),
    /// Target record does not exist.
    NotFound(String),
    /// Persistence-layer failure, including key collisions and lost
    /// optimistic races.
    Repo(RepoError),
}

impl Display for RegistryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "invalid name: `{value}`"),
            Self::NotFound(name) => write!(f, "record not found: {name}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { key, .. } => Self::NotFound(key),
            other => Self::Repo(other),
        }
    }
}

/// Lifecycle facade over one registry collection.
pub struct RegistryService<R: RegistryRepository> {
    repo: R,
}

impl<R: RegistryRepository> RegistryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all records, active and inactive.
    ///
    /// Storage failures degrade to an empty list; a broken store must not
    /// crash a read-only listing.
    pub fn list(&self) -> Vec<NamedRecord> {
        match self.repo.list() {
            Ok(records) => records,
            Err(err) => {
                error!(
                    "event=registry_list module=service status=degraded collection={} error={err}",
                    self.repo.collection().label()
                );
                Vec::new()
            }
        }
    }

    /// Lists only active records, same degrade policy as [`Self::list`].
    pub fn list_active(&self) -> Vec<NamedRecord> {
        match self.repo.list_active() {
            Ok(records) => records,
            Err(err) => {
                error!(
                    "event=registry_list_active module=service status=degraded collection={} error={err}",
                    self.repo.collection().label()
                );
                Vec::new()
            }
        }
    }

    /// Finds one record by name.
    pub fn find(&self, name: &str) -> Result<Option<NamedRecord>, RegistryServiceError> {
        Ok(self.repo.find(name)?)
    }

    /// Creates an active record and returns the stored representation.
    pub fn create(
        &self,
        name: &str,
        owner: &str,
    ) -> Result<NamedRecord, RegistryServiceError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RegistryServiceError::InvalidName(name.to_string()));
        }

        let created = self.repo.create(&NamedRecord::new(trimmed, owner))?;
        info!(
            "event=registry_create module=service status=ok collection={} name={}",
            self.repo.collection().label(),
            created.name
        );
        Ok(created)
    }

    /// Soft-deletes a record by name and returns the updated row.
    ///
    /// Missing names are logged and surfaced as `NotFound`; deleting an
    /// already-inactive record is a no-op success.
    pub fn soft_delete(&self, name: &str) -> Result<NamedRecord, RegistryServiceError> {
        match self.repo.soft_delete(name) {
            Ok(record) => {
                info!(
                    "event=registry_soft_delete module=service status=ok collection={} name={name}",
                    self.repo.collection().label()
                );
                Ok(record)
            }
            Err(RepoError::NotFound { key, .. }) => {
                error!(
                    "event=registry_soft_delete module=service status=error collection={} name={key} error_code=not_found",
                    self.repo.collection().label()
                );
                Err(RegistryServiceError::NotFound(key))
            }
            Err(other) => Err(other.into()),
        }
    }
}
