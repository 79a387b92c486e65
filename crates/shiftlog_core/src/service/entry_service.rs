//! Entry search & validation core.
//!
//! # Responsibility
//! - Translate raw search parameters (including time expressions) into
//!   store queries.
//! - Validate logbook/tag references against the registry before any
//!   entry is persisted.
//! - Attach uploaded blobs to an entry's catalog.
//!
//! # Invariants
//! - Reference validation happens strictly before any store mutation.
//! - Exactly one preprocessor runs per created entry.
//! - A reference to an inactive logbook/tag is valid; only unknown names
//!   are rejected.

use crate::markup::preprocessor_for;
use crate::model::attachment::AttachmentMeta;
use crate::model::entry::{Entry, EntryDraft, EntryId};
use crate::model::registry::NamedRecord;
use crate::repo::attachment_repo::{
    media_type_for, AttachmentRepository, SqliteAttachmentRepository,
};
use crate::repo::entry_repo::{
    EntryRepository, NewEntry, SearchParams, SqliteEntryRepository,
};
use crate::repo::registry_repo::{RegistryRepository, SqliteRegistryRepository};
use crate::repo::RepoError;
use crate::search::params::rewrite_time_bounds;
use crate::search::time::TimeParseError;
use chrono::Utc;
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for entry use-cases.
#[derive(Debug)]
pub enum EntryServiceError {
    /// A start/end search parameter could not be resolved.
    InvalidTimeExpression(TimeParseError),
    /// Entry references logbook names unknown to the registry.
    InvalidLogbookReference(Vec<String>),
    /// Entry references tag names unknown to the registry.
    InvalidTagReference(Vec<String>),
    /// Target entry does not exist.
    EntryNotFound(EntryId),
    /// Persistence-layer failure, including lost optimistic races
    /// (`RepoError::Conflict`), which callers should retry.
    Repo(RepoError),
}

impl Display for EntryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeExpression(err) => write!(f, "{err}"),
            Self::InvalidLogbookReference(names) => {
                write!(f, "one or more invalid logbook name(s): {}", names.join(", "))
            }
            Self::InvalidTagReference(names) => {
                write!(f, "one or more invalid tag name(s): {}", names.join(", "))
            }
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimeExpression(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EntryServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TimeParseError> for EntryServiceError {
    fn from(value: TimeParseError) -> Self {
        Self::InvalidTimeExpression(value)
    }
}

/// One uploaded file as received from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// The file's own name, used as the filename default.
    pub name: String,
    /// The file's content type, used as the description default.
    pub content_type: String,
    /// Blob bytes.
    pub bytes: Vec<u8>,
}

/// Entry search, validation and attachment orchestration.
pub struct EntryService<E, L, T, A>
where
    E: EntryRepository,
    L: RegistryRepository,
    T: RegistryRepository,
    A: AttachmentRepository,
{
    entries: E,
    logbooks: L,
    tags: T,
    attachments: A,
}

/// Concrete service type over one shared SQLite connection.
pub type SqliteEntryService<'conn> = EntryService<
    SqliteEntryRepository<'conn>,
    SqliteRegistryRepository<'conn>,
    SqliteRegistryRepository<'conn>,
    SqliteAttachmentRepository<'conn>,
>;

impl<'conn> SqliteEntryService<'conn> {
    /// Builds the service over one migrated connection.
    pub fn with_connection(conn: &'conn rusqlite::Connection) -> Self {
        Self::new(
            SqliteEntryRepository::new(conn),
            SqliteRegistryRepository::logbooks(conn),
            SqliteRegistryRepository::tags(conn),
            SqliteAttachmentRepository::new(conn),
        )
    }
}

impl<E, L, T, A> EntryService<E, L, T, A>
where
    E: EntryRepository,
    L: RegistryRepository,
    T: RegistryRepository,
    A: AttachmentRepository,
{
    /// Creates a service over the provided repository implementations.
    pub fn new(entries: E, logbooks: L, tags: T, attachments: A) -> Self {
        Self {
            entries,
            logbooks,
            tags,
            attachments,
        }
    }

    /// Finds entries matching the raw search parameters.
    ///
    /// Time-bound values (including relative expressions such as
    /// `2 days`) are canonicalized before the store sees them. Storage
    /// failures degrade to an empty result; bad time expressions are a
    /// client fault and surface as an error.
    pub fn find_entries(&self, params: &SearchParams) -> Result<Vec<Entry>, EntryServiceError> {
        let rewritten = rewrite_time_bounds(params, Utc::now())?;
        match self.entries.search_entries(&rewritten) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                error!("event=entry_search module=service status=degraded error={err}");
                Ok(Vec::new())
            }
        }
    }

    /// Gets one entry by id.
    pub fn get_entry(&self, id: EntryId) -> Result<Entry, EntryServiceError> {
        self.entries
            .get_entry(id)?
            .ok_or(EntryServiceError::EntryNotFound(id))
    }

    /// Validates and persists a new entry on behalf of `owner`.
    ///
    /// The owner comes from the caller's authenticated principal; this
    /// core trusts it as-is. Every referenced logbook/tag name must be
    /// known to the registry (active or inactive) or the call fails
    /// before anything is written.
    pub fn create_entry(
        &self,
        draft: EntryDraft,
        owner: &str,
    ) -> Result<Entry, EntryServiceError> {
        let known_logbooks = known_names(self.logbooks.list()?);
        let unknown = unknown_references(&draft.logbooks, &known_logbooks);
        if !unknown.is_empty() {
            return Err(EntryServiceError::InvalidLogbookReference(unknown));
        }

        if !draft.tags.is_empty() {
            let known_tags = known_names(self.tags.list()?);
            let unknown = unknown_references(&draft.tags, &known_tags);
            if !unknown.is_empty() {
                return Err(EntryServiceError::InvalidTagReference(unknown));
            }
        }

        let new_entry = NewEntry {
            owner: owner.to_string(),
            source: draft.source,
            description: None,
            markup: draft.markup,
            logbooks: draft.logbooks,
            tags: draft.tags,
        };
        let processed = preprocessor_for(new_entry.markup).process(new_entry);

        let created = self.entries.create_entry(&processed)?;
        info!(
            "event=entry_create module=service status=ok id={} owner={owner} markup={}",
            created.id,
            created.markup.as_str()
        );
        Ok(created)
    }

    /// Stores one uploaded blob and appends its record to the entry.
    ///
    /// `filename` defaults to the upload's own name and `description` to
    /// its content type when absent or blank. Concurrent uploads to the
    /// same entry can lose the optimistic race; the loser surfaces a
    /// conflict for the caller to retry.
    pub fn upload_attachment(
        &self,
        entry_id: EntryId,
        upload: &FileUpload,
        filename: Option<&str>,
        explicit_id: Option<&str>,
        description: Option<&str>,
    ) -> Result<Entry, EntryServiceError> {
        let mut entry = self.get_entry(entry_id)?;

        let filename = non_blank(filename).unwrap_or(upload.name.as_str());
        let description = non_blank(description).unwrap_or(upload.content_type.as_str());

        let meta = self
            .attachments
            .put(&upload.bytes, filename, description, explicit_id)?;
        entry.attachments.push(meta);

        let updated = self.entries.update_entry(&entry)?;
        info!(
            "event=attachment_upload module=service status=ok entry={entry_id} filename={filename}"
        );
        Ok(updated)
    }

    /// Uploads several files, then returns the entry fetched once more so
    /// the caller observes the fully merged attachment set.
    pub fn upload_attachments(
        &self,
        entry_id: EntryId,
        uploads: &[FileUpload],
    ) -> Result<Entry, EntryServiceError> {
        // Existence check up front so an empty batch still 404s properly.
        self.get_entry(entry_id)?;

        for upload in uploads {
            self.upload_attachment(entry_id, upload, None, None, None)?;
        }
        self.get_entry(entry_id)
    }

    /// Retrieves one attachment of an entry by filename.
    ///
    /// Exactly one catalog match returns the blob with a media type
    /// inferred from the filename. Zero or multiple matches are logged
    /// and yield `None`; ambiguity is tolerated silently at this layer.
    pub fn get_attachment(
        &self,
        entry_id: EntryId,
        filename: &str,
    ) -> Result<Option<(AttachmentMeta, Vec<u8>)>, EntryServiceError> {
        let entry = self.get_entry(entry_id)?;

        let matches: Vec<&AttachmentMeta> = entry
            .attachments
            .iter()
            .filter(|meta| meta.filename == filename)
            .collect();
        if matches.len() != 1 {
            warn!(
                "event=attachment_fetch module=service status=skipped entry={entry_id} filename={filename} matches={}",
                matches.len()
            );
            return Ok(None);
        }

        match self.attachments.get(&matches[0].id)? {
            Some((mut meta, bytes)) => {
                meta.content_type = media_type_for(filename);
                Ok(Some((meta, bytes)))
            }
            None => {
                warn!(
                    "event=attachment_fetch module=service status=skipped entry={entry_id} filename={filename} error_code=blob_missing"
                );
                Ok(None)
            }
        }
    }
}

fn known_names(records: Vec<NamedRecord>) -> BTreeSet<String> {
    records.into_iter().map(|record| record.name).collect()
}

fn unknown_references(referenced: &BTreeSet<String>, known: &BTreeSet<String>) -> Vec<String> {
    referenced
        .iter()
        .filter(|name| !known.contains(*name))
        .cloned()
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
