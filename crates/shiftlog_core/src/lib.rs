//! Core domain logic for ShiftLog, an electronic logbook service.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod markup;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use markup::{preprocessor_for, CommonmarkPreprocessor, DefaultPreprocessor, Preprocessor};
pub use model::attachment::AttachmentMeta;
pub use model::entry::{Entry, EntryDraft, EntryId, Markup};
pub use model::registry::{NamedRecord, State};
pub use repo::attachment_repo::{
    media_type_for, AttachmentRepository, SqliteAttachmentRepository,
};
pub use repo::entry_repo::{
    EntryRepository, NewEntry, SearchParams, SqliteEntryRepository,
};
pub use repo::registry_repo::{RegistryRepository, SqliteRegistryRepository};
pub use repo::{RepoError, RepoResult};
pub use search::params::rewrite_time_bounds;
pub use search::time::{
    format_canonical, parse_canonical, resolve, TimeParseError, CANONICAL_FORMAT,
};
pub use service::entry_service::{
    EntryService, EntryServiceError, FileUpload, SqliteEntryService,
};
pub use service::registry_service::{RegistryService, RegistryServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
