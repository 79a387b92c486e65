//! Log entry domain model.
//!
//! # Responsibility
//! - Define the canonical entry record and its markup discriminator.
//! - Provide the draft shape clients submit before storage assigns
//!   identity and timestamps.
//!
//! # Invariants
//! - `id` is store-assigned on create and never changes afterwards.
//! - Logbook/tag references are validated against the registry before an
//!   entry is persisted; a persisted entry never carries unknown names.

use crate::model::attachment::AttachmentMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for a persisted entry.
pub type EntryId = Uuid;

/// Markup discriminator selecting the body preprocessor.
///
/// Unknown or missing discriminators fall back to `None`; the decision is
/// made once at the request boundary, not at persist time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Markup {
    /// Body is stored as-is.
    #[default]
    None,
    /// Body is rendered from CommonMark before persistence.
    Commonmark,
}

impl Markup {
    /// Stable string id used in storage and request parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Commonmark => "commonmark",
        }
    }

    /// Resolves a request discriminator, defaulting unknown values.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("commonmark") => Self::Commonmark,
            _ => Self::None,
        }
    }

    /// Parses the storage representation back into a markup value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "commonmark" => Some(Self::Commonmark),
            _ => None,
        }
    }
}

/// Client-submitted entry payload before storage assigns identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Raw body text as submitted.
    pub source: String,
    /// Markup discriminator for body preprocessing.
    #[serde(default)]
    pub markup: Markup,
    /// Referenced logbook names. Validated against the registry.
    #[serde(default)]
    pub logbooks: BTreeSet<String>,
    /// Referenced tag names. Validated against the registry.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl EntryDraft {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Persisted log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned stable id.
    pub id: EntryId,
    /// Authenticated principal that created the entry.
    pub owner: String,
    /// Creation instant in epoch milliseconds (UTC).
    pub created_at: i64,
    /// Raw body text as submitted.
    pub source: String,
    /// Preprocessor output. `None` until a preprocessor has run.
    pub description: Option<String>,
    /// Markup discriminator the entry was created with.
    pub markup: Markup,
    /// Referenced logbook names.
    pub logbooks: BTreeSet<String>,
    /// Referenced tag names.
    pub tags: BTreeSet<String>,
    /// Catalog records for uploaded blobs, ordered by upload time.
    pub attachments: Vec<AttachmentMeta>,
    /// Optimistic concurrency token maintained by storage.
    pub version: i64,
}
