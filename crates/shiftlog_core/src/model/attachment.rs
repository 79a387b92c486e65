//! Attachment catalog metadata.
//!
//! # Responsibility
//! - Define the metadata record an entry carries for each uploaded blob.
//! - Keep blob bytes out of the domain model; they live in the attachment
//!   store and are reached through `id`.
//!
//! # Invariants
//! - Attachment records are never mutated after creation.
//! - An attachment belongs to exactly one entry.

use serde::{Deserialize, Serialize};

/// Catalog entry for one uploaded blob.
///
/// The entry's attachment set holds these copies; the bytes themselves are
/// stored separately and fetched by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    /// Blob store key. Content-neutral, not derived from the bytes.
    pub id: String,
    /// Client-facing file name used for retrieval by name.
    pub filename: String,
    /// Recorded content type, or a caller-supplied description of it.
    pub content_type: String,
}

impl AttachmentMeta {
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }
}
