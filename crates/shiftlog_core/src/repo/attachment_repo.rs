//! Attachment blob store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist and retrieve binary blobs keyed by identifier.
//! - Infer media types from filenames for retrieval responses.
//!
//! # Invariants
//! - Blobs are write-once; there is no update path.
//! - Media type inference is a pure function of the filename, independent
//!   of what is stored.

use crate::model::attachment::AttachmentMeta;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

/// Repository interface for the attachment blob store.
pub trait AttachmentRepository {
    /// Stores a blob and returns its catalog record.
    ///
    /// When `explicit_id` is absent a fresh id is generated.
    fn put(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
        explicit_id: Option<&str>,
    ) -> RepoResult<AttachmentMeta>;
    /// Fetches one blob with its catalog record.
    fn get(&self, id: &str) -> RepoResult<Option<(AttachmentMeta, Vec<u8>)>>;
}

/// SQLite-backed attachment store.
pub struct SqliteAttachmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttachmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AttachmentRepository for SqliteAttachmentRepository<'_> {
    fn put(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
        explicit_id: Option<&str>,
    ) -> RepoResult<AttachmentMeta> {
        let id = match explicit_id {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let inserted = self.conn.execute(
            "INSERT INTO attachments (id, filename, content_type, data) VALUES (?1, ?2, ?3, ?4);",
            params![id.as_str(), filename, content_type, bytes],
        );

        match inserted {
            Ok(_) => Ok(AttachmentMeta::new(id, filename, content_type)),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Conflict {
                    collection: "attachment",
                    key: id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get(&self, id: &str) -> RepoResult<Option<(AttachmentMeta, Vec<u8>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, content_type, data FROM attachments WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let meta = AttachmentMeta {
                id: row.get(0)?,
                filename: row.get(1)?,
                content_type: row.get(2)?,
            };
            let bytes: Vec<u8> = row.get(3)?;
            return Ok(Some((meta, bytes)));
        }
        Ok(None)
    }
}

/// Infers a media type from the filename extension.
///
/// Unrecognized extensions fall back to the generic binary type.
pub fn media_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::media_type_for;

    #[test]
    fn known_extensions_resolve_to_specific_types() {
        assert_eq!(media_type_for("plot.png"), "image/png");
        assert_eq!(media_type_for("readings.txt"), "text/plain");
        assert_eq!(media_type_for("report.pdf"), "application/pdf");
    }

    #[test]
    fn unknown_or_missing_extensions_fall_back_to_octet_stream() {
        assert_eq!(media_type_for("dump.rawdata9"), "application/octet-stream");
        assert_eq!(media_type_for("no_extension"), "application/octet-stream");
    }
}
