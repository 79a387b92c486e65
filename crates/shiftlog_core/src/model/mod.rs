//! Domain model for the electronic logbook core.
//!
//! # Responsibility
//! - Define canonical records for entries, logbooks, tags and attachments.
//! - Keep lifecycle rules (soft delete, immutable identity) in one place.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Logbooks and tags are never physically removed, only marked inactive.

pub mod attachment;
pub mod entry;
pub mod registry;
