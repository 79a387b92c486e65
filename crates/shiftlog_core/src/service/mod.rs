//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Validation failures abort before any store mutation.
//! - Read-only listings degrade to empty results on storage failure;
//!   writes surface their errors.

pub mod entry_service;
pub mod registry_service;
