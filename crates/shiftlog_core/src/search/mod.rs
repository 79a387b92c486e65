//! Search translation entry points.
//!
//! # Responsibility
//! - Resolve time expressions (absolute or relative) into canonical
//!   millisecond timestamps.
//! - Rewrite search parameter maps so the entity store only ever sees
//!   canonical time bounds.

pub mod params;
pub mod time;
