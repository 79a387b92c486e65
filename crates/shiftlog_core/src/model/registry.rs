//! Logbook and tag registry records.
//!
//! # Responsibility
//! - Define the named-category records entries refer to by name.
//! - Provide soft-delete lifecycle helpers.
//!
//! # Invariants
//! - `name` is the natural key and immutable once created.
//! - State only transitions `Active -> Inactive`; rows are never erased.

use serde::{Deserialize, Serialize};

/// Lifecycle state shared by logbooks and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Visible and selectable for new entries.
    Active,
    /// Soft-deleted. Still resolvable by name for existing references.
    Inactive,
}

impl State {
    /// Stable string id used in storage and wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses the storage representation back into a state.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Named category an entry belongs to.
///
/// Tags share the exact same shape and lifecycle but live in an
/// independent namespace, so both are projections of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRecord {
    /// Natural key. Immutable once created.
    pub name: String,
    /// Creating principal.
    pub owner: String,
    /// Soft-delete lifecycle state.
    pub state: State,
    /// Optimistic concurrency token maintained by storage.
    #[serde(default = "initial_version")]
    pub version: i64,
}

fn initial_version() -> i64 {
    1
}

impl NamedRecord {
    /// Creates an active record with the initial version.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            state: State::Active,
            version: 1,
        }
    }

    /// Returns whether this record is still active.
    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    /// Marks this record as softly deleted.
    pub fn deactivate(&mut self) {
        self.state = State::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::{NamedRecord, State};

    #[test]
    fn state_round_trips_through_storage_strings() {
        assert_eq!(State::parse(State::Active.as_str()), Some(State::Active));
        assert_eq!(
            State::parse(State::Inactive.as_str()),
            Some(State::Inactive)
        );
        assert_eq!(State::parse("deleted"), None);
    }

    #[test]
    fn new_record_starts_active_at_version_one() {
        let record = NamedRecord::new("operations", "alice");
        assert!(record.is_active());
        assert_eq!(record.version, 1);
    }

    #[test]
    fn deactivate_flips_state_only() {
        let mut record = NamedRecord::new("operations", "alice");
        record.deactivate();
        assert_eq!(record.state, State::Inactive);
        assert_eq!(record.name, "operations");
    }
}
