//! Propagation event kinds and their stable codes.

use crate::error::PropagationError;
use std::fmt;

/// The fact-lifecycle event a propagation carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Insertion,
    RuleAddition,
    Update,
    RuleRemoval,
    Deletion,
    Expiration,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Insertion,
        EventKind::RuleAddition,
        EventKind::Update,
        EventKind::RuleRemoval,
        EventKind::Deletion,
        EventKind::Expiration,
    ];

    /// Stable integer code used in persisted records
    pub const fn code(self) -> i32 {
        match self {
            EventKind::Insertion => 0,
            EventKind::RuleAddition => 1,
            EventKind::Update => 2,
            EventKind::RuleRemoval => 3,
            EventKind::Deletion => 4,
            EventKind::Expiration => 5,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, PropagationError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(PropagationError::UnknownEventKind(code))
    }

    pub const fn label(self) -> &'static str {
        match self {
            EventKind::Insertion => "INSERTION",
            EventKind::RuleAddition => "RULE_ADDITION",
            EventKind::Update => "UPDATE",
            EventKind::RuleRemoval => "RULE_REMOVAL",
            EventKind::Deletion => "DELETION",
            EventKind::Expiration => "EXPIRATION",
        }
    }

    /// Label for a raw code, as found in persisted or foreign data.
    pub fn label_for_code(code: i32) -> Result<&'static str, PropagationError> {
        Self::from_code(code).map(Self::label)
    }

    /// Only updates carry field-level change information.
    pub const fn tracks_properties(self) -> bool {
        matches!(self, EventKind::Update)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
