//! Reference types shared across the propagation core.
//!
//! These are lightweight handles into collaborators this crate does not own
//! (rule base, partial-match network, fact store). They are cheap to clone and
//! serializable so they can travel inside a persisted context record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a propagation in the session-wide total order.
pub type PropagationNumber = u64;

/// Handle to a fact held by working memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactHandle {
    id: u64,
}

impl FactHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[fid:{}]", self.id)
    }
}

/// Reference to a rule in the rule base
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleRef {
    pub package: String,
    pub name: String,
}

impl RuleRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.package, self.name)
    }
}

/// Reference to a partial match (left tuple) inside the matching network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleRef(pub u64);

impl fmt::Display for TupleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tuple#{}", self.0)
    }
}

/// Named partition of working memory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPointId(String);

impl EntryPointId {
    pub const DEFAULT_NAME: &'static str = "DEFAULT";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT_NAME
    }
}

impl Default for EntryPointId {
    fn default() -> Self {
        Self(Self::DEFAULT_NAME.to_string())
    }
}

impl fmt::Display for EntryPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryPoint::{}", self.0)
    }
}
