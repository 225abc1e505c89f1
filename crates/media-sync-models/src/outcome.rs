use serde::{Deserialize, Serialize};

/// How the list service answered an add request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "response", rename_all = "snake_case")]
pub enum AddOutcome {
    /// The entry was already on the user's list
    AlreadyPresent,
    /// The entry was newly added
    Added,
    /// Anything else; carries the raw response text
    Other(String),
}

/// How the list service answered a progress update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "response", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated,
    /// Anything else; carries the raw response text
    Other(String),
}
