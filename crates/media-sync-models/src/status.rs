use serde::{Deserialize, Serialize};
use std::fmt;

/// Status values accepted by the remote watch list
///
/// The discriminants are the numeric codes the list API expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Watching = 1,
    Completed = 2,
    OnHold = 3,
    Dropped = 4,
    #[default]
    PlanToWatch = 6,
}

impl ListStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ListStatus::Watching),
            2 => Some(ListStatus::Completed),
            3 => Some(ListStatus::OnHold),
            4 => Some(ListStatus::Dropped),
            6 => Some(ListStatus::PlanToWatch),
            _ => None,
        }
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListStatus::Watching => "watching",
            ListStatus::Completed => "completed",
            ListStatus::OnHold => "on_hold",
            ListStatus::Dropped => "dropped",
            ListStatus::PlanToWatch => "plan_to_watch",
        };
        f.write_str(name)
    }
}
