use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueState {
    #[serde(alias = "open")]
    Open,
    #[serde(alias = "closed")]
    Closed,
}

impl IssueState {
    /// Accepts both `OPEN` and `open` spellings.
    pub fn parse(state: &str) -> Option<Self> {
        match state.to_ascii_lowercase().as_str() {
            "open" => Some(IssueState::Open),
            "closed" => Some(IssueState::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "OPEN",
            IssueState::Closed => "CLOSED",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, IssueState::Open)
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue type reported when the tracker has none.
pub const UNKNOWN_ISSUE_TYPE: &str = "Unknown";

/// One issue together with its tracking relationships, as returned by a
/// single hierarchy fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSnapshot {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub issue_type: String,
    /// Issues tracked by this one, in tracker order.
    pub tracked_children: Vec<u64>,
    /// Issues that track this one.
    pub tracked_parents: Vec<u64>,
}

/// A flat issue with its body, used for dependency analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub issue_type: String,
    pub body: String,
    /// Issues this one tracks; zero for a leaf.
    pub tracked_child_count: usize,
}
