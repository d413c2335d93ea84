use crate::dependency::DependencyReference;
use crate::github::issues::{IssueRecord, IssueState};
use crate::markdown_parser::parse_dependencies;
use serde::Serialize;
use std::collections::HashMap;

/// Why a dependency still counts against an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockerState {
    /// Same-repository issue that is still open.
    Open,
    /// Same-repository reference to an issue that does not exist.
    NotFound,
    /// Cross-repository reference; its state cannot be checked.
    Unknown,
}

impl BlockerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockerState::Open => "OPEN",
            BlockerState::NotFound => "NOT_FOUND",
            BlockerState::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocker {
    pub reference: DependencyReference,
    pub state: BlockerState,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedIssue {
    pub number: u64,
    pub title: String,
    pub issue_type: String,
    pub blockers: Vec<Blocker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyIssue {
    pub number: u64,
    pub title: String,
    pub issue_type: String,
}

pub type IssueIndex<'a> = HashMap<u64, &'a IssueRecord>;

pub fn index_issues(issues: &[IssueRecord]) -> IssueIndex<'_> {
    issues.iter().map(|issue| (issue.number, issue)).collect()
}

/// Resolves one reference against the known issues. `None` means the
/// dependency is satisfied.
pub fn resolve_reference(reference: &DependencyReference, index: &IssueIndex) -> Option<Blocker> {
    if reference.is_external() {
        return Some(Blocker {
            reference: reference.clone(),
            state: BlockerState::Unknown,
            title: None,
        });
    }
    match index.get(&reference.number) {
        Some(issue) if issue.state == IssueState::Closed => None,
        Some(issue) => Some(Blocker {
            reference: reference.clone(),
            state: BlockerState::Open,
            title: Some(issue.title.clone()),
        }),
        None => Some(Blocker {
            reference: reference.clone(),
            state: BlockerState::NotFound,
            title: None,
        }),
    }
}

/// Dependencies of `issue` that are not yet satisfied, in body order.
/// An issue naming itself is not its own blocker.
pub fn active_blockers(issue: &IssueRecord, index: &IssueIndex) -> Vec<Blocker> {
    let mut references = parse_dependencies(&issue.body);
    let mut seen = std::collections::HashSet::new();
    references.retain(|reference| {
        let is_self = !reference.is_external() && reference.number == issue.number;
        !is_self && seen.insert(reference.clone())
    });

    references
        .iter()
        .filter_map(|reference| resolve_reference(reference, index))
        .collect()
}

/// Open issues with at least one unsatisfied dependency, ascending by number.
pub fn find_blocked(issues: &[IssueRecord]) -> Vec<BlockedIssue> {
    let index = index_issues(issues);
    let mut blocked: Vec<BlockedIssue> = issues
        .iter()
        .filter(|issue| issue.state.is_open())
        .filter_map(|issue| {
            let blockers = active_blockers(issue, &index);
            if blockers.is_empty() {
                return None;
            }
            Some(BlockedIssue {
                number: issue.number,
                title: issue.title.clone(),
                issue_type: issue.issue_type.clone(),
                blockers,
            })
        })
        .collect();
    blocked.sort_by_key(|issue| issue.number);
    blocked
}

/// Open leaf issues with every dependency satisfied, ascending by number.
pub fn find_ready(issues: &[IssueRecord]) -> Vec<ReadyIssue> {
    let index = index_issues(issues);
    let mut ready: Vec<ReadyIssue> = issues
        .iter()
        .filter(|issue| issue.state.is_open() && issue.tracked_child_count == 0)
        .filter(|issue| active_blockers(issue, &index).is_empty())
        .map(|issue| ReadyIssue {
            number: issue.number,
            title: issue.title.clone(),
            issue_type: issue.issue_type.clone(),
        })
        .collect();
    ready.sort_by_key(|issue| issue.number);
    ready
}
