use crate::github::client::{ClientError, IssueGraphClient};
use crate::github::issues::{IssueRecord, IssueSnapshot, IssueState, UNKNOWN_ISSUE_TYPE};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct SnapshotIssue {
    number: u64,
    title: String,
    state: IssueState,
    issue_type: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    children: Vec<u64>,
    parents: Option<Vec<u64>>,
}

/// `IssueGraphClient` over a JSON file exported from (or written to mimic)
/// the issue tracker.
///
/// The file holds an array of issues:
/// `{"number", "title", "state", "issueType"?, "body"?, "children"?, "parents"?}`.
/// When `parents` is omitted it is derived from every `children` list.
#[derive(Debug)]
pub struct SnapshotClient {
    issues: BTreeMap<u64, SnapshotIssue>,
    derived_parents: HashMap<u64, Vec<u64>>,
}

impl SnapshotClient {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: Vec<SnapshotIssue> =
            serde_json::from_str(content).context("Failed to parse snapshot JSON")?;

        let mut issues = BTreeMap::new();
        let mut derived_parents: HashMap<u64, Vec<u64>> = HashMap::new();
        for issue in entries {
            for child in &issue.children {
                derived_parents.entry(*child).or_default().push(issue.number);
            }
            let number = issue.number;
            if issues.insert(number, issue).is_some() {
                return Err(anyhow::anyhow!("Issue #{number} appears twice in snapshot"));
            }
        }

        Ok(SnapshotClient {
            issues,
            derived_parents,
        })
    }

    fn lookup(&self, number: u64) -> Result<&SnapshotIssue, ClientError> {
        self.issues
            .get(&number)
            .ok_or(ClientError::IssueNotFound { number })
    }
}

fn issue_type(issue: &SnapshotIssue) -> String {
    issue
        .issue_type
        .clone()
        .unwrap_or_else(|| UNKNOWN_ISSUE_TYPE.to_string())
}

impl IssueGraphClient for SnapshotClient {
    async fn fetch_issue(&self, number: u64) -> Result<IssueSnapshot> {
        let issue = self.lookup(number)?;
        let tracked_parents = match &issue.parents {
            Some(parents) => parents.clone(),
            None => self
                .derived_parents
                .get(&number)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(IssueSnapshot {
            number: issue.number,
            title: issue.title.clone(),
            state: issue.state,
            issue_type: issue_type(issue),
            tracked_children: issue.children.clone(),
            tracked_parents,
        })
    }

    async fn list_issues(&self) -> Result<Vec<IssueRecord>> {
        Ok(self
            .issues
            .values()
            .map(|issue| IssueRecord {
                number: issue.number,
                title: issue.title.clone(),
                state: issue.state,
                issue_type: issue_type(issue),
                body: issue.body.clone(),
                tracked_child_count: issue.children.len(),
            })
            .collect())
    }
}
