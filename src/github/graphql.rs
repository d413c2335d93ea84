use crate::github::client::ClientError;
use crate::github::issues::{IssueSnapshot, IssueState, UNKNOWN_ISSUE_TYPE};
use crate::repository::Repository;
use serde::Deserialize;
use serde_json::{Value, json};

/// Page size for the tracked / tracked-in relationship lists.
pub const RELATIONSHIP_PAGE_SIZE: u32 = 100;

pub const ISSUE_HIERARCHY_QUERY: &str = r#"query($owner: String!, $repo: String!, $number: Int!, $first: Int!) {
  repository(owner: $owner, name: $repo) {
    issue(number: $number) {
      number
      title
      state
      issueType { name }
      trackedIssues(first: $first) {
        nodes { number repository { nameWithOwner } }
      }
      trackedInIssues(first: $first) {
        nodes { number }
      }
    }
  }
}"#;

pub fn issue_hierarchy_request(repository: &Repository, number: u64) -> Value {
    json!({
        "query": ISSUE_HIERARCHY_QUERY,
        "variables": {
            "owner": repository.owner,
            "repo": repository.name,
            "number": number,
            "first": RELATIONSHIP_PAGE_SIZE,
        }
    })
}

#[derive(Deserialize, Debug)]
pub struct GraphQlResponse {
    pub data: Option<ResponseData>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Deserialize, Debug)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ResponseData {
    pub repository: Option<RepositoryData>,
}

#[derive(Deserialize, Debug)]
pub struct RepositoryData {
    pub issue: Option<IssueData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub issue_type: Option<IssueTypeData>,
    pub tracked_issues: Connection<TrackedIssue>,
    pub tracked_in_issues: Connection<IssueNumber>,
}

#[derive(Deserialize, Debug)]
pub struct IssueTypeData {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackedIssue {
    pub number: u64,
    pub repository: Option<RepositoryName>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryName {
    pub name_with_owner: String,
}

#[derive(Deserialize, Debug)]
pub struct IssueNumber {
    pub number: u64,
}

/// Turns a hierarchy query response into a snapshot.
///
/// Tracked children that live in another repository are dropped: the walker
/// only fetches issues from `repository`.
pub fn into_snapshot(
    response: GraphQlResponse,
    repository: &Repository,
    number: u64,
) -> Result<IssueSnapshot, ClientError> {
    let issue = response
        .data
        .and_then(|data| data.repository)
        .and_then(|repo| repo.issue);

    let Some(issue) = issue else {
        if response.errors.is_empty()
            || response
                .errors
                .iter()
                .any(|error| error.kind.as_deref() == Some("NOT_FOUND"))
        {
            return Err(ClientError::IssueNotFound { number });
        }
        return Err(ClientError::GraphQl(join_messages(&response.errors)));
    };

    if !response.errors.is_empty() {
        return Err(ClientError::GraphQl(join_messages(&response.errors)));
    }

    let state = IssueState::parse(&issue.state).ok_or_else(|| {
        ClientError::GraphQl(format!("unexpected state '{}' for #{number}", issue.state))
    })?;

    let own_repo = repository.to_string();
    let tracked_children = issue
        .tracked_issues
        .nodes
        .into_iter()
        .filter(|child| match &child.repository {
            Some(repo) if !repo.name_with_owner.eq_ignore_ascii_case(&own_repo) => {
                tracing::debug!(
                    "skipping #{} tracked by #{number}: lives in {}",
                    child.number,
                    repo.name_with_owner
                );
                false
            }
            _ => true,
        })
        .map(|child| child.number)
        .collect();

    Ok(IssueSnapshot {
        number: issue.number,
        title: issue.title,
        state,
        issue_type: issue
            .issue_type
            .map(|kind| kind.name)
            .unwrap_or_else(|| UNKNOWN_ISSUE_TYPE.to_string()),
        tracked_children,
        tracked_parents: issue
            .tracked_in_issues
            .nodes
            .into_iter()
            .map(|parent| parent.number)
            .collect(),
    })
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
