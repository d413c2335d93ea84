use crate::github::client::ClientError;
use crate::github::graphql::RELATIONSHIP_PAGE_SIZE;
use crate::github::issues::{IssueRecord, IssueState, UNKNOWN_ISSUE_TYPE};
use crate::repository::Repository;
use anyhow::Result;
use serde_json::{Value, json};
use std::future::Future;

/// Page size used when listing repository issues.
pub const PER_PAGE: u32 = 100;

/// Lists issues with the same tracked-issue relationship the hierarchy
/// walk follows, so leaf detection agrees between the two.
pub const ISSUE_LIST_QUERY: &str = r#"query($owner: String!, $repo: String!, $first: Int!, $after: String, $tracked: Int!) {
  repository(owner: $owner, name: $repo) {
    issues(first: $first, after: $after, orderBy: {field: CREATED_AT, direction: ASC}) {
      pageInfo { hasNextPage endCursor }
      nodes {
        number
        title
        state
        body
        issueType { name }
        trackedIssues(first: $tracked) {
          nodes { number repository { nameWithOwner } }
        }
      }
    }
  }
}"#;

pub fn issue_list_request(repository: &Repository, after: Option<&str>) -> Value {
    json!({
        "query": ISSUE_LIST_QUERY,
        "variables": {
            "owner": repository.owner,
            "repo": repository.name,
            "first": PER_PAGE,
            "after": after,
            "tracked": RELATIONSHIP_PAGE_SIZE,
        }
    })
}

/// One page of the issue listing, still as raw GraphQL nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePage {
    pub nodes: Vec<Value>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Extracts the issue connection from a listing response.
pub fn parse_issue_page(response: &Value) -> Result<IssuePage, ClientError> {
    if let Some(errors) = response["errors"].as_array().filter(|errors| !errors.is_empty()) {
        let message = errors
            .iter()
            .filter_map(|error| error["message"].as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ClientError::GraphQl(message));
    }

    let issues = &response["data"]["repository"]["issues"];
    if issues.is_null() {
        return Err(ClientError::GraphQl(
            "response has no issue listing".to_string(),
        ));
    }

    Ok(IssuePage {
        nodes: issues["nodes"].as_array().cloned().unwrap_or_default(),
        end_cursor: issues["pageInfo"]["endCursor"].as_str().map(str::to_string),
        has_next_page: issues["pageInfo"]["hasNextPage"].as_bool().unwrap_or(false),
    })
}

/// Converts listed issue nodes into records.
///
/// Entries with an unrecognised state, or missing a number or title, are
/// dropped. Only tracked issues living in `repository` count as children.
pub fn parse_github_issues(nodes: &[Value], repository: &Repository) -> Vec<IssueRecord> {
    let own_repo = repository.to_string();
    nodes
        .iter()
        .filter_map(|issue| {
            let number = issue["number"].as_u64()?;
            let title = issue["title"].as_str()?;
            let state = IssueState::parse(issue["state"].as_str()?)?;

            let tracked_child_count = issue["trackedIssues"]["nodes"]
                .as_array()
                .map(|children| {
                    children
                        .iter()
                        .filter(|child| {
                            child["repository"]["nameWithOwner"]
                                .as_str()
                                .is_none_or(|name| name.eq_ignore_ascii_case(&own_repo))
                        })
                        .count()
                })
                .unwrap_or(0);

            Some(IssueRecord {
                number,
                title: title.to_string(),
                state,
                issue_type: issue["issueType"]["name"]
                    .as_str()
                    .unwrap_or(UNKNOWN_ISSUE_TYPE)
                    .to_string(),
                body: issue["body"].as_str().unwrap_or_default().to_string(),
                tracked_child_count,
            })
        })
        .collect()
}

/// Pulls every page from `fetch_page(cursor)`, starting with no cursor and
/// following `endCursor` while the connection reports more pages.
pub async fn fetch_all_issues<F, Fut>(
    mut fetch_page: F,
    repository: &Repository,
) -> Result<Vec<IssueRecord>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<IssuePage>>,
{
    let mut all_issues = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_number = 1;

    loop {
        let page = fetch_page(cursor.take()).await?;

        let parsed_issues = parse_github_issues(&page.nodes, repository);
        tracing::debug!(
            "page {page_number}: {} entries, {} issues",
            page.nodes.len(),
            parsed_issues.len()
        );
        all_issues.extend(parsed_issues);

        match page.end_cursor {
            Some(next) if page.has_next_page => cursor = Some(next),
            _ => break,
        }
        page_number += 1;
    }

    Ok(all_issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repository {
        "owner/repo".parse().unwrap()
    }

    fn page(nodes: Vec<Value>, end_cursor: Option<&str>, has_next_page: bool) -> IssuePage {
        IssuePage {
            nodes,
            end_cursor: end_cursor.map(str::to_string),
            has_next_page,
        }
    }

    #[test]
    fn test_request_carries_cursor() {
        let first = issue_list_request(&repo(), None);
        assert_eq!(first["variables"]["owner"], "owner");
        assert_eq!(first["variables"]["first"], PER_PAGE);
        assert!(first["variables"]["after"].is_null());

        let next = issue_list_request(&repo(), Some("Y3Vyc29y"));
        assert_eq!(next["variables"]["after"], "Y3Vyc29y");
    }

    #[test]
    fn test_parse_github_issues_with_valid_issues() {
        let nodes = vec![
            json!({
                "number": 123,
                "title": "Test issue",
                "state": "OPEN",
                "body": "## Dependencies",
                "issueType": {"name": "Feature"},
                "trackedIssues": {"nodes": [
                    {"number": 1, "repository": {"nameWithOwner": "owner/repo"}},
                    {"number": 2, "repository": {"nameWithOwner": "owner/repo"}}
                ]}
            }),
            json!({
                "number": 456,
                "title": "Closed issue",
                "state": "CLOSED",
                "body": null,
                "issueType": null
            }),
        ];

        let issues = parse_github_issues(&nodes, &repo());

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].number, 123);
        assert_eq!(issues[0].state, IssueState::Open);
        assert_eq!(issues[0].issue_type, "Feature");
        assert_eq!(issues[0].body, "## Dependencies");
        assert_eq!(issues[0].tracked_child_count, 2);
        assert_eq!(issues[1].number, 456);
        assert_eq!(issues[1].state, IssueState::Closed);
        assert_eq!(issues[1].issue_type, UNKNOWN_ISSUE_TYPE);
        assert_eq!(issues[1].body, "");
        assert_eq!(issues[1].tracked_child_count, 0);
    }

    #[test]
    fn test_child_count_follows_tracked_issues_only() {
        // Native sub-issue counts are a different relationship and are ignored.
        let nodes = vec![
            json!({
                "number": 1,
                "title": "Has sub-issues but tracks nothing",
                "state": "OPEN",
                "subIssues": {"totalCount": 3},
                "sub_issues_summary": {"total": 3},
                "trackedIssues": {"nodes": []}
            }),
            json!({
                "number": 2,
                "title": "Tracks issues without sub-issues",
                "state": "OPEN",
                "subIssues": {"totalCount": 0},
                "trackedIssues": {"nodes": [
                    {"number": 5, "repository": {"nameWithOwner": "Owner/Repo"}},
                    {"number": 9, "repository": {"nameWithOwner": "other/repo"}}
                ]}
            }),
        ];

        let issues = parse_github_issues(&nodes, &repo());

        assert_eq!(issues[0].tracked_child_count, 0);
        assert_eq!(issues[1].tracked_child_count, 1);
    }

    #[test]
    fn test_parse_github_issues_ignores_invalid_entries() {
        let nodes = vec![
            json!({"number": 1, "title": "Valid", "state": "OPEN"}),
            json!({"number": 2, "title": "Bad state", "state": "MERGED"}),
            json!({"title": "Missing number", "state": "OPEN"}),
            json!({"number": "4", "title": "String number", "state": "OPEN"}),
            json!({"number": 5, "state": "OPEN"}),
        ];

        let issues = parse_github_issues(&nodes, &repo());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 1);
    }

    #[test]
    fn test_parse_issue_page() {
        let response = json!({
            "data": {"repository": {"issues": {
                "pageInfo": {"hasNextPage": true, "endCursor": "abc"},
                "nodes": [{"number": 1, "title": "One", "state": "OPEN"}]
            }}}
        });

        let parsed = parse_issue_page(&response).unwrap();

        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.end_cursor.as_deref(), Some("abc"));
        assert!(parsed.has_next_page);
    }

    #[test]
    fn test_parse_issue_page_errors() {
        let response = json!({
            "data": null,
            "errors": [{"message": "Bad credentials"}, {"message": "rate limited"}]
        });
        let err = parse_issue_page(&response).unwrap_err();
        assert_eq!(err.to_string(), "GitHub GraphQL error: Bad credentials; rate limited");

        let missing = json!({"data": {"repository": null}});
        assert!(parse_issue_page(&missing).is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_issues_follows_cursor() {
        let mock_fetcher = |cursor: Option<String>| async move {
            let next = match cursor.as_deref() {
                None => page(
                    vec![json!({"number": 123, "title": "First issue", "state": "OPEN"})],
                    Some("c1"),
                    true,
                ),
                Some("c1") => page(
                    vec![json!({"number": 456, "title": "Second issue", "state": "CLOSED"})],
                    Some("c2"),
                    false,
                ),
                Some(other) => panic!("unexpected cursor {other}"),
            };
            Ok::<_, anyhow::Error>(next)
        };

        let issues = fetch_all_issues(mock_fetcher, &repo()).await.unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].number, 123);
        assert_eq!(issues[1].number, 456);
    }

    #[tokio::test]
    async fn test_fetch_all_issues_empty_response() {
        let mock_fetcher =
            |_cursor: Option<String>| async { Ok::<IssuePage, anyhow::Error>(IssuePage::default()) };

        let issues = fetch_all_issues(mock_fetcher, &repo()).await.unwrap();

        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_issues_error_handling() {
        let mock_fetcher = |_cursor: Option<String>| async {
            Err::<IssuePage, _>(anyhow::anyhow!("Network error"))
        };

        let result = fetch_all_issues(mock_fetcher, &repo()).await;

        assert!(result.unwrap_err().to_string().contains("Network error"));
    }
}
