use crate::github::graphql::{self, GraphQlResponse};
use crate::github::issues::{IssueRecord, IssueSnapshot};
use crate::github::listing;
use crate::repository::Repository;
use anyhow::{Context, Result};
use std::future::Future;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "issuedag-cli";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Failures of the issue tracker boundary. All of them abort the operation
/// that triggered the fetch.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token invalid or expired. Run `gh auth login` or set GH_TOKEN.")]
    Unauthorized,

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GitHub GraphQL error: {0}")]
    GraphQl(String),

    #[error("issue #{number} not found")]
    IssueNotFound { number: u64 },
}

/// Source of issue metadata and relationships.
///
/// Implementations are awaited one call at a time; no call is issued before
/// the previous one has completed.
pub trait IssueGraphClient {
    /// Fetches one issue with the issues it tracks and the issues tracking it.
    fn fetch_issue(&self, number: u64) -> impl Future<Output = Result<IssueSnapshot>>;

    /// Lists every issue of the repository, open and closed, with its body.
    fn list_issues(&self) -> impl Future<Output = Result<Vec<IssueRecord>>>;
}

/// `IssueGraphClient` backed by the GitHub GraphQL API.
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    repository: Repository,
    api_url: String,
}

impl GitHubClient {
    pub fn new(token: String, repository: Repository, api_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(GitHubClient {
            http,
            token,
            repository,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_graphql(&self, request: &serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}/graphql", self.api_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(check_status(response).await?)
    }

    async fn fetch_issue_page(&self, after: Option<String>) -> Result<listing::IssuePage> {
        let request = listing::issue_list_request(&self.repository, after.as_deref());
        let body = self
            .post_graphql(&request)
            .await?
            .json::<serde_json::Value>()
            .await
            .map_err(ClientError::from)?;
        Ok(listing::parse_issue_page(&body)?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

impl IssueGraphClient for GitHubClient {
    async fn fetch_issue(&self, number: u64) -> Result<IssueSnapshot> {
        tracing::info!("fetching #{number} from {}", self.repository);
        let request = graphql::issue_hierarchy_request(&self.repository, number);
        let body = self
            .post_graphql(&request)
            .await?
            .json::<GraphQlResponse>()
            .await
            .map_err(ClientError::from)?;
        Ok(graphql::into_snapshot(body, &self.repository, number)?)
    }

    async fn list_issues(&self) -> Result<Vec<IssueRecord>> {
        tracing::info!("listing issues of {}", self.repository);
        let client = self;
        listing::fetch_all_issues(
            move |after| client.fetch_issue_page(after),
            &self.repository,
        )
        .await
    }
}
