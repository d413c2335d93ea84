use crate::blocking;
use crate::cli::parser::{Cli, Command};
use crate::config::{self, ConfigKey, Settings};
use crate::github::client::{GitHubClient, IssueGraphClient};
use crate::github::snapshot::SnapshotClient;
use crate::hierarchy::{self, DepthLimit};
use crate::output;
use crate::report;
use crate::repository::{self, Repository, SessionCache};
use crate::resolution;
use crate::status;
use crate::token::{self, EnvTokenSource, GhCliTokenSource};
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Executes one parsed command and prints its report.
///
/// `repo_cache` holds the git-origin lookup for as long as the caller keeps
/// it; a caller running several commands calls `invalidate()` to look again.
pub async fn run(
    cli: Cli,
    repo_cache: &mut SessionCache<Repository>,
    mut stdout_additional: Option<&mut dyn std::io::Write>,
) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let file_config = config::load_project_config(&cwd)?;

    let mut overrides = HashMap::new();
    if let Command::Status {
        max_depth: Some(depth),
        ..
    } = &cli.command
    {
        overrides.insert(ConfigKey::MaxDepth, serde_json::json!(depth));
    }
    let settings = Settings::from_config(&config::update_config(&file_config, &overrides))?;

    let text = match &cli.snapshot {
        Some(path) => {
            tracing::info!("reading issues from snapshot {}", path.display());
            let client = SnapshotClient::load(path)?;
            render_command(&client, &cli.command, &settings).await?
        }
        None => {
            let repository = repository::resolve_repository(
                cli.repo.as_deref(),
                settings.repository.as_deref(),
                repo_cache,
                repository::git_origin_repository,
            )?;
            let token = token::resolve_token(&[&EnvTokenSource::default(), &GhCliTokenSource])?;
            let client = GitHubClient::new(token, repository, &settings.api_url)?;
            render_command(&client, &cli.command, &settings).await?
        }
    };

    output::println(&text, &mut stdout_additional)?;
    Ok(())
}

/// Fetches what `command` needs from `client` and renders the report.
pub async fn render_command<C: IssueGraphClient>(
    client: &C,
    command: &Command,
    settings: &Settings,
) -> Result<String> {
    match command {
        Command::Status { root, format, .. } => {
            let limit = DepthLimit::from_max_depth(settings.max_depth);
            let tree = hierarchy::build_hierarchy(client, *root, limit).await?;
            let summary = status::summarize(&tree);
            report::render_tree(&tree, &summary, *format)
        }
        Command::Blocked { format } => {
            let issues = client.list_issues().await?;
            report::render_blocked(&blocking::find_blocked(&issues), *format)
        }
        Command::Ready { format } => {
            let issues = client.list_issues().await?;
            report::render_ready(&blocking::find_ready(&issues), *format)
        }
        Command::Order { format } => {
            let issues = client.list_issues().await?;
            let order = resolution::resolution_order(&issues);
            report::render_order(&order, &issues, *format)
        }
    }
}
