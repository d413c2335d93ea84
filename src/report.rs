//! Text renderings of hierarchy trees and flat issue lists.

use crate::blocking::{BlockedIssue, ReadyIssue};
use crate::github::issues::{IssueRecord, IssueState};
use crate::resolution::ResolutionOrder;
use crate::status::{DagSummary, IssueNode};
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TreeFormat {
    #[default]
    Tree,
    Json,
    Csv,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListFormat {
    #[default]
    Console,
    Json,
    Markdown,
}

pub const CSV_HEADER: &str = "Number,Title,State,IssueType,Depth,TotalChildren,ClosedChildren,PercentComplete,IsBlocked,IsReady,Path";

pub fn render_tree(root: &IssueNode, summary: &DagSummary, format: TreeFormat) -> Result<String> {
    match format {
        TreeFormat::Tree => Ok(tree_text(root, summary)),
        TreeFormat::Json => to_json(root),
        TreeFormat::Csv => Ok(tree_csv(root)),
        TreeFormat::Markdown => Ok(tree_markdown(root, summary)),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report")
}

fn glyph(state: IssueState) -> &'static str {
    match state {
        IssueState::Closed => "✓",
        IssueState::Open => "○",
    }
}

fn node_label(node: &IssueNode) -> String {
    let mut label = format!("#{} {} [{}]", node.number, node.title, node.issue_type);
    if node.total_children > 0 {
        label.push_str(&format!(
            " ({}/{}, {}%)",
            node.closed_children, node.total_children, node.percent_complete
        ));
    }
    if node.is_blocked {
        label.push_str(" [BLOCKED]");
    }
    if node.is_ready {
        label.push_str(" [READY]");
    }
    label
}

fn summary_line(summary: &DagSummary) -> String {
    format!(
        "Summary: {} issues ({} open, {} closed), {} blocked, {} ready, {}% complete",
        summary.total,
        summary.open,
        summary.closed,
        summary.blocked,
        summary.ready,
        summary.root_percent_complete
    )
}

fn tree_text(root: &IssueNode, summary: &DagSummary) -> String {
    let mut lines = vec![format!("{} {}", glyph(root.state), node_label(root))];
    push_branches(&root.children, "", &mut lines);
    lines.push(String::new());
    lines.push(summary_line(summary));
    lines.join("\n")
}

fn push_branches(children: &[IssueNode], prefix: &str, lines: &mut Vec<String>) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (branch, continuation) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!(
            "{prefix}{branch}{} {}",
            glyph(child.state),
            node_label(child)
        ));
        push_branches(&child.children, &format!("{prefix}{continuation}"), lines);
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn tree_csv(root: &IssueNode) -> String {
    let mut rows = vec![CSV_HEADER.to_string()];
    push_csv_rows(root, &[], &mut rows);
    rows.join("\n")
}

fn push_csv_rows(node: &IssueNode, ancestors: &[u64], rows: &mut Vec<String>) {
    let mut path: Vec<u64> = ancestors.to_vec();
    path.push(node.number);
    let breadcrumb = path
        .iter()
        .map(|number| format!("#{number}"))
        .collect::<Vec<_>>()
        .join(" > ");

    rows.push(
        [
            node.number.to_string(),
            csv_field(&node.title),
            node.state.to_string(),
            csv_field(&node.issue_type),
            node.depth.to_string(),
            node.total_children.to_string(),
            node.closed_children.to_string(),
            node.percent_complete.to_string(),
            node.is_blocked.to_string(),
            node.is_ready.to_string(),
            csv_field(&breadcrumb),
        ]
        .join(","),
    );

    for child in &node.children {
        push_csv_rows(child, &path, rows);
    }
}

fn tree_markdown(root: &IssueNode, summary: &DagSummary) -> String {
    let mut lines = vec![
        format!("## #{} {}", root.number, root.title),
        String::new(),
        format!("**{}**", summary_line(summary)),
        String::new(),
    ];
    push_markdown_items(root, 0, &mut lines);
    lines.join("\n")
}

fn push_markdown_items(node: &IssueNode, level: usize, lines: &mut Vec<String>) {
    let checkbox = match node.state {
        IssueState::Closed => "[x]",
        IssueState::Open => "[ ]",
    };
    let mut line = format!(
        "{}- {checkbox} #{} {} ({})",
        "  ".repeat(level),
        node.number,
        node.title,
        node.issue_type
    );
    if node.total_children > 0 {
        line.push_str(&format!(
            " {}/{}, {}%",
            node.closed_children, node.total_children, node.percent_complete
        ));
    }
    if node.is_blocked {
        line.push_str(" **BLOCKED**");
    }
    if node.is_ready {
        line.push_str(" **READY**");
    }
    lines.push(line);
    for child in &node.children {
        push_markdown_items(child, level + 1, lines);
    }
}

fn table_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

pub fn render_blocked(blocked: &[BlockedIssue], format: ListFormat) -> Result<String> {
    match format {
        ListFormat::Json => to_json(&blocked),
        ListFormat::Console => {
            if blocked.is_empty() {
                return Ok("No blocked issues.".to_string());
            }
            let mut lines = Vec::new();
            for issue in blocked {
                lines.push(format!("#{} {} [{}]", issue.number, issue.title, issue.issue_type));
                for blocker in &issue.blockers {
                    let title = blocker
                        .title
                        .as_deref()
                        .map(|title| format!(" {title}"))
                        .unwrap_or_default();
                    lines.push(format!(
                        "    blocked by {}{title} ({})",
                        blocker.reference,
                        blocker.state.as_str()
                    ));
                }
            }
            Ok(lines.join("\n"))
        }
        ListFormat::Markdown => {
            let mut lines = vec![
                "| Issue | Title | Blocked by |".to_string(),
                "|---|---|---|".to_string(),
            ];
            for issue in blocked {
                let blockers = issue
                    .blockers
                    .iter()
                    .map(|blocker| format!("{} ({})", blocker.reference, blocker.state.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!(
                    "| #{} | {} | {} |",
                    issue.number,
                    table_cell(&issue.title),
                    blockers
                ));
            }
            Ok(lines.join("\n"))
        }
    }
}

pub fn render_ready(ready: &[ReadyIssue], format: ListFormat) -> Result<String> {
    match format {
        ListFormat::Json => to_json(&ready),
        ListFormat::Console => {
            if ready.is_empty() {
                return Ok("No ready issues.".to_string());
            }
            Ok(ready
                .iter()
                .map(|issue| format!("#{} {} [{}]", issue.number, issue.title, issue.issue_type))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        ListFormat::Markdown => {
            let mut lines = vec![
                "| Issue | Title | Type |".to_string(),
                "|---|---|---|".to_string(),
            ];
            lines.extend(ready.iter().map(|issue| {
                format!(
                    "| #{} | {} | {} |",
                    issue.number,
                    table_cell(&issue.title),
                    table_cell(&issue.issue_type)
                )
            }));
            Ok(lines.join("\n"))
        }
    }
}

pub fn render_order(
    order: &ResolutionOrder,
    issues: &[IssueRecord],
    format: ListFormat,
) -> Result<String> {
    let titles: HashMap<u64, &str> = issues
        .iter()
        .map(|issue| (issue.number, issue.title.as_str()))
        .collect();
    let title = |number: &u64| titles.get(number).copied().unwrap_or_default();

    match format {
        ListFormat::Json => to_json(order),
        ListFormat::Console => {
            let mut lines: Vec<String> = order
                .order
                .iter()
                .enumerate()
                .map(|(i, number)| format!("{:>3}. #{number} {}", i + 1, title(number)))
                .collect();
            if order.order.is_empty() && order.unresolved.is_empty() {
                lines.push("No open issues to order.".to_string());
            }
            if !order.unresolved.is_empty() {
                if !lines.is_empty() {
                    lines.push(String::new());
                }
                lines.push("Unresolved (blocking cycle):".to_string());
                lines.extend(
                    order
                        .unresolved
                        .iter()
                        .map(|number| format!("  #{number} {}", title(number))),
                );
            }
            Ok(lines.join("\n"))
        }
        ListFormat::Markdown => {
            let mut lines: Vec<String> = order
                .order
                .iter()
                .enumerate()
                .map(|(i, number)| format!("{}. #{number} {}", i + 1, title(number)))
                .collect();
            if !order.unresolved.is_empty() {
                if !lines.is_empty() {
                    lines.push(String::new());
                }
                lines.push("### Unresolved (blocking cycle)".to_string());
                lines.push(String::new());
                lines.extend(
                    order
                        .unresolved
                        .iter()
                        .map(|number| format!("- #{number} {}", title(number))),
                );
            }
            Ok(lines.join("\n"))
        }
    }
}
