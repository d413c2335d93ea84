//! Command-line interface definitions using clap.

use crate::report::{ListFormat, TreeFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Issue hierarchy and dependency reports for GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "issuedag", version)]
pub struct Cli {
    /// Repository to query, as <owner>/<repo> (defaults to config, then git origin)
    #[arg(long, global = true, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Read issues from a JSON snapshot file instead of GitHub
    #[arg(long, global = true, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show the completion status of the hierarchy under an issue
    Status {
        /// Root issue number (a leading '#' is accepted)
        #[arg(value_parser = parse_issue_number)]
        root: u64,

        /// Levels to descend below the root; -1 for unlimited
        #[arg(long, allow_negative_numbers = true, value_parser = parse_max_depth)]
        max_depth: Option<i64>,

        #[arg(long, value_enum, default_value_t = TreeFormat::Tree)]
        format: TreeFormat,
    },

    /// List open issues held up by unresolved dependencies
    Blocked {
        #[arg(long, value_enum, default_value_t = ListFormat::Console)]
        format: ListFormat,
    },

    /// List open leaf issues with every dependency resolved
    Ready {
        #[arg(long, value_enum, default_value_t = ListFormat::Console)]
        format: ListFormat,
    },

    /// Order open issues so each comes after the issues blocking it
    Order {
        #[arg(long, value_enum, default_value_t = ListFormat::Console)]
        format: ListFormat,
    },
}

fn parse_issue_number(value: &str) -> Result<u64, String> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{value}' is not an issue number"));
    }
    digits
        .parse::<u64>()
        .ok()
        .filter(|number| *number > 0)
        .ok_or_else(|| format!("'{value}' is not an issue number"))
}

fn parse_max_depth(value: &str) -> Result<i64, String> {
    value
        .parse::<i64>()
        .ok()
        .filter(|depth| *depth >= -1)
        .ok_or_else(|| format!("'{value}' is not a depth (-1 for unlimited)"))
}
