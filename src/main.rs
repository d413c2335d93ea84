use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = issuedag::cli::parser::Cli::parse();
    setup_logging(cli.verbose);

    let mut repo_cache = issuedag::repository::SessionCache::new();
    issuedag::run::run(cli, &mut repo_cache, None).await
}

/// Logs go to stderr so reports on stdout stay machine-readable.
/// `RUST_LOG` overrides the level chosen by `--verbose`.
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
