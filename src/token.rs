use anyhow::{Context, Result};
use std::process::Command;

pub const NO_TOKEN_MESSAGE: &str = "No GitHub token found. Set GH_TOKEN or run `gh auth login`.";

/// Read-only access to an existing GitHub token.
pub trait TokenSource {
    /// Return the token. If this source has none, returns Ok(None)
    fn load(&self) -> Result<Option<String>>;
}

/// Token taken from the first non-empty environment variable in `vars`.
pub struct EnvTokenSource {
    vars: Vec<String>,
}

impl EnvTokenSource {
    pub fn new(vars: &[&str]) -> Self {
        EnvTokenSource {
            vars: vars.iter().map(|var| var.to_string()).collect(),
        }
    }
}

impl Default for EnvTokenSource {
    fn default() -> Self {
        Self::new(&["GH_TOKEN", "GITHUB_TOKEN"])
    }
}

impl TokenSource for EnvTokenSource {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty()))
    }
}

/// Token printed by `gh auth token`.
#[derive(Default)]
pub struct GhCliTokenSource;

impl TokenSource for GhCliTokenSource {
    fn load(&self) -> Result<Option<String>> {
        let output = match Command::new("gh").args(["auth", "token"]).output() {
            Ok(output) => output,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("Failed to run `gh auth token`"),
        };
        if !output.status.success() {
            return Ok(None);
        }
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!token.is_empty()).then_some(token))
    }
}

/// Returns the token of the first source that has one.
pub fn resolve_token(sources: &[&dyn TokenSource]) -> Result<String> {
    for source in sources {
        if let Some(token) = source.load()? {
            return Ok(token);
        }
    }
    Err(anyhow::anyhow!(NO_TOKEN_MESSAGE))
}
