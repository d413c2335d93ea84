use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::process::Command;
use std::str::FromStr;
use std::sync::LazyLock;

pub const INVALID_REPOSITORY_FORMAT: &str =
    "Invalid repository format. Please use <owner>/<repo>.";

static REMOTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[:/](?P<owner>[^/\s]+)/(?P<name>[^/\s]+?)(?:\.git)?/?$")
        .expect("remote URL pattern is valid")
});

/// Coordinates of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.trim().split('/').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            Ok(Repository {
                owner: parts[0].to_string(),
                name: parts[1].to_string(),
            })
        } else {
            Err(anyhow::anyhow!(INVALID_REPOSITORY_FORMAT))
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl Repository {
    /// Reads owner and name from an https or ssh GitHub remote URL.
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let captures = REMOTE_URL.captures(url.trim())?;
        Some(Repository {
            owner: captures["owner"].to_string(),
            name: captures["name"].to_string(),
        })
    }
}

/// A best-effort value cache that lives as long as its owner.
///
/// Callers own the cache and pass it where a lookup is needed, so a refresh
/// is just `invalidate()` before the next `get_or_try_insert_with`.
#[derive(Debug)]
pub struct SessionCache<T> {
    value: Option<T>,
}

impl<T> Default for SessionCache<T> {
    fn default() -> Self {
        SessionCache { value: None }
    }
}

impl<T: Clone> SessionCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<T> {
        self.value.clone()
    }

    pub fn get_or_try_insert_with<F>(&mut self, load: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }
        let value = load()?;
        self.value = Some(value.clone());
        Ok(value)
    }

    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

/// Reads the `origin` remote of the git working copy in the current directory.
pub fn git_origin_repository() -> Result<Repository> {
    let output = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .context("Failed to run git")?;
    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "No repository given and no git origin remote found. Use --repo <owner>/<repo>."
        ));
    }
    let url = String::from_utf8_lossy(&output.stdout);
    Repository::from_remote_url(&url)
        .ok_or_else(|| anyhow::anyhow!("Origin remote is not a GitHub URL: {}", url.trim()))
}

/// Picks the repository to query: the explicit value first, then the
/// configured one, then the (cached) git origin lookup.
pub fn resolve_repository<F>(
    explicit: Option<&str>,
    configured: Option<&str>,
    cache: &mut SessionCache<Repository>,
    lookup: F,
) -> Result<Repository>
where
    F: FnOnce() -> Result<Repository>,
{
    if let Some(value) = explicit.or(configured) {
        return value.parse();
    }
    cache.get_or_try_insert_with(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_parse_repository() {
        let repo: Repository = "owner/repo".parse().unwrap();
        assert_eq!(repo.owner, "owner");
        assert_eq!(repo.name, "repo");
        assert_eq!(repo.to_string(), "owner/repo");
    }

    #[test]
    fn test_parse_repository_invalid_formats() {
        for value in ["ownerrepo", "/repo", "owner/", "owner/repo/extra", ""] {
            let err = value.parse::<Repository>().unwrap_err();
            assert_eq!(err.to_string(), INVALID_REPOSITORY_FORMAT, "input {value:?}");
        }
    }

    #[test]
    fn test_from_remote_url_variants() {
        let expected = Repository {
            owner: "octo".to_string(),
            name: "widgets".to_string(),
        };
        for url in [
            "https://github.com/octo/widgets.git",
            "https://github.com/octo/widgets",
            "git@github.com:octo/widgets.git\n",
            "ssh://git@github.com/octo/widgets.git",
        ] {
            assert_eq!(Repository::from_remote_url(url), Some(expected.clone()), "{url}");
        }
        assert_eq!(Repository::from_remote_url("https://gitlab.com/a/b.git"), None);
    }

    #[test]
    fn test_resolve_prefers_explicit_then_configured() {
        let mut cache = SessionCache::new();
        let never = || -> Result<Repository> { panic!("lookup must not run") };

        let repo = resolve_repository(Some("a/b"), Some("c/d"), &mut cache, never).unwrap();
        assert_eq!(repo.to_string(), "a/b");

        let repo = resolve_repository(None, Some("c/d"), &mut cache, never).unwrap();
        assert_eq!(repo.to_string(), "c/d");
    }

    #[test]
    fn test_resolve_caches_lookup_until_invalidated() {
        let mut cache = SessionCache::new();
        let calls = Cell::new(0);
        let lookup = || {
            calls.set(calls.get() + 1);
            "x/y".parse::<Repository>()
        };

        resolve_repository(None, None, &mut cache, lookup).unwrap();
        resolve_repository(None, None, &mut cache, lookup).unwrap();
        assert_eq!(calls.get(), 1);

        cache.invalidate();
        assert!(cache.get().is_none());
        resolve_repository(None, None, &mut cache, lookup).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_invalidate_picks_up_a_changed_origin() {
        let mut cache = SessionCache::new();
        let origins = RefCell::new(vec!["second/repo", "first/repo"]);
        let lookup = || {
            let origin = origins.borrow_mut().pop().unwrap();
            origin.parse::<Repository>()
        };

        let before = resolve_repository(None, None, &mut cache, lookup).unwrap();
        let cached = resolve_repository(None, None, &mut cache, lookup).unwrap();
        cache.invalidate();
        let after = resolve_repository(None, None, &mut cache, lookup).unwrap();

        assert_eq!(before.to_string(), "first/repo");
        assert_eq!(cached.to_string(), "first/repo");
        assert_eq!(after.to_string(), "second/repo");
    }

    #[test]
    fn test_failed_lookup_is_not_cached() {
        let mut cache: SessionCache<Repository> = SessionCache::new();
        let result = resolve_repository(None, None, &mut cache, || Err(anyhow::anyhow!("no git")));
        assert!(result.is_err());
        assert!(cache.get().is_none());
    }
}
