use crate::github::client::DEFAULT_API_URL;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Configuration keys enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Repository,
    MaxDepth,
    ApiUrl,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Repository => "repository",
            ConfigKey::MaxDepth => "maxDepth",
            ConfigKey::ApiUrl => "apiUrl",
        }
    }

    /// Get all config keys
    pub fn all() -> &'static [ConfigKey] {
        &[ConfigKey::Repository, ConfigKey::MaxDepth, ConfigKey::ApiUrl]
    }
}

/// Filename for the project-specific configuration within the .issuedag directory.
pub const PROJECT_CONFIG_FILENAME: &str = "config.json";
/// Directory name for project-specific configuration.
pub const PROJECT_CONFIG_DIR: &str = ".issuedag";

/// Parses a JSON configuration file content into a map of configuration values.
///
/// - Returns an empty HashMap if `content` is empty or contains only whitespace.
/// - Keys other than those in [`ConfigKey::all`] are ignored.
/// - Returns an `Err` if the JSON is invalid or is not an object.
pub fn parse_config(content: &[u8]) -> Result<HashMap<ConfigKey, Value>> {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(HashMap::new());
    }

    let value: Value = serde_json::from_slice(content).context("Failed to parse config JSON")?;

    let mut config_map = HashMap::new();

    if let Value::Object(map) = &value {
        for key in ConfigKey::all() {
            if let Some(val) = map.get(key.as_str()) {
                config_map.insert(*key, val.clone());
            }
        }
        return Ok(config_map);
    }

    Err(anyhow::anyhow!("Config must be a JSON object"))
}

/// Reads `.issuedag/config.json` under `dir`; a missing file is an empty config.
pub fn load_project_config(dir: &Path) -> Result<HashMap<ConfigKey, Value>> {
    let path = dir.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILENAME);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Merges `updates` into `base_config` and returns a new configuration map.
///
/// If a key exists in both, the value from `updates` wins. `base_config` is
/// left untouched.
pub fn update_config(
    base_config: &HashMap<ConfigKey, Value>,
    updates: &HashMap<ConfigKey, Value>,
) -> HashMap<ConfigKey, Value> {
    let mut new_config = base_config.clone();
    for (key, value) in updates {
        new_config.insert(*key, value.clone());
    }
    new_config
}

/// Typed view of a merged configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repository: Option<String>,
    /// `-1` means unlimited.
    pub max_depth: i64,
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            repository: None,
            max_depth: -1,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &HashMap<ConfigKey, Value>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(value) = config.get(&ConfigKey::Repository) {
            settings.repository = Some(
                value
                    .as_str()
                    .context("'repository' must be a string like \"owner/repo\"")?
                    .to_string(),
            );
        }
        if let Some(value) = config.get(&ConfigKey::MaxDepth) {
            settings.max_depth = value
                .as_i64()
                .filter(|depth| *depth >= -1)
                .context("'maxDepth' must be an integer >= -1")?;
        }
        if let Some(value) = config.get(&ConfigKey::ApiUrl) {
            settings.api_url = value
                .as_str()
                .context("'apiUrl' must be a string")?
                .to_string();
        }

        Ok(settings)
    }
}
