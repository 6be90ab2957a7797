//! Action configuration from the GitHub Actions environment.
//!
//! Inputs declared in the action's metadata arrive as `INPUT_<NAME>`
//! variables; the runner itself provides the `GITHUB_*` ones.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fallback token variable when the `token` input isn't set.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Errors while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to something we can't interpret.
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything a run needs from its environment.
#[derive(Clone)]
pub struct ActionConfig {
    /// API token; `INPUT_TOKEN`, falling back to `GITHUB_TOKEN`.
    pub token: String,
    /// Path to the event payload (`GITHUB_EVENT_PATH`).
    pub event_path: PathBuf,
    /// Name of the triggering event (`GITHUB_EVENT_NAME`).
    pub event_name: String,
    /// Location of the REVIEWERS file, tried before the default locations.
    pub reviewers_path: Option<String>,
    /// Git working directory (`GITHUB_WORKSPACE`, default `.`).
    pub workspace: PathBuf,
    /// Log mutations instead of sending them.
    pub dry_run: bool,
    /// API base URL for GitHub Enterprise Server.
    pub api_url: Option<String>,
}

impl fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("token", &"<redacted>")
            .field("event_path", &self.event_path)
            .field("event_name", &self.event_name)
            .field("reviewers_path", &self.reviewers_path)
            .field("workspace", &self.workspace)
            .field("dry_run", &self.dry_run)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Parses an action boolean input. Unset or empty means false.
fn parse_bool(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}

impl ActionConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token = get("INPUT_TOKEN")
            .or_else(|| get(GITHUB_TOKEN_VAR))
            .ok_or(ConfigError::Missing("INPUT_TOKEN"))?;
        let event_path = get("GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("GITHUB_EVENT_PATH"))?;
        let event_name = get("GITHUB_EVENT_NAME").ok_or(ConfigError::Missing("GITHUB_EVENT_NAME"))?;

        Ok(ActionConfig {
            token,
            event_path,
            event_name,
            reviewers_path: get("INPUT_REVIEWERS_PATH"),
            workspace: get("GITHUB_WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            dry_run: parse_bool("INPUT_DRY_RUN", lookup("INPUT_DRY_RUN"))?,
            api_url: get("GITHUB_API_URL"),
        })
    }
}
