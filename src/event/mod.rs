//! The triggering pull-request event.
//!
//! GitHub Actions writes the event payload to the file named by
//! `GITHUB_EVENT_PATH`. [`load_event`] reads it and [`parse_event`] validates
//! the fields reconciliation needs into a [`PullRequestEvent`].

pub mod parser;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{PullRequestState, RepoId};

pub use parser::{EventError, parse_event};

/// Event names this action handles.
pub const SUPPORTED_EVENTS: [&str; 2] = ["pull_request", "pull_request_target"];

/// A validated pull-request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The event action (`opened`, `synchronize`, ...). Not interpreted.
    pub action: String,
    /// The base repository.
    pub repo: RepoId,
    /// Clone URL of the base repository, used as the fetch remote.
    pub remote_url: String,
    /// The PR as described by the payload.
    pub pr: PullRequestState,
}

/// Reads and parses the event file at `path`.
pub fn load_event(event_name: &str, path: &Path) -> Result<PullRequestEvent, EventError> {
    let payload = std::fs::read(path).map_err(|source| EventError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), bytes = payload.len(), "read event payload");
    parse_event(event_name, &payload)
}
