//! Pull-request event payload parser.
//!
//! Raw structs mirror GitHub's JSON with `Option` on every field we require,
//! so a missing field is reported by its dotted path rather than as a serde
//! message. Fields we don't use are ignored.

use std::collections::BTreeSet;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{PrNumber, PullRequestState, RepoId, Sha};

use super::{PullRequestEvent, SUPPORTED_EVENTS};

/// Error type for event loading failures.
#[derive(Debug, Error)]
pub enum EventError {
    /// The event file could not be read.
    #[error("failed to read event file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON deserialization failed.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A required field is absent or null.
    #[error("event payload is missing {0}")]
    MissingField(&'static str),

    /// Field has an invalid value (e.g. malformed SHA or repository name).
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    /// The workflow was triggered by something other than a pull request.
    #[error("unsupported event {0:?}, expected pull_request or pull_request_target")]
    UnsupportedEvent(String),
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    action: Option<String>,
    repository: Option<RawRepository>,
    pull_request: Option<RawPullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    draft: Option<bool>,
    commits: Option<u64>,
    user: Option<RawUser>,
    base: Option<RawBase>,
    head: Option<RawHead>,
    assignees: Option<Vec<RawUser>>,
    requested_reviewers: Option<Vec<RawUser>>,
    requested_teams: Option<Vec<RawTeam>>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct RawBase {
    #[serde(rename = "ref")]
    ref_name: Option<String>,
    repo: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: Option<String>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, EventError> {
    value.ok_or(EventError::MissingField(field))
}

fn logins(users: Vec<RawUser>) -> BTreeSet<String> {
    users.into_iter().map(|u| u.login).collect()
}

/// Parses the payload of a `pull_request` or `pull_request_target` event.
pub fn parse_event(event_name: &str, payload: &[u8]) -> Result<PullRequestEvent, EventError> {
    if !SUPPORTED_EVENTS.contains(&event_name) {
        return Err(EventError::UnsupportedEvent(event_name.to_string()));
    }

    let raw: RawPayload = serde_json::from_slice(payload)?;

    let action = required(raw.action, "action")?;
    let repository = required(raw.repository, "repository")?;
    let full_name = required(repository.full_name, "repository.full_name")?;
    let repo = RepoId::from_full_name(&full_name).ok_or_else(|| EventError::InvalidField {
        field: "repository.full_name",
        value: full_name.clone(),
    })?;

    let pr = required(raw.pull_request, "pull_request")?;
    let number = required(pr.number, "pull_request.number")?;
    let is_draft = required(pr.draft, "pull_request.draft")?;
    let commit_count = required(pr.commits, "pull_request.commits")?;
    let author = required(pr.user, "pull_request.user")?.login;

    let base = required(pr.base, "pull_request.base")?;
    let base_ref = required(base.ref_name, "pull_request.base.ref")?;
    let remote_url = required(
        required(base.repo, "pull_request.base.repo")?.html_url,
        "pull_request.base.repo.html_url",
    )?;

    let head = required(pr.head, "pull_request.head")?;
    let raw_sha = required(head.sha, "pull_request.head.sha")?;
    let head_sha = Sha::parse(&raw_sha).map_err(|_| EventError::InvalidField {
        field: "pull_request.head.sha",
        value: raw_sha.clone(),
    })?;

    let assignees = logins(required(pr.assignees, "pull_request.assignees")?);
    let requested_users = logins(required(
        pr.requested_reviewers,
        "pull_request.requested_reviewers",
    )?);
    let requested_teams = required(pr.requested_teams, "pull_request.requested_teams")?
        .into_iter()
        .map(|t| t.slug)
        .collect();

    Ok(PullRequestEvent {
        action,
        repo,
        remote_url,
        pr: PullRequestState {
            number: PrNumber(number),
            author,
            is_draft,
            assignees,
            requested_users,
            requested_teams,
            base_ref,
            head_sha,
            commit_count,
        },
    })
}
