//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The interpreter in [`crate::github`] executes them against the real API;
//! tests substitute recording mocks.

use serde::{Deserialize, Serialize};

use crate::types::{LivePrState, PrNumber};

/// A GitHub API effect.
///
/// Each variant describes a GitHub API operation. Effects are repo-scoped:
/// the interpreter is constructed with a `RepoId`, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Queries ──────────────────────────────────────────────────────────────
    /// Fetch the live reviewer and assignee state of a PR.
    GetPr { pr: PrNumber },

    /// List logins of users with access to the repository.
    ListCollaborators,

    /// List slugs of teams with access to the repository.
    ListRepoTeams,

    /// List the issue-event history of a PR, oldest first.
    ListIssueEvents { pr: PrNumber },

    /// Find the account whose public or verified email matches.
    SearchUserByEmail { email: String },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Add assignees to a PR.
    AddAssignees { pr: PrNumber, logins: Vec<String> },

    /// Request reviews from users and teams.
    RequestReviewers {
        pr: PrNumber,
        users: Vec<String>,
        teams: Vec<String>,
    },

    /// Withdraw review requests from users and teams.
    RemoveReviewers {
        pr: PrNumber,
        users: Vec<String>,
        teams: Vec<String>,
    },
}

impl GitHubEffect {
    /// Returns true if this effect changes state on GitHub.
    ///
    /// Mutations are never retried and any failure is fatal for the run.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            GitHubEffect::AddAssignees { .. }
                | GitHubEffect::RequestReviewers { .. }
                | GitHubEffect::RemoveReviewers { .. }
        )
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// The kind of an issue event, restricted to the ones reconciliation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueEventKind {
    /// A review was requested from a user or team.
    ReviewRequested,
    /// A review request was withdrawn.
    ReviewRequestRemoved,
    /// Any other event (labeled, assigned, ...).
    Other,
}

impl IssueEventKind {
    /// Maps the API's `event` string.
    pub fn from_api_str(s: &str) -> Self {
        match s {
            "review_requested" => IssueEventKind::ReviewRequested,
            "review_request_removed" => IssueEventKind::ReviewRequestRemoved,
            _ => IssueEventKind::Other,
        }
    }
}

/// The account that performed an issue event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorData {
    pub login: String,
    /// Whether the account type is `Bot`.
    pub is_bot: bool,
}

impl ActorData {
    /// Returns true for bot accounts, by type or by the `[bot]` login suffix.
    pub fn is_automation(&self) -> bool {
        self.is_bot || self.login.ends_with("[bot]")
    }
}

/// One entry of a PR's issue-event history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueEventData {
    pub kind: IssueEventKind,
    /// `None` for events by deleted ("ghost") accounts.
    pub actor: Option<ActorData>,
    /// Login of the user whose review was requested or withdrawn.
    pub requested_reviewer: Option<String>,
    /// Slug of the team whose review was requested or withdrawn.
    pub requested_team: Option<String>,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPr`.
    Pr(LivePrState),

    /// Response to `ListCollaborators`.
    Collaborators(Vec<String>),

    /// Response to `ListRepoTeams`.
    RepoTeams(Vec<String>),

    /// Response to `ListIssueEvents`.
    IssueEvents(Vec<IssueEventData>),

    /// Response to `SearchUserByEmail`: the first matching login, if any.
    UserSearch(Option<String>),

    /// Response to `AddAssignees`.
    AssigneesAdded,

    /// Response to `RequestReviewers`.
    ReviewersRequested,

    /// Response to `RemoveReviewers`.
    ReviewersRemoved,
}
