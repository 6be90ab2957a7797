//! Pull request state as seen by a single reconciliation run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::{PrNumber, Sha};

/// A read-only view of the PR fields reconciliation depends on.
///
/// Built from the triggering event and optionally refreshed from the live PR
/// (see [`PullRequestState::refresh`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestState {
    /// The PR number.
    pub number: PrNumber,
    /// The PR author's login.
    pub author: String,
    /// Whether the PR is a draft.
    pub is_draft: bool,
    /// Logins currently assigned to the PR.
    pub assignees: BTreeSet<String>,
    /// Users whose review is currently requested.
    pub requested_users: BTreeSet<String>,
    /// Team slugs whose review is currently requested.
    pub requested_teams: BTreeSet<String>,
    /// The base branch name.
    pub base_ref: String,
    /// The head commit of the PR.
    pub head_sha: Sha,
    /// Number of commits in the PR.
    pub commit_count: u64,
}

/// Live reviewer and assignee state fetched from the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePrState {
    pub is_draft: bool,
    pub assignees: BTreeSet<String>,
    pub requested_users: BTreeSet<String>,
    pub requested_teams: BTreeSet<String>,
}

impl PullRequestState {
    /// Returns true if the author is already one of the assignees.
    pub fn author_is_assigned(&self) -> bool {
        self.assignees.contains(&self.author)
    }

    /// Revision expression for the PR's base commit: `<head>~<commits>`.
    pub fn base_revision(&self) -> String {
        self.head_sha.ancestor(self.commit_count)
    }

    /// Replaces the mutable reviewer/assignee fields with their live values.
    pub fn refresh(&mut self, live: LivePrState) {
        self.is_draft = live.is_draft;
        self.assignees = live.assignees;
        self.requested_users = live.requested_users;
        self.requested_teams = live.requested_teams;
    }
}
