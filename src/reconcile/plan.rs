//! The reviewer changes a run intends to make, and how they become API calls.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::effects::GitHubEffect;
use crate::types::{PullRequestState, ReviewerSet};

/// Reviewer additions and removals for one PR.
///
/// Within users (and within teams) an identity is never both added and
/// removed: additions come from `required - current`, removals from
/// `current - required`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPlan {
    /// Users and teams to request reviews from.
    pub add: ReviewerSet,
    /// Users and teams whose review requests should be withdrawn.
    pub remove: ReviewerSet,
}

impl ReviewPlan {
    /// Returns true if the plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    pub fn has_removals(&self) -> bool {
        !self.remove.is_empty()
    }

    /// Drops additions that GitHub would reject because the identity has no
    /// access to the repository. Returns what was dropped.
    pub fn retain_collaborators(
        &mut self,
        collaborators: &BTreeSet<String>,
        teams_with_access: &BTreeSet<String>,
    ) -> ReviewerSet {
        let mut dropped = ReviewerSet::new();

        self.add.users.retain(|login| {
            let keep = collaborators.contains(login);
            if !keep {
                warn!(login = %login, "not a collaborator, skipping review request");
                dropped.users.insert(login.clone());
            }
            keep
        });

        self.add.teams.retain(|slug| {
            let keep = teams_with_access.contains(slug);
            if !keep {
                warn!(team = %slug, "team has no access to the repository, skipping review request");
                dropped.teams.insert(slug.clone());
            }
            keep
        });

        dropped
    }

    /// The mutations that carry out this plan, in the order they must run.
    ///
    /// The author is assigned first if they aren't already; then one combined
    /// request call and one combined removal call, each only if non-empty.
    pub fn to_effects(&self, pr: &PullRequestState) -> Vec<GitHubEffect> {
        let mut effects = Vec::with_capacity(3);

        if !pr.author_is_assigned() {
            effects.push(GitHubEffect::AddAssignees {
                pr: pr.number,
                logins: vec![pr.author.clone()],
            });
        }

        if !self.add.is_empty() {
            effects.push(GitHubEffect::RequestReviewers {
                pr: pr.number,
                users: self.add.users.iter().cloned().collect(),
                teams: self.add.teams.iter().cloned().collect(),
            });
        }

        if !self.remove.is_empty() {
            effects.push(GitHubEffect::RemoveReviewers {
                pr: pr.number,
                users: self.remove.users.iter().cloned().collect(),
                teams: self.remove.teams.iter().cloned().collect(),
            });
        }

        effects
    }
}
