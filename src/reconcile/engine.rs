//! The pure part of reconciliation: from changed files and ownership rules to
//! a [`ReviewPlan`].
//!
//! Nothing here talks to git or GitHub. Owner pools are collected from
//! already-resolved [`OwnershipSnapshot`]s, identities are resolved through an
//! [`IdentityResolver`], and the add/remove sets are plain set arithmetic.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::ownership::OwnershipSnapshot;
use crate::types::{OwnerEntry, PullRequestState, ReviewerSet};

use super::identity::{EmailLookup, IdentityResolver};
use super::plan::ReviewPlan;

/// Unresolved owner entries gathered for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerPools {
    /// CODEOWNERS entries for the changed files.
    pub code_owners: BTreeSet<OwnerEntry>,
    /// REVIEWERS entries for the changed files.
    pub reviewers: BTreeSet<OwnerEntry>,
    /// Everyone involved in a file whose ownership the PR reassigns.
    pub changed_owners: BTreeSet<OwnerEntry>,
}

/// Returns true if any of the ownership files (at either revision) is among
/// the changed files.
pub fn ownership_files_changed(
    changed: &[String],
    before: &OwnershipSnapshot,
    after: &OwnershipSnapshot,
) -> bool {
    changed
        .iter()
        .any(|path| before.is_source(path) || after.is_source(path))
}

/// Owners of each changed file under `after`, unioned across files.
pub fn direct_owners(
    changed: &[String],
    after: &OwnershipSnapshot,
) -> (BTreeSet<OwnerEntry>, BTreeSet<OwnerEntry>) {
    let mut code_owners = BTreeSet::new();
    let mut reviewers = BTreeSet::new();
    for path in changed {
        code_owners.extend(after.codeowners.owners.of(path));
        reviewers.extend(after.reviewers.owners.of(path));
    }
    (code_owners, reviewers)
}

/// Collects the owners of every file whose ownership differs between
/// `before` and `after`.
///
/// For each such file all four sets (owners and reviewers, before and after)
/// are added, so people losing, gaining and already holding responsibility
/// are all notified.
pub fn amplify(
    before: &OwnershipSnapshot,
    after: &OwnershipSnapshot,
    files_before: &[String],
    files_after: &[String],
) -> BTreeSet<OwnerEntry> {
    let all_files: BTreeSet<&str> = files_before
        .iter()
        .chain(files_after)
        .map(String::as_str)
        .collect();

    let mut changed_owners = BTreeSet::new();
    let mut reassigned = 0usize;

    for path in all_files {
        let owners_before = before.codeowners.owners.of(path);
        let owners_after = after.codeowners.owners.of(path);
        let reviewers_before = before.reviewers.owners.of(path);
        let reviewers_after = after.reviewers.owners.of(path);

        if owners_before == owners_after && reviewers_before == reviewers_after {
            continue;
        }

        debug!(path, "ownership reassigned");
        reassigned += 1;
        changed_owners.extend(owners_before);
        changed_owners.extend(owners_after);
        changed_owners.extend(reviewers_before);
        changed_owners.extend(reviewers_after);
    }

    if reassigned > 0 {
        info!(
            files = reassigned,
            owners = changed_owners.len(),
            "ownership files changed, notifying affected owners"
        );
    }

    changed_owners
}

/// Steps A and B: direct owners of the changed files, plus amplification when
/// the PR edits an ownership file.
pub fn collect_owner_pools(
    changed: &[String],
    before: &OwnershipSnapshot,
    after: &OwnershipSnapshot,
    files_before: &[String],
    files_after: &[String],
) -> OwnerPools {
    let (code_owners, reviewers) = direct_owners(changed, after);

    let changed_owners = if ownership_files_changed(changed, before, after) {
        amplify(before, after, files_before, files_after)
    } else {
        BTreeSet::new()
    };

    OwnerPools {
        code_owners,
        reviewers,
        changed_owners,
    }
}

/// Owner pools after identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOwners {
    pub code_owners: ReviewerSet,
    /// Reviewers, including everyone from the changed-owners pool.
    pub reviewers: ReviewerSet,
}

impl ResolvedOwners {
    /// Resolves all three pools. Changed owners are merged into the reviewers,
    /// never into the code owners.
    pub async fn resolve<L: EmailLookup>(
        pools: &OwnerPools,
        identities: &mut IdentityResolver<L>,
    ) -> Self {
        let code_owners = identities.resolve(&pools.code_owners).await;
        let mut reviewers = identities.resolve(&pools.reviewers).await;
        reviewers.extend(identities.resolve(&pools.changed_owners).await);
        Self {
            code_owners,
            reviewers,
        }
    }
}

/// Steps C and D: drop the author, then diff the required reviewers against
/// those currently requested. Code owners are neither added nor removed.
pub fn compute_plan(owners: &ResolvedOwners, pr: &PullRequestState) -> ReviewPlan {
    let mut user_reviewers = owners.reviewers.users.clone();
    user_reviewers.remove(&pr.author);

    let code_users = &owners.code_owners.users;
    let code_teams = &owners.code_owners.teams;
    let team_reviewers = &owners.reviewers.teams;

    let add = ReviewerSet {
        users: user_reviewers
            .difference(&pr.requested_users)
            .filter(|u| !code_users.contains(*u))
            .cloned()
            .collect(),
        teams: team_reviewers
            .difference(&pr.requested_teams)
            .filter(|t| !code_teams.contains(*t))
            .cloned()
            .collect(),
    };

    let remove = ReviewerSet {
        users: pr
            .requested_users
            .difference(&user_reviewers)
            .filter(|u| !code_users.contains(*u))
            .cloned()
            .collect(),
        teams: pr
            .requested_teams
            .difference(team_reviewers)
            .filter(|t| !code_teams.contains(*t))
            .cloned()
            .collect(),
    };

    ReviewPlan { add, remove }
}
