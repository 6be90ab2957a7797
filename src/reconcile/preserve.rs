//! Keeping reviewers that a human requested by hand.
//!
//! The PR's issue-event history records every review request and withdrawal.
//! Replaying the human-initiated ones gives a net count per reviewer; a
//! positive count means someone asked for that review on purpose, so the bot
//! must not withdraw it even though no ownership rule names the reviewer.

use std::collections::BTreeMap;

use tracing::info;

use crate::effects::{IssueEventData, IssueEventKind};
use crate::types::ReviewerSet;

use super::plan::ReviewPlan;

/// Who a review request was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestTarget {
    User(String),
    Team(String),
}

/// Net human review requests per target: `+1` per request, `-1` per withdrawal.
///
/// Events by bots, by deleted accounts, and of other kinds are ignored.
pub fn manual_request_tally(events: &[IssueEventData]) -> BTreeMap<RequestTarget, i64> {
    let mut tally = BTreeMap::new();

    for event in events {
        let delta = match event.kind {
            IssueEventKind::ReviewRequested => 1,
            IssueEventKind::ReviewRequestRemoved => -1,
            IssueEventKind::Other => continue,
        };

        let human = event
            .actor
            .as_ref()
            .is_some_and(|actor| !actor.is_automation());
        if !human {
            continue;
        }

        let target = match (&event.requested_reviewer, &event.requested_team) {
            (Some(login), _) => RequestTarget::User(login.clone()),
            (None, Some(slug)) => RequestTarget::Team(slug.clone()),
            (None, None) => continue,
        };

        *tally.entry(target).or_insert(0) += delta;
    }

    tally
}

/// Users and teams with a strictly positive net manual request count.
pub fn manually_requested(events: &[IssueEventData]) -> ReviewerSet {
    let mut set = ReviewerSet::new();
    for (target, count) in manual_request_tally(events) {
        if count <= 0 {
            continue;
        }
        match target {
            RequestTarget::User(login) => {
                set.users.insert(login);
            }
            RequestTarget::Team(slug) => {
                set.teams.insert(slug);
            }
        }
    }
    set
}

/// Removes manually requested reviewers from the plan's removals.
///
/// Returns the reviewers that were spared.
pub fn preserve_manual_requests(plan: &mut ReviewPlan, events: &[IssueEventData]) -> ReviewerSet {
    let manual = manually_requested(events);
    let mut kept = ReviewerSet::new();

    plan.remove.users.retain(|login| {
        let spare = manual.users.contains(login);
        if spare {
            info!(login = %login, "keeping manually requested reviewer");
            kept.users.insert(login.clone());
        }
        !spare
    });

    plan.remove.teams.retain(|slug| {
        let spare = manual.teams.contains(slug);
        if spare {
            info!(team = %slug, "keeping manually requested team");
            kept.teams.insert(slug.clone());
        }
        !spare
    });

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ActorData;
    use std::collections::BTreeSet;

    fn event(kind: IssueEventKind, actor: &str, reviewer: &str) -> IssueEventData {
        IssueEventData {
            kind,
            actor: Some(ActorData {
                login: actor.to_string(),
                is_bot: false,
            }),
            requested_reviewer: Some(reviewer.to_string()),
            requested_team: None,
        }
    }

    fn team_event(kind: IssueEventKind, actor: &str, slug: &str) -> IssueEventData {
        IssueEventData {
            requested_reviewer: None,
            requested_team: Some(slug.to_string()),
            ..event(kind, actor, "")
        }
    }

    fn removal_plan(users: &[&str], teams: &[&str]) -> ReviewPlan {
        ReviewPlan {
            add: ReviewerSet::default(),
            remove: ReviewerSet {
                users: users.iter().map(|s| s.to_string()).collect(),
                teams: teams.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    use IssueEventKind::{Other, ReviewRequestRemoved, ReviewRequested};

    #[test]
    fn single_manual_request_is_kept() {
        let events = vec![event(ReviewRequested, "maintainer", "carol")];
        let mut plan = removal_plan(&["carol", "dave"], &[]);

        let kept = preserve_manual_requests(&mut plan, &events);

        assert_eq!(kept.users, ["carol".to_string()].into());
        assert_eq!(plan.remove.users, ["dave".to_string()].into());
    }

    #[test]
    fn request_then_removal_nets_to_zero() {
        let events = vec![
            event(ReviewRequested, "maintainer", "carol"),
            event(ReviewRequestRemoved, "maintainer", "carol"),
        ];
        let mut plan = removal_plan(&["carol"], &[]);

        assert!(preserve_manual_requests(&mut plan, &events).is_empty());
        assert_eq!(plan.remove.users, ["carol".to_string()].into());
    }

    #[test]
    fn re_request_after_removal_is_kept() {
        let events = vec![
            event(ReviewRequested, "maintainer", "carol"),
            event(ReviewRequestRemoved, "maintainer", "carol"),
            event(ReviewRequested, "maintainer", "carol"),
        ];
        assert_eq!(
            manual_request_tally(&events).get(&RequestTarget::User("carol".to_string())),
            Some(&1)
        );
    }

    #[test]
    fn bot_events_are_ignored() {
        let mut bot_by_type = event(ReviewRequested, "automation", "carol");
        if let Some(actor) = bot_by_type.actor.as_mut() {
            actor.is_bot = true;
        }
        let events = vec![
            bot_by_type,
            event(ReviewRequested, "github-actions[bot]", "carol"),
        ];
        assert!(manual_request_tally(&events).is_empty());
    }

    #[test]
    fn ghost_actor_is_ignored() {
        let mut ghost = event(ReviewRequested, "", "carol");
        ghost.actor = None;
        assert!(manual_request_tally(&[ghost]).is_empty());
    }

    #[test]
    fn bot_removal_does_not_cancel_human_request() {
        let events = vec![
            event(ReviewRequested, "maintainer", "carol"),
            event(ReviewRequestRemoved, "github-actions[bot]", "carol"),
        ];
        assert_eq!(manually_requested(&events).users, ["carol".to_string()].into());
    }

    #[test]
    fn other_events_are_ignored() {
        let events = vec![event(Other, "maintainer", "carol")];
        assert!(manual_request_tally(&events).is_empty());
    }

    #[test]
    fn team_requests_are_tallied_separately() {
        let events = vec![
            team_event(ReviewRequested, "maintainer", "core"),
            event(ReviewRequested, "maintainer", "core"),
            event(ReviewRequestRemoved, "maintainer", "core"),
        ];
        let manual = manually_requested(&events);
        assert_eq!(manual.teams, ["core".to_string()].into());
        assert_eq!(manual.users, BTreeSet::new());

        let mut plan = removal_plan(&["core"], &["core"]);
        preserve_manual_requests(&mut plan, &events);
        assert_eq!(plan.remove.users, ["core".to_string()].into());
        assert!(plan.remove.teams.is_empty());
    }
}
