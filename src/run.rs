//! One reconciliation run, from event payload to applied reviewer changes.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{ActionConfig, ConfigError};
use crate::diff::{self, DiffError};
use crate::effects::{
    GitHubEffect, GitHubInterpreter, GitHubResponse, GitInterpreter, IssueEventData,
};
use crate::event::{self, EventError, PullRequestEvent};
use crate::git::{GitError, GitRepo};
use crate::github::{GitHubApiError, LoggingGitHubInterpreter, OctocrabClient, effect_name};
use crate::ownership::OwnershipSnapshot;
use crate::reconcile::{
    GitHubEmailLookup, IdentityResolver, ResolvedOwners, ReviewPlan, collect_owner_pools,
    compute_plan, ownership_files_changed, preserve_manual_requests,
};

/// Fatal errors. Each one fails the workflow run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    GitHub(#[from] GitHubApiError),

    /// The GitHub client could not be built (bad token or API URL).
    #[error("failed to create GitHub client: {0}")]
    Client(#[source] octocrab::Error),

    /// The interpreter answered with a response for a different effect.
    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse {
        effect: &'static str,
        response: String,
    },
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The PR is a draft; nothing was done.
    SkippedDraft,
    /// The plan that was applied (or logged, in a dry run).
    Reconciled(ReviewPlan),
}

fn unexpected(effect: &GitHubEffect, response: GitHubResponse) -> RunError {
    RunError::UnexpectedResponse {
        effect: effect_name(effect),
        response: format!("{:?}", response),
    }
}

/// Sends `effect`, failing the run on any error.
async fn send<H>(github: &H, effect: GitHubEffect) -> Result<GitHubResponse, RunError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    Ok(github.interpret(effect).await?)
}

async fn issue_events<H>(github: &H, effect: GitHubEffect) -> Result<Vec<IssueEventData>, RunError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    match send(github, effect.clone()).await? {
        GitHubResponse::IssueEvents(events) => Ok(events),
        other => Err(unexpected(&effect, other)),
    }
}

async fn collaborators<H>(github: &H) -> Result<BTreeSet<String>, RunError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::ListCollaborators;
    match send(github, effect.clone()).await? {
        GitHubResponse::Collaborators(logins) => Ok(logins.into_iter().collect()),
        other => Err(unexpected(&effect, other)),
    }
}

/// Teams with access to the repository.
///
/// Listing teams needs organization read access that workflow tokens often
/// lack. A permanent failure is logged and yields no teams, so team requests
/// are dropped rather than rejected by the API.
async fn repo_teams<H>(github: &H) -> Result<BTreeSet<String>, RunError>
where
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let effect = GitHubEffect::ListRepoTeams;
    match github.interpret(effect.clone()).await {
        Ok(GitHubResponse::RepoTeams(slugs)) => Ok(slugs.into_iter().collect()),
        Ok(other) => Err(unexpected(&effect, other)),
        Err(e) if !e.is_transient() => {
            warn!(error = %e, "cannot list repository teams, skipping team review requests");
            Ok(BTreeSet::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reconciles the reviewers of the PR described by `event`.
#[instrument(skip_all, fields(repo = %event.repo, pr = %event.pr.number))]
pub async fn reconcile<G, H>(
    git: &G,
    github: &H,
    event: PullRequestEvent,
    reviewers_override: Option<&str>,
) -> Result<RunOutcome, RunError>
where
    G: GitInterpreter<Error = GitError>,
    H: GitHubInterpreter<Error = GitHubApiError>,
{
    let PullRequestEvent {
        action,
        remote_url,
        mut pr,
        ..
    } = event;
    info!(
        action = %action,
        author = %pr.author,
        base = %pr.base_ref,
        "reconciling reviewers"
    );

    if pr.is_draft {
        info!("pull request is a draft, nothing to do");
        return Ok(RunOutcome::SkippedDraft);
    }

    let get_pr = GitHubEffect::GetPr { pr: pr.number };
    match send(github, get_pr.clone()).await? {
        GitHubResponse::Pr(live) => pr.refresh(live),
        other => return Err(unexpected(&get_pr, other)),
    }
    if pr.is_draft {
        info!("pull request was converted to a draft, nothing to do");
        return Ok(RunOutcome::SkippedDraft);
    }

    let changes = diff::resolve_changes(git, &remote_url, &pr).await?;
    let after = OwnershipSnapshot::resolve(git, &changes.head, reviewers_override).await;
    let before = OwnershipSnapshot::resolve(git, &changes.base, reviewers_override).await;

    let (files_before, files_after) = if ownership_files_changed(&changes.changed, &before, &after)
    {
        (
            diff::list_files(git, &changes.base).await?,
            diff::list_files(git, &changes.head).await?,
        )
    } else {
        (Vec::new(), Vec::new())
    };

    let pools = collect_owner_pools(
        &changes.changed,
        &before,
        &after,
        &files_before,
        &files_after,
    );

    let mut identities = IdentityResolver::new(GitHubEmailLookup::new(github));
    let owners = ResolvedOwners::resolve(&pools, &mut identities).await;
    let mut plan = compute_plan(&owners, &pr);

    if plan.has_removals() {
        let events = issue_events(github, GitHubEffect::ListIssueEvents { pr: pr.number }).await?;
        preserve_manual_requests(&mut plan, &events);
    }

    if !plan.add.is_empty() {
        let users = if plan.add.users.is_empty() {
            BTreeSet::new()
        } else {
            collaborators(github).await?
        };
        let teams = if plan.add.teams.is_empty() {
            BTreeSet::new()
        } else {
            repo_teams(github).await?
        };
        plan.retain_collaborators(&users, &teams);
    }

    for effect in plan.to_effects(&pr) {
        let name = effect_name(&effect);
        let response = send(github, effect.clone()).await?;
        let acknowledged = matches!(
            (&effect, &response),
            (GitHubEffect::AddAssignees { .. }, GitHubResponse::AssigneesAdded)
                | (GitHubEffect::RequestReviewers { .. }, GitHubResponse::ReviewersRequested)
                | (GitHubEffect::RemoveReviewers { .. }, GitHubResponse::ReviewersRemoved)
        );
        if !acknowledged {
            return Err(unexpected(&effect, response));
        }
        info!(operation = name, "applied");
    }

    info!(
        added_users = ?plan.add.users,
        added_teams = ?plan.add.teams,
        removed_users = ?plan.remove.users,
        removed_teams = ?plan.remove.teams,
        emails_looked_up = identities.cached_emails(),
        "reviewers reconciled"
    );
    Ok(RunOutcome::Reconciled(plan))
}

/// Runs the action with the given configuration.
pub async fn run(config: &ActionConfig) -> Result<RunOutcome, RunError> {
    let event = event::load_event(&config.event_name, &config.event_path)?;
    let git = GitRepo::open_or_init(&config.workspace)?;
    let client = OctocrabClient::from_token(
        config.token.clone(),
        event.repo.clone(),
        config.api_url.as_deref(),
    )
    .map_err(RunError::Client)?;
    let reviewers_override = config.reviewers_path.as_deref();

    if config.dry_run {
        info!("dry run: mutations will be logged, not sent");
        let github = LoggingGitHubInterpreter::new(client);
        reconcile(&git, &github, event, reviewers_override).await
    } else {
        reconcile(&git, &client, event, reviewers_override).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ActorData, GitEffect, GitResponse, IssueEventKind};
    use crate::types::{LivePrState, PrNumber, PullRequestState, RepoId, Sha};
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    fn head() -> String {
        "d".repeat(40)
    }

    fn base() -> String {
        format!("{}~1", head())
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ─── Mock git ────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct MockGit {
        changed: Vec<String>,
        blobs: HashMap<(String, String), String>,
        files: HashMap<String, Vec<String>>,
        effects: Mutex<Vec<GitEffect>>,
    }

    impl MockGit {
        fn changed(mut self, paths: &[&str]) -> Self {
            self.changed = paths.iter().map(|s| s.to_string()).collect();
            self
        }

        fn blob(mut self, rev: &str, path: &str, text: &str) -> Self {
            self.blobs
                .insert((rev.to_string(), path.to_string()), text.to_string());
            self
        }

        fn files(mut self, rev: &str, paths: &[&str]) -> Self {
            self.files
                .insert(rev.to_string(), paths.iter().map(|s| s.to_string()).collect());
            self
        }
    }

    impl GitInterpreter for MockGit {
        type Error = GitError;

        fn interpret(
            &self,
            effect: GitEffect,
        ) -> impl Future<Output = Result<GitResponse, Self::Error>> + Send {
            self.effects.lock().unwrap().push(effect.clone());
            let response = match effect {
                GitEffect::Fetch { .. } => GitResponse::Fetched,
                GitEffect::Diff { .. } => GitResponse::Paths(self.changed.clone()),
                GitEffect::ListFiles { rev } => {
                    GitResponse::Paths(self.files.get(&rev).cloned().unwrap_or_default())
                }
                GitEffect::ReadBlob { rev, path } => {
                    GitResponse::Blob(self.blobs.get(&(rev, path)).cloned())
                }
            };
            async move { Ok(response) }
        }
    }

    // ─── Mock GitHub ─────────────────────────────────────────────────────────

    #[derive(Default)]
    struct MockGitHub {
        live: LivePrState,
        collaborators: Vec<String>,
        teams: Option<Vec<String>>,
        events: Vec<IssueEventData>,
        emails: HashMap<String, String>,
        fail_mutations: bool,
        effects: Mutex<Vec<GitHubEffect>>,
    }

    impl MockGitHub {
        fn recorded(&self) -> Vec<GitHubEffect> {
            self.effects.lock().unwrap().clone()
        }

        fn mutations(&self) -> Vec<GitHubEffect> {
            self.recorded()
                .into_iter()
                .filter(GitHubEffect::is_mutation)
                .collect()
        }
    }

    impl GitHubInterpreter for MockGitHub {
        type Error = GitHubApiError;

        fn interpret(
            &self,
            effect: GitHubEffect,
        ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
            self.effects.lock().unwrap().push(effect.clone());
            let result = match effect {
                _ if effect.is_mutation() && self.fail_mutations => Err(
                    GitHubApiError::permanent_without_source("Validation Failed"),
                ),
                GitHubEffect::GetPr { .. } => Ok(GitHubResponse::Pr(self.live.clone())),
                GitHubEffect::ListCollaborators => {
                    Ok(GitHubResponse::Collaborators(self.collaborators.clone()))
                }
                GitHubEffect::ListRepoTeams => match &self.teams {
                    Some(teams) => Ok(GitHubResponse::RepoTeams(teams.clone())),
                    None => Err(GitHubApiError::permanent_without_source("Not Found")),
                },
                GitHubEffect::ListIssueEvents { .. } => {
                    Ok(GitHubResponse::IssueEvents(self.events.clone()))
                }
                GitHubEffect::SearchUserByEmail { email } => {
                    Ok(GitHubResponse::UserSearch(self.emails.get(&email).cloned()))
                }
                GitHubEffect::AddAssignees { .. } => Ok(GitHubResponse::AssigneesAdded),
                GitHubEffect::RequestReviewers { .. } => Ok(GitHubResponse::ReviewersRequested),
                GitHubEffect::RemoveReviewers { .. } => Ok(GitHubResponse::ReviewersRemoved),
            };
            async move { result }
        }
    }

    fn event(is_draft: bool) -> PullRequestEvent {
        PullRequestEvent {
            action: "synchronize".to_string(),
            repo: RepoId::new("acme", "widgets"),
            remote_url: "https://github.com/acme/widgets".to_string(),
            pr: PullRequestState {
                number: PrNumber(12),
                author: "author".to_string(),
                is_draft,
                assignees: BTreeSet::new(),
                requested_users: BTreeSet::new(),
                requested_teams: BTreeSet::new(),
                base_ref: "main".to_string(),
                head_sha: Sha::parse(head()).unwrap(),
                commit_count: 1,
            },
        }
    }

    fn assigned_live() -> LivePrState {
        LivePrState {
            assignees: set(&["author"]),
            ..Default::default()
        }
    }

    fn human_request(login: &str) -> IssueEventData {
        IssueEventData {
            kind: IssueEventKind::ReviewRequested,
            actor: Some(ActorData {
                login: "maintainer".to_string(),
                is_bot: false,
            }),
            requested_reviewer: Some(login.to_string()),
            requested_team: None,
        }
    }

    #[tokio::test]
    async fn draft_event_produces_no_effects() {
        let git = MockGit::default();
        let github = MockGitHub::default();

        let outcome = reconcile(&git, &github, event(true), None).await.unwrap();

        assert_eq!(outcome, RunOutcome::SkippedDraft);
        assert!(github.recorded().is_empty());
        assert!(git.effects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_draft_stops_after_refresh() {
        let git = MockGit::default();
        let github = MockGitHub {
            live: LivePrState {
                is_draft: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome = reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(outcome, RunOutcome::SkippedDraft);
        assert_eq!(
            github.recorded(),
            vec![GitHubEffect::GetPr { pr: PrNumber(12) }]
        );
        assert!(git.effects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn author_is_assigned_when_missing() {
        let git = MockGit::default().changed(&["README.md"]);
        let github = MockGitHub::default();

        reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::AddAssignees {
                pr: PrNumber(12),
                logins: vec!["author".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn non_collaborator_is_never_requested() {
        let git = MockGit::default()
            .changed(&["src/lib.rs"])
            .blob(&head(), "REVIEWERS", "*.rs @bob @dave");
        let github = MockGitHub {
            live: assigned_live(),
            collaborators: vec!["author".to_string(), "bob".to_string()],
            ..Default::default()
        };

        reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::RequestReviewers {
                pr: PrNumber(12),
                users: vec!["bob".to_string()],
                teams: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn codeowner_team_already_requested_needs_no_mutation() {
        let git = MockGit::default()
            .changed(&["src/x.c"])
            .blob(&head(), "CODEOWNERS", "src/* @acme/team-core");
        let github = MockGitHub {
            live: LivePrState {
                assignees: set(&["author"]),
                requested_teams: set(&["team-core"]),
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome = reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(outcome, RunOutcome::Reconciled(ReviewPlan::default()));
        assert!(github.mutations().is_empty());
    }

    #[tokio::test]
    async fn malformed_codeowners_line_keeps_codeowner_request() {
        let git = MockGit::default().changed(&["src/x.c"]).blob(
            &head(),
            ".github/CODEOWNERS",
            "* @alice\n/docs/ @carol typo\n",
        );
        let github = MockGitHub {
            live: LivePrState {
                assignees: set(&["author"]),
                requested_users: set(&["alice"]),
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome = reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(outcome, RunOutcome::Reconciled(ReviewPlan::default()));
        assert!(github.mutations().is_empty());
    }

    #[tokio::test]
    async fn reassigned_ownership_notifies_old_and_new_owner() {
        let git = MockGit::default()
            .changed(&["CODEOWNERS"])
            .blob(&base(), "CODEOWNERS", "/a.txt @alice")
            .blob(&head(), "CODEOWNERS", "/a.txt @bob")
            .files(&base(), &["CODEOWNERS", "a.txt"])
            .files(&head(), &["CODEOWNERS", "a.txt"]);
        let github = MockGitHub {
            live: assigned_live(),
            collaborators: vec!["alice".to_string(), "bob".to_string()],
            ..Default::default()
        };

        reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::RequestReviewers {
                pr: PrNumber(12),
                users: vec!["alice".to_string(), "bob".to_string()],
                teams: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn reassigned_email_owner_is_looked_up() {
        let git = MockGit::default()
            .changed(&["docs/CODEOWNERS"])
            .blob(&base(), "docs/CODEOWNERS", "/a.txt lead@example.com")
            .blob(&head(), "docs/CODEOWNERS", "/a.txt @bob")
            .files(&base(), &["a.txt"])
            .files(&head(), &["a.txt"]);
        let github = MockGitHub {
            live: assigned_live(),
            collaborators: vec!["lead".to_string(), "bob".to_string()],
            emails: [("lead@example.com".to_string(), "lead".to_string())].into(),
            ..Default::default()
        };

        reconcile(&git, &github, event(false), None).await.unwrap();

        assert!(github.recorded().contains(&GitHubEffect::SearchUserByEmail {
            email: "lead@example.com".to_string()
        }));
        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::RequestReviewers {
                pr: PrNumber(12),
                users: vec!["bob".to_string(), "lead".to_string()],
                teams: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn manual_request_is_not_withdrawn() {
        let git = MockGit::default().changed(&["src/lib.rs"]);
        let github = MockGitHub {
            live: LivePrState {
                assignees: set(&["author"]),
                requested_users: set(&["carol", "erin"]),
                ..Default::default()
            },
            events: vec![human_request("carol")],
            ..Default::default()
        };

        let outcome = reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::RemoveReviewers {
                pr: PrNumber(12),
                users: vec!["erin".to_string()],
                teams: vec![],
            }]
        );
        let RunOutcome::Reconciled(plan) = outcome else {
            panic!("expected a reconciled plan");
        };
        assert_eq!(plan.remove.users, set(&["erin"]));
    }

    #[tokio::test]
    async fn issue_events_only_fetched_for_removals() {
        let git = MockGit::default()
            .changed(&["src/lib.rs"])
            .blob(&head(), "REVIEWERS", "* @bob");
        let github = MockGitHub {
            live: assigned_live(),
            collaborators: vec!["bob".to_string()],
            ..Default::default()
        };

        reconcile(&git, &github, event(false), None).await.unwrap();

        assert!(
            !github
                .recorded()
                .iter()
                .any(|e| matches!(e, GitHubEffect::ListIssueEvents { .. }))
        );
    }

    #[tokio::test]
    async fn unlistable_teams_are_skipped() {
        let git = MockGit::default()
            .changed(&["src/lib.rs"])
            .blob(&head(), "REVIEWERS", "* @acme/docs @bob");
        let github = MockGitHub {
            live: assigned_live(),
            collaborators: vec!["bob".to_string()],
            teams: None,
            ..Default::default()
        };

        reconcile(&git, &github, event(false), None).await.unwrap();

        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::RequestReviewers {
                pr: PrNumber(12),
                users: vec!["bob".to_string()],
                teams: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn reviewers_override_is_honored() {
        let git = MockGit::default()
            .changed(&["src/lib.rs"])
            .blob(&head(), "REVIEWERS", "* @bob")
            .blob(&head(), "ci/OWNERS", "* @acme/docs");
        let github = MockGitHub {
            live: assigned_live(),
            teams: Some(vec!["docs".to_string()]),
            ..Default::default()
        };

        reconcile(&git, &github, event(false), Some("ci/OWNERS"))
            .await
            .unwrap();

        assert_eq!(
            github.mutations(),
            vec![GitHubEffect::RequestReviewers {
                pr: PrNumber(12),
                users: vec![],
                teams: vec!["docs".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn failed_mutation_is_fatal() {
        let git = MockGit::default().changed(&["src/lib.rs"]);
        let github = MockGitHub {
            fail_mutations: true,
            ..Default::default()
        };

        let result = reconcile(&git, &github, event(false), None).await;

        assert!(matches!(result, Err(RunError::GitHub(_))));
        assert_eq!(github.mutations().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_sends_no_mutations() {
        let git = MockGit::default()
            .changed(&["src/lib.rs"])
            .blob(&head(), "REVIEWERS", "* @bob");
        let github = LoggingGitHubInterpreter::new(MockGitHub {
            collaborators: vec!["bob".to_string()],
            ..Default::default()
        });

        let outcome = reconcile(&git, &github, event(false), None).await.unwrap();

        let RunOutcome::Reconciled(plan) = outcome else {
            panic!("expected a reconciled plan");
        };
        assert_eq!(plan.add.users, set(&["bob"]));
        assert!(github.into_inner().mutations().is_empty());
    }
}
