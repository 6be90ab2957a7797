//! GitHub effect interpreter using octocrab.
//!
//! Every effect maps to one REST endpoint (list endpoints are paginated).
//! Octocrab's typed builders are used where they exist; repository teams and
//! issue events are read raw into minimal structs.

use octocrab::models::pulls::PullRequest;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::effects::{
    ActorData, GitHubEffect, GitHubInterpreter, GitHubResponse, IssueEventData, IssueEventKind,
};
use crate::types::{LivePrState, PrNumber};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// Page size for list endpoints (the API maximum).
const PER_PAGE: usize = 100;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let policy = RetryPolicy::for_effect(&effect);
        retry_with_backoff(RetryConfig::DEFAULT, policy, effect_name(&effect), || {
            execute_effect(self, effect.clone())
        })
        .await
    }
}

/// Short operation name for log lines.
pub fn effect_name(effect: &GitHubEffect) -> &'static str {
    match effect {
        GitHubEffect::GetPr { .. } => "get pull request",
        GitHubEffect::ListCollaborators => "list collaborators",
        GitHubEffect::ListRepoTeams => "list repository teams",
        GitHubEffect::ListIssueEvents { .. } => "list issue events",
        GitHubEffect::SearchUserByEmail { .. } => "search user by email",
        GitHubEffect::AddAssignees { .. } => "add assignees",
        GitHubEffect::RequestReviewers { .. } => "request reviewers",
        GitHubEffect::RemoveReviewers { .. } => "remove review requests",
    }
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::ListCollaborators => list_collaborators(client).await,
        GitHubEffect::ListRepoTeams => list_repo_teams(client).await,
        GitHubEffect::ListIssueEvents { pr } => list_issue_events(client, pr).await,
        GitHubEffect::SearchUserByEmail { email } => search_user_by_email(client, &email).await,
        GitHubEffect::AddAssignees { pr, logins } => add_assignees(client, pr, logins).await,
        GitHubEffect::RequestReviewers { pr, users, teams } => {
            request_reviewers(client, pr, users, teams).await
        }
        GitHubEffect::RemoveReviewers { pr, users, teams } => {
            remove_reviewers(client, pr, users, teams).await
        }
    }
}

/// Fetches every page of a list endpoint.
async fn get_all_pages<T: DeserializeOwned>(
    client: &OctocrabClient,
    route: &str,
) -> Result<Vec<T>, GitHubApiError> {
    let mut items = Vec::new();

    for page in 1u32.. {
        let url = format!("{}?per_page={}&page={}", route, PER_PAGE, page);
        let batch: Vec<T> = client
            .inner()
            .get(&url, None::<&()>)
            .await
            .map_err(|e| GitHubApiError::from_octocrab(route, e))?;

        let is_last_page = batch.len() < PER_PAGE;
        items.extend(batch);
        if is_last_page {
            break;
        }
    }

    debug!(route, count = items.len(), "fetched list");
    Ok(items)
}

// ─── Raw API shapes ───────────────────────────────────────────────────────────

// Only the endpoints octocrab has no typed builder for are read raw.

#[derive(Debug, Deserialize)]
struct RawLogin {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    login: String,
    #[serde(rename = "type", default)]
    account_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssueEvent {
    event: String,
    actor: Option<RawActor>,
    requested_reviewer: Option<RawLogin>,
    requested_team: Option<RawTeam>,
}

impl From<RawIssueEvent> for IssueEventData {
    fn from(raw: RawIssueEvent) -> Self {
        IssueEventData {
            kind: IssueEventKind::from_api_str(&raw.event),
            actor: raw.actor.map(|a| ActorData {
                is_bot: a.account_type.as_deref() == Some("Bot"),
                login: a.login,
            }),
            requested_reviewer: raw.requested_reviewer.map(|u| u.login),
            requested_team: raw.requested_team.map(|t| t.slug),
        }
    }
}

// ─── Queries ──────────────────────────────────────────────────────────────────

/// The reviewer-relevant parts of a pull request.
fn live_state(pull: PullRequest) -> LivePrState {
    LivePrState {
        is_draft: pull.draft.unwrap_or(false),
        assignees: pull
            .assignees
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.login)
            .collect(),
        requested_users: pull
            .requested_reviewers
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.login)
            .collect(),
        requested_teams: pull
            .requested_teams
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.slug)
            .collect(),
    }
}

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await
        .map_err(|e| GitHubApiError::from_octocrab("get pull request", e))?;
    Ok(GitHubResponse::Pr(live_state(pull)))
}

async fn list_collaborators(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut logins = Vec::new();

    loop {
        let result = client
            .inner()
            .repos(client.owner(), client.repo_name())
            .list_collaborators()
            .per_page(PER_PAGE as u8)
            .page(page)
            .send()
            .await
            .map_err(|e| GitHubApiError::from_octocrab("list collaborators", e))?;

        let is_last_page = result.items.len() < PER_PAGE;
        logins.extend(result.items.into_iter().map(|c| c.author.login));
        if is_last_page {
            break;
        }
        page += 1;
    }

    debug!(count = logins.len(), "fetched collaborators");
    Ok(GitHubResponse::Collaborators(logins))
}

async fn list_repo_teams(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("{}/teams", client.repo_route());
    let teams: Vec<RawTeam> = get_all_pages(client, &route).await?;
    Ok(GitHubResponse::RepoTeams(
        teams.into_iter().map(|t| t.slug).collect(),
    ))
}

async fn list_issue_events(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("{}/issues/{}/events", client.repo_route(), pr.0);
    let events: Vec<RawIssueEvent> = get_all_pages(client, &route).await?;
    Ok(GitHubResponse::IssueEvents(
        events.into_iter().map(IssueEventData::from).collect(),
    ))
}

/// Search query matching accounts whose public email is `email`.
fn email_query(email: &str) -> String {
    format!("{} in:email", email)
}

async fn search_user_by_email(
    client: &OctocrabClient,
    email: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    let query = email_query(email);
    let result = client
        .inner()
        .search()
        .users(&query)
        .per_page(1u8)
        .send()
        .await
        .map_err(|e| GitHubApiError::from_octocrab("search users", e))?;
    Ok(GitHubResponse::UserSearch(
        result.items.into_iter().next().map(|u| u.login),
    ))
}

// ─── Mutations ────────────────────────────────────────────────────────────────

async fn add_assignees(
    client: &OctocrabClient,
    pr: PrNumber,
    logins: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let logins: Vec<&str> = logins.iter().map(String::as_str).collect();
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_assignees(pr.0, &logins)
        .await
        .map_err(|e| GitHubApiError::from_octocrab("add assignees", e))?;
    Ok(GitHubResponse::AssigneesAdded)
}

async fn request_reviewers(
    client: &OctocrabClient,
    pr: PrNumber,
    users: Vec<String>,
    teams: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .request_reviews(pr.0, users, teams)
        .await
        .map_err(|e| GitHubApiError::from_octocrab("request reviewers", e))?;
    Ok(GitHubResponse::ReviewersRequested)
}

async fn remove_reviewers(
    client: &OctocrabClient,
    pr: PrNumber,
    users: Vec<String>,
    teams: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .remove_requested_reviewers(pr.0, users, teams)
        .await
        .map_err(|e| GitHubApiError::from_octocrab("remove review requests", e))?;
    Ok(GitHubResponse::ReviewersRemoved)
}
