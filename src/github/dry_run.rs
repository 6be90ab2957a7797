//! Dry-run interpreter: real queries, logged mutations.

use tracing::info;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};

/// Wraps an interpreter so that mutations are logged instead of executed.
///
/// Queries still reach the wrapped interpreter, so a dry run computes exactly
/// the plan a real run would.
#[derive(Debug, Clone)]
pub struct LoggingGitHubInterpreter<G> {
    inner: G,
}

impl<G> LoggingGitHubInterpreter<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

/// The response a successful mutation would have produced.
fn acknowledge(effect: &GitHubEffect) -> Option<GitHubResponse> {
    match effect {
        GitHubEffect::AddAssignees { .. } => Some(GitHubResponse::AssigneesAdded),
        GitHubEffect::RequestReviewers { .. } => Some(GitHubResponse::ReviewersRequested),
        GitHubEffect::RemoveReviewers { .. } => Some(GitHubResponse::ReviewersRemoved),
        _ => None,
    }
}

impl<G> GitHubInterpreter for LoggingGitHubInterpreter<G>
where
    G: GitHubInterpreter + Sync,
{
    type Error = G::Error;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        match acknowledge(&effect) {
            Some(response) => {
                info!(?effect, "dry run: mutation not sent");
                Ok(response)
            }
            None => self.inner.interpret(effect).await,
        }
    }
}
