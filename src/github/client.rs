//! Octocrab client wrapper scoped to a specific repository.
//!
//! [`GitHubEffect`](crate::effects::GitHubEffect) variants carry no repository,
//! so the client holds it and scopes every request to it.

use octocrab::Octocrab;

use crate::types::RepoId;

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    repo: RepoId,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self { client, repo }
    }

    /// Creates a token-authenticated client.
    ///
    /// `api_url` overrides the API base (GitHub Enterprise Server); `None`
    /// targets api.github.com.
    pub fn from_token(
        token: impl Into<String>,
        repo: RepoId,
        api_url: Option<&str>,
    ) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder().personal_token(token.into());
        if let Some(url) = api_url {
            builder = builder.base_uri(url)?;
        }
        Ok(Self::new(builder.build()?, repo))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }

    /// Route prefix for repository endpoints: `/repos/{owner}/{repo}`.
    pub fn repo_route(&self) -> String {
        format!("/repos/{}/{}", self.repo.owner, self.repo.repo)
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
