//! Effect interpreter traits.
//!
//! These traits define how effects are executed:
//! - [`crate::git::GitRepo`] runs git effects as subprocesses
//! - [`crate::github::OctocrabClient`] runs GitHub effects via octocrab
//! - [`crate::github::LoggingGitHubInterpreter`] logs mutations instead of sending them
//!
//! Tests implement both traits with recording mocks.

use std::future::Future;

use super::git::{GitEffect, GitResponse};
use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId`, so all effects executed
/// through a single interpreter instance are scoped to that repository.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     collaborators: Vec<String>,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     type Error = String;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         match effect {
///             GitHubEffect::ListCollaborators => {
///                 Ok(GitHubResponse::Collaborators(self.collaborators.clone()))
///             }
///             other => Err(format!("unexpected effect: {:?}", other)),
///         }
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// Interprets Git effects against a local repository.
///
/// Implementations are constructed with a working directory, so all effects
/// executed through a single interpreter instance operate on that repository.
pub trait GitInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a Git effect and return its response.
    fn interpret(
        &self,
        effect: GitEffect,
    ) -> impl Future<Output = Result<GitResponse, Self::Error>> + Send;
}
