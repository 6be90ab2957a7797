//! Resolving what a pull request changes.
//!
//! The PR head is fetched with just enough history to reach its base
//! (`commit_count + 1` commits), then diffed against `head~commit_count`.

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::effects::{GitEffect, GitInterpreter, GitResponse};
use crate::git::GitError;
use crate::types::PullRequestState;

/// Errors while resolving the PR's changes. All are fatal for the run.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error(transparent)]
    Git(#[from] GitError),

    /// The interpreter answered with a response for a different effect.
    #[error("unexpected git response to {effect}: {response}")]
    UnexpectedResponse {
        effect: &'static str,
        response: String,
    },
}

/// The two revisions a PR spans and the files that differ between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// The PR head commit.
    pub head: String,
    /// `head~commit_count`.
    pub base: String,
    /// Paths changed by the PR, both sides of renames included.
    pub changed: Vec<String>,
}

fn expect_paths(effect: &'static str, response: GitResponse) -> Result<Vec<String>, DiffError> {
    match response {
        GitResponse::Paths(paths) => Ok(paths),
        other => Err(DiffError::UnexpectedResponse {
            effect,
            response: format!("{:?}", other),
        }),
    }
}

/// Fetches the PR's history and lists the files it changes.
#[instrument(skip(git, pr), fields(pr = %pr.number, head = %pr.head_sha.short()))]
pub async fn resolve_changes<G>(
    git: &G,
    remote: &str,
    pr: &PullRequestState,
) -> Result<ChangeSet, DiffError>
where
    G: GitInterpreter<Error = GitError>,
{
    let head = pr.head_sha.as_str().to_string();
    let base = pr.base_revision();
    let depth = pr.commit_count + 1;

    debug!(remote, depth, "fetching pull request history");
    match git
        .interpret(GitEffect::Fetch {
            remote: remote.to_string(),
            refspec: head.clone(),
            depth,
        })
        .await?
    {
        GitResponse::Fetched => {}
        other => {
            return Err(DiffError::UnexpectedResponse {
                effect: "fetch",
                response: format!("{:?}", other),
            });
        }
    }

    let response = git
        .interpret(GitEffect::Diff {
            from: base.clone(),
            to: head.clone(),
        })
        .await?;
    let changed = expect_paths("diff", response)?;

    info!(files = changed.len(), base = %base, "resolved changed files");
    Ok(ChangeSet {
        head,
        base,
        changed,
    })
}

/// Lists every file tracked at `rev`.
pub async fn list_files<G>(git: &G, rev: &str) -> Result<Vec<String>, DiffError>
where
    G: GitInterpreter<Error = GitError>,
{
    let response = git
        .interpret(GitEffect::ListFiles {
            rev: rev.to_string(),
        })
        .await?;
    expect_paths("ls-tree", response)
}
