//! Locating and loading ownership files at a revision.
//!
//! Each ownership kind is searched for in a fixed candidate order; the first
//! candidate that exists **and** parses wins. Every kind of candidate failure
//! falls through to the next candidate, and running out of candidates yields
//! an empty ruleset rather than an error.

use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::effects::{GitEffect, GitInterpreter, GitResponse};

use super::matcher::{Owners, ParseError, normalize_path};

/// File name of the platform-native ownership file.
pub const CODEOWNERS: &str = "CODEOWNERS";

/// File name of the supplementary reviewers file.
pub const REVIEWERS: &str = "REVIEWERS";

/// Why a single candidate path could not be used.
#[derive(Debug, Error)]
pub enum CandidateError<E> {
    /// The path doesn't exist at the revision.
    #[error("not found")]
    NotFound,

    /// Reading the blob failed.
    #[error("unreadable: {0}")]
    Unreadable(E),

    /// The interpreter answered with a response for a different effect.
    #[error("unexpected git response: {0}")]
    UnexpectedResponse(String),

    /// The file exists but can't be parsed at all.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// The outcome of resolving one ownership kind at one revision.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    /// Repository-relative path of the file that was used, if any.
    pub source_path: Option<String>,
    /// The parsed rules; empty if no candidate was usable.
    pub owners: Owners,
}

impl Resolved {
    /// Returns true if `path` is the file these rules were loaded from.
    pub fn is_source(&self, path: &str) -> bool {
        self.source_path.as_deref() == Some(normalize_path(path))
    }
}

/// Candidate paths for `name`, in priority order.
///
/// An override, when present and non-empty, is tried first.
pub fn candidate_paths(name: &str, override_path: Option<&str>) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);
    if let Some(path) = override_path.map(str::trim).filter(|p| !p.is_empty()) {
        candidates.push(normalize_path(path).to_string());
    }
    for candidate in [
        name.to_string(),
        format!("docs/{}", name),
        format!(".github/{}", name),
    ] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Loads and parses one candidate.
async fn load_candidate<G>(
    git: &G,
    rev: &str,
    path: &str,
) -> Result<Owners, CandidateError<G::Error>>
where
    G: GitInterpreter,
{
    let response = git
        .interpret(GitEffect::ReadBlob {
            rev: rev.to_string(),
            path: path.to_string(),
        })
        .await
        .map_err(CandidateError::Unreadable)?;

    match response {
        GitResponse::Blob(Some(text)) => Ok(Owners::parse(&text)?),
        GitResponse::Blob(None) => Err(CandidateError::NotFound),
        other => Err(CandidateError::UnexpectedResponse(format!("{:?}", other))),
    }
}

/// Finds the ownership file `name` at `rev`.
///
/// Never fails: unreadable or malformed candidates are logged and skipped.
#[instrument(skip(git))]
pub async fn resolve<G>(git: &G, rev: &str, name: &str, override_path: Option<&str>) -> Resolved
where
    G: GitInterpreter,
    G::Error: fmt::Display,
{
    for path in candidate_paths(name, override_path) {
        match load_candidate(git, rev, &path).await {
            Ok(owners) => {
                for problem in owners.skipped() {
                    warn!(path = %path, error = %problem, "ignoring malformed ownership rule");
                }
                debug!(path = %path, rules = owners.len(), "loaded ownership file");
                return Resolved {
                    source_path: Some(path),
                    owners,
                };
            }
            Err(CandidateError::NotFound) => {
                debug!(path = %path, "ownership file candidate not present");
            }
            Err(e) => {
                warn!(path = %path, error = %e, "skipping unusable ownership file");
            }
        }
    }

    debug!(name, rev, "no ownership file found, treating as empty");
    Resolved::default()
}

/// Both ownership kinds resolved at one revision.
#[derive(Debug, Clone, Default)]
pub struct OwnershipSnapshot {
    pub codeowners: Resolved,
    pub reviewers: Resolved,
}

impl OwnershipSnapshot {
    /// Resolves CODEOWNERS and REVIEWERS at `rev`.
    ///
    /// `reviewers_override` only applies to REVIEWERS; CODEOWNERS always uses the
    /// locations the platform itself reads.
    pub async fn resolve<G>(git: &G, rev: &str, reviewers_override: Option<&str>) -> Self
    where
        G: GitInterpreter,
        G::Error: fmt::Display,
    {
        let codeowners = resolve(git, rev, CODEOWNERS, None).await;
        let reviewers = resolve(git, rev, REVIEWERS, reviewers_override).await;
        Self {
            codeowners,
            reviewers,
        }
    }

    /// Returns true if either ownership file was loaded from `path`.
    pub fn is_source(&self, path: &str) -> bool {
        self.codeowners.is_source(path) || self.reviewers.is_source(path)
    }
}
