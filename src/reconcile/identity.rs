//! Resolving owner entries to GitHub users and teams.
//!
//! Users and teams are named directly in ownership files. Emails need an API
//! lookup, so [`IdentityResolver`] memoizes them for the run, keyed by the
//! lowercased address. Misses (and failed lookups) are cached as well: an
//! email that has no account is dropped once, not queried per file.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, warn};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::{OwnerEntry, ReviewerSet};

/// Maps an email address to a GitHub login.
pub trait EmailLookup {
    /// The error type returned by failed lookups.
    type Error: fmt::Display;

    /// Returns the login of the first account matching `email`, if any.
    fn lookup(&self, email: &str) -> impl Future<Output = Result<Option<String>, Self::Error>>;
}

/// Errors from [`GitHubEmailLookup`].
#[derive(Debug, Error)]
pub enum LookupError {
    /// The API call failed.
    #[error("user search failed: {0}")]
    Api(String),

    /// The interpreter answered with a response for a different effect.
    #[error("unexpected response to user search: {0}")]
    UnexpectedResponse(String),
}

/// Email lookup through the GitHub user search.
pub struct GitHubEmailLookup<'a, G> {
    github: &'a G,
}

impl<'a, G> GitHubEmailLookup<'a, G> {
    pub fn new(github: &'a G) -> Self {
        Self { github }
    }
}

impl<G> EmailLookup for GitHubEmailLookup<'_, G>
where
    G: GitHubInterpreter,
    G::Error: fmt::Display,
{
    type Error = LookupError;

    fn lookup(&self, email: &str) -> impl Future<Output = Result<Option<String>, Self::Error>> {
        let request = self.github.interpret(GitHubEffect::SearchUserByEmail {
            email: email.to_string(),
        });
        async move {
            match request.await {
                Ok(GitHubResponse::UserSearch(login)) => Ok(login),
                Ok(other) => Err(LookupError::UnexpectedResponse(format!("{:?}", other))),
                Err(e) => Err(LookupError::Api(e.to_string())),
            }
        }
    }
}

/// Resolves owner entries, caching email lookups for the lifetime of the run.
pub struct IdentityResolver<L> {
    lookup: L,
    email_cache: HashMap<String, Option<String>>,
}

impl<L: EmailLookup> IdentityResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            email_cache: HashMap::new(),
        }
    }

    /// Resolves an email to a login, consulting the cache first.
    pub async fn resolve_email(&mut self, email: &str) -> Option<String> {
        let key = email.to_lowercase();
        if let Some(cached) = self.email_cache.get(&key) {
            return cached.clone();
        }

        let login = match self.lookup.lookup(&key).await {
            Ok(Some(login)) => {
                debug!(email = %key, login = %login, "resolved email owner");
                Some(login)
            }
            Ok(None) => {
                debug!(email = %key, "no account for email owner, dropping");
                None
            }
            Err(e) => {
                warn!(email = %key, error = %e, "email lookup failed, dropping owner");
                None
            }
        };

        self.email_cache.insert(key, login.clone());
        login
    }

    /// Resolves a collection of owner entries into users and team slugs.
    pub async fn resolve<'e, I>(&mut self, entries: I) -> ReviewerSet
    where
        I: IntoIterator<Item = &'e OwnerEntry>,
    {
        let mut set = ReviewerSet::new();
        for entry in entries {
            match entry {
                OwnerEntry::User(login) => {
                    set.users.insert(login.clone());
                }
                OwnerEntry::Team(_) => {
                    if let Some(slug) = entry.team_slug() {
                        set.teams.insert(slug.to_string());
                    }
                }
                OwnerEntry::Email(email) => {
                    if let Some(login) = self.resolve_email(email).await {
                        set.users.insert(login);
                    }
                }
            }
        }
        set
    }

    /// Number of distinct emails looked up so far.
    pub fn cached_emails(&self) -> usize {
        self.email_cache.len()
    }
}
