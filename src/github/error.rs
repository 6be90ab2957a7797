//! GitHub API error types.
//!
//! Errors are split into **transient** (5xx, rate limits, network failures)
//! and **permanent** (everything else). Only read-only queries ever act on the
//! distinction; mutations fail the run on the first error of either kind.

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Safe to retry with backoff: HTTP 5xx, 429, 403 with a rate-limit
    /// message, timeouts and connection failures.
    Transient,

    /// Retrying won't help: authentication failures, 404, 422 (e.g. a
    /// reviewer without repository access), malformed responses.
    Permanent,
}

impl GitHubErrorKind {
    /// Returns true if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A GitHub API error with categorization for retry decisions.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates a permanent error without an octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error, prefixing the message with `context`.
    pub fn from_octocrab(context: &str, err: octocrab::Error) -> Self {
        let status_code = status_code_of(&err);
        let message = format!("{}: {}", context, err);
        let kind = classify(status_code, &message);

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_retriable()
    }
}

/// Picks the error kind from the status code, falling back to the message
/// when there is none.
fn classify(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    match status_code {
        Some(429) => GitHubErrorKind::Transient,
        Some(403) if is_rate_limit_error(message) => GitHubErrorKind::Transient,
        Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
        Some(_) => GitHubErrorKind::Permanent,
        None if is_network_error(message) || message.to_lowercase().contains("try again") => {
            GitHubErrorKind::Transient
        }
        None => GitHubErrorKind::Permanent,
    }
}

/// Extracts the HTTP status code from an octocrab error.
///
/// API errors carry it directly. Other variants (HTTP transport, hyper) only
/// mention it in their message, if at all.
fn status_code_of(err: &octocrab::Error) -> Option<u16> {
    if let octocrab::Error::GitHub { source, .. } = err {
        return Some(source.status_code.as_u16());
    }
    status_code_from_message(&err.to_string())
}

fn status_code_from_message(message: &str) -> Option<u16> {
    let idx = message.find("status: ")?;
    let digits: String = message[idx + 8..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("timed out")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_status() {
        assert_eq!(classify(Some(502), "bad gateway"), GitHubErrorKind::Transient);
        assert_eq!(classify(Some(429), "slow down"), GitHubErrorKind::Transient);
        assert_eq!(
            classify(Some(403), "API rate limit exceeded"),
            GitHubErrorKind::Transient
        );
        assert_eq!(
            classify(Some(403), "Resource not accessible by integration"),
            GitHubErrorKind::Permanent
        );
        assert_eq!(
            classify(Some(422), "Reviews may only be requested from collaborators"),
            GitHubErrorKind::Permanent
        );
        assert_eq!(classify(Some(404), "Not Found"), GitHubErrorKind::Permanent);
    }

    #[test]
    fn classification_without_status() {
        assert_eq!(
            classify(None, "error sending request: connection reset"),
            GitHubErrorKind::Transient
        );
        assert_eq!(
            classify(None, "operation timed out"),
            GitHubErrorKind::Transient
        );
        assert_eq!(
            classify(None, "Please try again later"),
            GitHubErrorKind::Transient
        );
        assert_eq!(
            classify(None, "failed to deserialize response"),
            GitHubErrorKind::Permanent
        );
    }

    #[test]
    fn status_code_parsing() {
        assert_eq!(status_code_from_message("HTTP error, status: 503"), Some(503));
        assert_eq!(
            status_code_from_message("status: 404 Not Found"),
            Some(404)
        );
        assert_eq!(status_code_from_message("no code here"), None);
    }

    #[test]
    fn display_includes_status() {
        let mut err = GitHubApiError::permanent_without_source("bad reviewer");
        assert_eq!(err.to_string(), "GitHub API error: bad reviewer");
        err.status_code = Some(422);
        assert_eq!(
            err.to_string(),
            "GitHub API error (HTTP 422): bad reviewer"
        );
    }

    #[test]
    fn error_kind_retriable() {
        assert!(GitHubErrorKind::Transient.is_retriable());
        assert!(!GitHubErrorKind::Permanent.is_retriable());
        assert!(GitHubApiError::transient_without_source("x").is_transient());
    }
}
