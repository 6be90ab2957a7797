//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., passing a
//! commit SHA where a revision expression is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error returned when a string is not a valid commit SHA.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SHA: {0:?}")]
pub struct InvalidSha(pub String);

/// A git commit SHA (40 hex characters, or 64 for SHA-256 repositories).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(String);

impl Sha {
    /// Parses and validates a SHA, normalizing it to lowercase.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidSha> {
        let s = s.as_ref();
        let valid_len = s.len() == 40 || s.len() == 64;
        if valid_len && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Sha(s.to_ascii_lowercase()))
        } else {
            Err(InvalidSha(s.to_string()))
        }
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short (7-character) version of the SHA for display.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }

    /// Returns the revision expression `<sha>~<n>`, the n-th first-parent ancestor.
    pub fn ancestor(&self, n: u64) -> String {
        format!("{}~{}", self.0, n)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parses a `full_name` of the form `owner/repo`.
    ///
    /// Returns `None` if either half is empty or the name has extra segments.
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(RepoId::new(owner, repo))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod pr_number {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn display_format(n: u64) {
                let pr = PrNumber(n);
                prop_assert_eq!(format!("{}", pr), format!("#{}", n));
            }
        }
    }

    mod sha {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_accepts_hex(s in "[0-9a-fA-F]{40}") {
                let sha = Sha::parse(&s).unwrap();
                prop_assert_eq!(sha.as_str(), s.to_ascii_lowercase());
            }

            #[test]
            fn short_returns_7_chars(s in "[0-9a-f]{40}") {
                let sha = Sha::parse(&s).unwrap();
                prop_assert_eq!(sha.short(), &s[..7]);
            }
        }

        #[test]
        fn parse_rejects_bad_input() {
            assert!(Sha::parse("abc").is_err());
            assert!(Sha::parse("g".repeat(40)).is_err());
            assert!(Sha::parse("").is_err());
        }

        #[test]
        fn ancestor_expression() {
            let sha = Sha::parse("a".repeat(40)).unwrap();
            assert_eq!(sha.ancestor(3), format!("{}~3", "a".repeat(40)));
        }
    }

    mod repo_id {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn full_name_roundtrip(
                owner in "[a-zA-Z][a-zA-Z0-9-]{0,38}",
                repo in "[a-zA-Z][a-zA-Z0-9_.-]{0,99}"
            ) {
                let id = RepoId::from_full_name(&format!("{}/{}", owner, repo)).unwrap();
                prop_assert_eq!(format!("{}", id), format!("{}/{}", owner, repo));
            }
        }

        #[test]
        fn from_full_name_rejects_malformed() {
            assert_eq!(RepoId::from_full_name("no-slash"), None);
            assert_eq!(RepoId::from_full_name("/repo"), None);
            assert_eq!(RepoId::from_full_name("owner/"), None);
            assert_eq!(RepoId::from_full_name("a/b/c"), None);
        }
    }
}
