//! Ownership entries and the resolved reviewer sets they map to.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One owner named by an ownership rule.
///
/// The variant decides how the value becomes a GitHub identity:
/// users and teams are named directly, emails need a lookup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OwnerEntry {
    /// A user login, without the leading `@`.
    User(String),
    /// A team as `org/slug`, without the leading `@`.
    Team(String),
    /// A bare email address.
    Email(String),
}

impl OwnerEntry {
    /// Classifies a raw owner token from an ownership file.
    ///
    /// Returns `None` for tokens that are neither `@user`, `@org/team`,
    /// nor an email address.
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(name) = token.strip_prefix('@') {
            if name.is_empty() {
                return None;
            }
            return match name.split_once('/') {
                Some((org, slug)) if !org.is_empty() && !slug.is_empty() => {
                    Some(OwnerEntry::Team(name.to_string()))
                }
                Some(_) => None,
                None => Some(OwnerEntry::User(name.to_string())),
            };
        }

        match token.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Some(OwnerEntry::Email(token.to_string()))
            }
            _ => None,
        }
    }

    /// Returns the team slug (the part after `org/`) for team entries.
    pub fn team_slug(&self) -> Option<&str> {
        match self {
            OwnerEntry::Team(name) => name.split_once('/').map(|(_, slug)| slug),
            _ => None,
        }
    }
}

impl fmt::Display for OwnerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerEntry::User(login) => write!(f, "@{}", login),
            OwnerEntry::Team(name) => write!(f, "@{}", name),
            OwnerEntry::Email(email) => write!(f, "{}", email),
        }
    }
}

/// Users and teams after resolving owner entries to GitHub identities.
///
/// `BTreeSet` keeps the API payloads and log lines in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerSet {
    /// User logins.
    pub users: BTreeSet<String>,
    /// Team slugs.
    pub teams: BTreeSet<String>,
}

impl ReviewerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.teams.is_empty()
    }

    /// Adds every user and team from `other`.
    pub fn extend(&mut self, other: ReviewerSet) {
        self.users.extend(other.users);
        self.teams.extend(other.teams);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classifies_tokens() {
        assert_eq!(
            OwnerEntry::from_token("@octocat"),
            Some(OwnerEntry::User("octocat".to_string()))
        );
        assert_eq!(
            OwnerEntry::from_token("@tianocore/reviewers"),
            Some(OwnerEntry::Team("tianocore/reviewers".to_string()))
        );
        assert_eq!(
            OwnerEntry::from_token("dev@example.com"),
            Some(OwnerEntry::Email("dev@example.com".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(OwnerEntry::from_token("@"), None);
        assert_eq!(OwnerEntry::from_token("@org/"), None);
        assert_eq!(OwnerEntry::from_token("@/team"), None);
        assert_eq!(OwnerEntry::from_token("plainword"), None);
        assert_eq!(OwnerEntry::from_token("user@"), None);
        assert_eq!(OwnerEntry::from_token("@host"), Some(OwnerEntry::User("host".to_string())));
    }

    #[test]
    fn team_slug_strips_org() {
        let team = OwnerEntry::Team("org/core".to_string());
        assert_eq!(team.team_slug(), Some("core"));
        assert_eq!(OwnerEntry::User("core".to_string()).team_slug(), None);
    }

    proptest! {
        #[test]
        fn display_then_classify_is_identity(
            entry in prop_oneof![
                "[a-z][a-z0-9-]{0,20}".prop_map(OwnerEntry::User),
                ("[a-z][a-z0-9-]{0,10}", "[a-z][a-z0-9-]{0,10}")
                    .prop_map(|(o, t)| OwnerEntry::Team(format!("{}/{}", o, t))),
                ("[a-z][a-z0-9.]{0,10}", "[a-z]{1,10}\\.com")
                    .prop_map(|(l, d)| OwnerEntry::Email(format!("{}@{}", l, d))),
            ]
        ) {
            prop_assert_eq!(OwnerEntry::from_token(&entry.to_string()), Some(entry));
        }
    }
}
