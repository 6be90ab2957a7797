//! Git operation effect types.
//!
//! These types describe the read-mostly git operations reconciliation needs,
//! without executing them. [`crate::git::GitRepo`] executes them against a
//! local repository.

use serde::{Deserialize, Serialize};

/// A git operation effect.
///
/// Effects are repository-scoped: the interpreter is constructed with a
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitEffect {
    /// Shallow-fetch a refspec from a remote.
    Fetch {
        /// Remote name or URL.
        remote: String,
        /// What to fetch (commonly a commit SHA).
        refspec: String,
        /// History depth to fetch.
        depth: u64,
    },

    /// List the paths that differ between two revisions.
    Diff {
        /// The older revision.
        from: String,
        /// The newer revision.
        to: String,
    },

    /// List every file tracked at a revision.
    ListFiles {
        /// The revision to list.
        rev: String,
    },

    /// Read a file's contents at a revision.
    ReadBlob {
        /// The revision to read from.
        rev: String,
        /// Repository-relative path.
        path: String,
    },
}

/// Response from a git effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitResponse {
    /// Response to `Fetch`.
    Fetched,

    /// Response to `Diff` and `ListFiles`.
    Paths(Vec<String>),

    /// Response to `ReadBlob`: `None` if the path does not exist at that revision.
    Blob(Option<String>),
}
