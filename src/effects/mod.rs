//! Effects-as-data for GitHub and Git operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Pure reconciliation logic that returns the mutations it wants as data
//! - Testability via mock interpreters
//! - Dry runs that log intended mutations instead of sending them

pub mod git;
pub mod github;
pub mod interpreter;

pub use git::{GitEffect, GitResponse};
pub use github::{ActorData, GitHubEffect, GitHubResponse, IssueEventData, IssueEventKind};
pub use interpreter::{GitHubInterpreter, GitInterpreter};
