//! Assign Reviewers - keeps a pull request's requested reviewers in sync with
//! its CODEOWNERS and REVIEWERS files.
//!
//! One run handles one pull-request event: it diffs the PR, looks up who owns
//! the changed files, and requests or withdraws reviews so the PR matches.

pub mod config;
pub mod diff;
pub mod effects;
pub mod event;
pub mod git;
pub mod github;
pub mod ownership;
pub mod reconcile;
pub mod run;
pub mod types;
