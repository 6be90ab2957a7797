//! GitHub API client and effect interpreter.
//!
//! Key features:
//! - Exponential backoff retry for transient failures of read-only queries
//! - Distinguishes transient vs permanent errors
//! - Dry-run wrapper that logs mutations instead of sending them

mod client;
mod dry_run;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use dry_run::LoggingGitHubInterpreter;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::effect_name;
pub use retry::{RetryConfig, RetryPolicy, retry_with_backoff};
