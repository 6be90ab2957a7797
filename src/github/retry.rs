//! Exponential backoff retry for GitHub API queries.
//!
//! Read-only queries retry transient failures 3 times with 2s, 4s and 8s
//! delays. Mutations run exactly once: a failed review request is surfaced
//! immediately so the workflow run fails visibly.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::effects::GitHubEffect;

use super::error::GitHubApiError;

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 3 retries with 2s, 4s, 8s delays (about 14 seconds in total).
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
        backoff_multiplier: 2.0,
    };

    /// Delay before retry number `attempt` (0-indexed):
    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    /// All retry delays in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether failed calls are retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry transient errors with exponential backoff.
    #[default]
    RetryTransient,

    /// Return the first error.
    NoRetry,
}

impl RetryPolicy {
    /// Queries retry; mutations don't.
    pub fn for_effect(effect: &GitHubEffect) -> Self {
        if effect.is_mutation() {
            RetryPolicy::NoRetry
        } else {
            RetryPolicy::RetryTransient
        }
    }
}

/// Runs `operation`, retrying transient errors according to `config` and
/// `policy`. Permanent errors are returned immediately.
///
/// `what` names the operation in log lines.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T, GitHubApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let retries = match policy {
        RetryPolicy::NoRetry => 0,
        RetryPolicy::RetryTransient => config.max_retries,
    };
    let mut delays = config.delays().take(retries as usize);
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        attempt += 1;

        if !err.is_transient() {
            return Err(err);
        }
        let Some(delay) = delays.next() else {
            return Err(err);
        };

        warn!(
            operation = what,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient GitHub error, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
