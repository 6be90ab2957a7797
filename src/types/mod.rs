//! Core domain types for the reviewer assignment bot.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod ids;
pub mod owner;
pub mod pr;

// Re-export commonly used types at the module level
pub use ids::{InvalidSha, PrNumber, RepoId, Sha};
pub use owner::{OwnerEntry, ReviewerSet};
pub use pr::{LivePrState, PullRequestState};
