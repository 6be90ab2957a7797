//! Reviewer reconciliation.
//!
//! - [`engine`]: owner pools, amplification and the add/remove arithmetic
//! - [`identity`]: owner entries to logins and team slugs
//! - [`preserve`]: keeping reviewers a human requested by hand
//! - [`plan`]: the resulting [`ReviewPlan`] and its API effects

pub mod engine;
pub mod identity;
pub mod plan;
pub mod preserve;

pub use engine::{
    OwnerPools, ResolvedOwners, amplify, collect_owner_pools, compute_plan, direct_owners,
    ownership_files_changed,
};
pub use identity::{EmailLookup, GitHubEmailLookup, IdentityResolver, LookupError};
pub use plan::ReviewPlan;
pub use preserve::{RequestTarget, manual_request_tally, manually_requested, preserve_manual_requests};
