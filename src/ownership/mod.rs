//! Ownership files: CODEOWNERS and the supplementary REVIEWERS file.
//!
//! Both use the same `pattern owner...` syntax. [`matcher`] parses a file into
//! an [`Owners`] oracle; [`resolver`] finds the file at a given revision.

pub mod matcher;
pub mod resolver;

pub use matcher::{Owners, ParseError, normalize_path};
pub use resolver::{CODEOWNERS, OwnershipSnapshot, REVIEWERS, Resolved, candidate_paths, resolve};
