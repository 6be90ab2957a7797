//! CODEOWNERS-syntax parsing and path matching.
//!
//! A file is an ordered list of `pattern owner...` rules. For a given path the
//! **last** matching rule wins, and a rule with no owners clears ownership.
//! Patterns follow gitignore anchoring: a pattern containing a `/` (other than
//! a trailing one) is relative to the repository root, otherwise it matches at
//! any depth.
//!
//! Mistakes are contained to the line they appear on. An unrecognized owner
//! token is dropped from its rule, and a rule whose pattern doesn't compile
//! (or whose owners are all unrecognized) is dropped entirely. The rest of the
//! file still applies; the dropped pieces are kept in [`Owners::skipped`].

use std::collections::BTreeSet;

use glob::{MatchOptions, Pattern};
use thiserror::Error;

use crate::types::OwnerEntry;

/// Problems found while parsing an ownership file.
///
/// Only [`ParseError::NotText`] rejects a file; the others describe single
/// lines or tokens that were skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The file contains NUL bytes.
    #[error("not a text file")]
    NotText,

    /// The pattern is not a valid glob.
    #[error("line {line}: invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        reason: String,
    },

    /// An owner token is neither `@user`, `@org/team`, nor an email.
    #[error("line {line}: invalid owner {owner:?}")]
    InvalidOwner { line: usize, owner: String },
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    /// A path matches the rule if it matches any of these.
    patterns: Vec<Pattern>,
    owners: BTreeSet<OwnerEntry>,
}

impl Rule {
    fn matches(&self, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }
}

/// A parsed ownership file: maps repository paths to their owners.
///
/// Immutable once parsed. An absent file is [`Owners::empty`], which owns
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct Owners {
    rules: Vec<Rule>,
    skipped: Vec<ParseError>,
}

impl Owners {
    /// An ownership set with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses CODEOWNERS-syntax text.
    ///
    /// Fails only when the text isn't a text file at all.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text.contains('\0') {
            return Err(ParseError::NotText);
        }

        let mut rules = Vec::new();
        let mut skipped = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let Some(pattern) = tokens.next() else {
                continue;
            };

            let mut owners = BTreeSet::new();
            let mut named_owners = false;
            for token in tokens {
                named_owners = true;
                match OwnerEntry::from_token(token) {
                    Some(owner) => {
                        owners.insert(owner);
                    }
                    None => skipped.push(ParseError::InvalidOwner {
                        line: line_no,
                        owner: token.to_string(),
                    }),
                }
            }
            // Owners were named but none was usable: dropping the rule keeps
            // the earlier owners instead of clearing them.
            if named_owners && owners.is_empty() {
                continue;
            }

            match compile_pattern(pattern, line_no) {
                Ok(patterns) => rules.push(Rule { patterns, owners }),
                Err(e) => skipped.push(e),
            }
        }

        Ok(Self { rules, skipped })
    }

    /// Returns the owners of `path` (empty if no rule matches).
    ///
    /// `path` is repository-relative; a leading `/` or `./` is ignored.
    pub fn of(&self, path: &str) -> BTreeSet<OwnerEntry> {
        let path = normalize_path(path);
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.owners.clone())
            .unwrap_or_default()
    }

    /// Returns true if the file had no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules parsed.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Lines and tokens that were ignored, in file order.
    pub fn skipped(&self) -> &[ParseError] {
        &self.skipped
    }
}

/// Strips `./` and `/` prefixes so paths compare equal to git's output.
pub fn normalize_path(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

/// Removes a `#` comment. An escaped `\#` is kept as a literal.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1] != b'\\') {
            return &line[..i];
        }
    }
    line
}

/// Translates one CODEOWNERS pattern into glob patterns.
fn compile_pattern(raw: &str, line: usize) -> Result<Vec<Pattern>, ParseError> {
    let dir_only = raw.ends_with('/');
    let trimmed = raw.trim_end_matches('/');
    let anchored = trimmed.starts_with('/') || trimmed.contains('/');
    let body = trimmed.trim_start_matches('/').replace("\\#", "#");

    let base = if body.is_empty() {
        // "/" alone owns the whole repository.
        "**".to_string()
    } else if anchored {
        body
    } else {
        format!("**/{}", body)
    };

    let mut sources = Vec::with_capacity(2);
    if dir_only {
        if base.ends_with("**") {
            sources.push(base);
        } else {
            sources.push(format!("{}/**", base));
        }
    } else {
        // A plain name also owns everything below a directory of that name;
        // a wildcard in the last component (`docs/*`) stays one level deep.
        let last = base.rsplit('/').next().unwrap_or_default();
        let descends = !last.contains(['*', '?', '[']);
        sources.push(base.clone());
        if descends {
            sources.push(format!("{}/**", base));
        }
    }

    sources
        .into_iter()
        .map(|source| {
            Pattern::new(&source).map_err(|e| ParseError::InvalidPattern {
                line,
                pattern: raw.to_string(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}
