//! Local git operations for diff resolution and ownership file reads.
//!
//! Every operation shells out to the `git` binary in a clean environment
//! (no system or global config) so behavior doesn't depend on the runner's
//! setup. [`GitRepo`] wraps these helpers as a [`GitInterpreter`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Output;

use thiserror::Error;
use tracing::debug;

use crate::effects::{GitEffect, GitInterpreter, GitResponse};

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Failed to fetch a ref.
    #[error("failed to fetch {refspec} from {remote}: {details}")]
    FetchFailed {
        remote: String,
        refspec: String,
        details: String,
    },

    /// IO error (e.g., git binary missing).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Create a git Command with clean environment (no system/user config).
///
/// This ensures consistent behavior across different machines by ignoring
/// system and user git configuration (e.g., aliases, pagers, hooks).
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    use std::process::Command;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    // Disable system and user config for reproducible behavior
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");

    // Disable terminal prompts
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a GitError on failure.
pub fn run_git_sync(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let output = git_command(workdir).args(args).output()?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

/// Run a git command and return stdout as a string.
pub fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git_sync(workdir, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Splits NUL-separated `-z` output into paths.
fn split_nul_paths(stdout: &[u8]) -> Vec<String> {
    stdout
        .split(|b| *b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// Shallow-fetch `refspec` from `remote` with the given depth.
pub fn fetch(workdir: &Path, remote: &str, refspec: &str, depth: u64) -> GitResult<()> {
    let depth_arg = format!("--depth={}", depth);
    let args = [
        "fetch",
        "--no-tags",
        "--quiet",
        depth_arg.as_str(),
        remote,
        refspec,
    ];
    match run_git_sync(workdir, &args) {
        Ok(_) => Ok(()),
        Err(GitError::CommandFailed { stderr, .. }) => Err(GitError::FetchFailed {
            remote: remote.to_string(),
            refspec: refspec.to_string(),
            details: stderr,
        }),
        Err(e) => Err(e),
    }
}

/// List paths that differ between two revisions.
///
/// Renames are reported as a deletion plus an addition so both the old and the
/// new path count as changed.
pub fn diff_names(workdir: &Path, from: &str, to: &str) -> GitResult<Vec<String>> {
    let output = run_git_sync(
        workdir,
        &["diff", "--name-only", "--no-renames", "-z", from, to],
    )?;
    Ok(split_nul_paths(&output.stdout))
}

/// List every file tracked at a revision.
pub fn list_files(workdir: &Path, rev: &str) -> GitResult<Vec<String>> {
    let output = run_git_sync(workdir, &["ls-tree", "-r", "--name-only", "-z", rev])?;
    Ok(split_nul_paths(&output.stdout))
}

/// Read a file at a revision. Returns `Ok(None)` if the path doesn't exist there.
pub fn read_blob(workdir: &Path, rev: &str, path: &str) -> GitResult<Option<String>> {
    let object = format!("{}:{}", rev, path);

    let output = git_command(workdir)
        .args(["cat-file", "-e", object.as_str()])
        .output()?;

    // Exit 0 = exists. A missing path is reported on stderr; anything else
    // (e.g., an unknown revision) is a real failure.
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if stderr.is_empty()
            || stderr.contains("does not exist")
            || stderr.contains("exists on disk, but not in")
        {
            return Ok(None);
        }
        return Err(GitError::CommandFailed {
            command: format!("git cat-file -e {}", object),
            stderr,
        });
    }

    let output = run_git_sync(workdir, &["cat-file", "blob", object.as_str()])?;
    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

/// A local repository that executes [`GitEffect`]s.
#[derive(Debug, Clone)]
pub struct GitRepo {
    workdir: PathBuf,
}

impl GitRepo {
    /// Opens the repository at `workdir`, initializing an empty one if needed.
    ///
    /// The action only needs objects it fetches itself, so a bare `git init`
    /// is enough when the workflow skipped `actions/checkout`.
    pub fn open_or_init(workdir: impl Into<PathBuf>) -> GitResult<Self> {
        let workdir = workdir.into();
        if run_git_sync(&workdir, &["rev-parse", "--git-dir"]).is_err() {
            debug!(path = %workdir.display(), "no repository found, initializing");
            run_git_sync(&workdir, &["init", "--quiet"])?;
        }
        Ok(Self { workdir })
    }

    /// Returns the working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn execute(&self, effect: GitEffect) -> GitResult<GitResponse> {
        match effect {
            GitEffect::Fetch {
                remote,
                refspec,
                depth,
            } => {
                fetch(&self.workdir, &remote, &refspec, depth)?;
                Ok(GitResponse::Fetched)
            }
            GitEffect::Diff { from, to } => {
                Ok(GitResponse::Paths(diff_names(&self.workdir, &from, &to)?))
            }
            GitEffect::ListFiles { rev } => Ok(GitResponse::Paths(list_files(&self.workdir, &rev)?)),
            GitEffect::ReadBlob { rev, path } => {
                Ok(GitResponse::Blob(read_blob(&self.workdir, &rev, &path)?))
            }
        }
    }
}

impl GitInterpreter for GitRepo {
    type Error = GitError;

    fn interpret(
        &self,
        effect: GitEffect,
    ) -> impl Future<Output = Result<GitResponse, Self::Error>> + Send {
        // Git runs synchronously; the run is strictly sequential anyway.
        let result = self.execute(effect);
        async move { result }
    }
}
