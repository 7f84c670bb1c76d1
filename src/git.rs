//! Git subprocess helpers.

pub mod worktree;

use std::ffi::OsStr;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    /// A git command exited non-zero; carries its stderr.
    #[error("{0}")]
    Command(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run a git command and return its trimmed stdout.
pub fn execute<I, S>(args: I) -> Result<String, GitError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new("git").args(args).output()?;
    if !output.status.success() {
        return Err(GitError::Command(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Name of the current branch, or "HEAD" when detached.
pub fn current_branch() -> Result<String, GitError> {
    execute(["rev-parse", "--abbrev-ref", "HEAD"])
}
