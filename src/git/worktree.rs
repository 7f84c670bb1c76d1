//! Git worktree management for isolated workflow execution.
//!
//! The worktree path is handed to callers as a parameter; nothing here
//! changes the process working directory, so handlers running in parallel
//! stay isolated. Handlers thread the path into whatever they spawn via
//! `Command::current_dir` or state keys.

use super::{GitError, execute};
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

/// A git worktree under a base directory.
pub struct Worktree {
    base_dir: PathBuf,
    name: String,
}

impl Worktree {
    pub fn new(base_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            name: name.into(),
        }
    }

    /// Absolute-ish path of the worktree (`base_dir/name`).
    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }

    pub fn exists(&self) -> bool {
        self.path().is_dir()
    }

    /// Create the worktree with `git worktree add`, creating the base
    /// directory first. With `branch`, a new branch of that name is
    /// checked out; otherwise the current HEAD is.
    pub fn create(&self, branch: Option<&str>) -> Result<(), GitError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.path();
        let mut command: Vec<&OsStr> = vec!["worktree".as_ref(), "add".as_ref()];
        if let Some(branch) = branch {
            command.push("-b".as_ref());
            command.push(branch.as_ref());
        }
        command.push(path.as_os_str());
        execute(command)?;
        tracing::info!(path = %path.display(), "worktree created");
        Ok(())
    }

    /// Remove the worktree with `git worktree remove`.
    pub fn remove(&self) -> Result<(), GitError> {
        execute(["worktree".as_ref(), "remove".as_ref(), self.path().as_os_str()])?;
        tracing::info!(path = %self.path().display(), "worktree removed");
        Ok(())
    }

    /// Create the worktree and get a guard that removes it on drop.
    pub fn create_scoped(self, branch: Option<&str>) -> Result<ScopedWorktree, GitError> {
        self.create(branch)?;
        Ok(ScopedWorktree { worktree: self })
    }
}

/// RAII guard: removes the worktree when dropped. Removal failures are
/// logged, not propagated; drop runs on error paths too.
pub struct ScopedWorktree {
    worktree: Worktree,
}

impl ScopedWorktree {
    pub fn path(&self) -> PathBuf {
        self.worktree.path()
    }
}

impl Drop for ScopedWorktree {
    fn drop(&mut self) {
        if let Err(error) = self.worktree.remove() {
            tracing::warn!(
                %error,
                path = %self.worktree.path().display(),
                "failed to remove worktree"
            );
        }
    }
}
