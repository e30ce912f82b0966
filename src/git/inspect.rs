use anyhow::{Context, Result};
use git2::{BranchType, Repository, StatusOptions};
use std::path::{Path, PathBuf};

/// Read-only questions about the local checkout, answered without spawning git
pub trait RepoInspect {
    /// Top-level directory of the working tree
    fn workdir(&self) -> Option<PathBuf>;

    /// Fetch URL of `remote`, `None` for local-only repositories
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;

    /// Short name of the checked-out branch, `None` when HEAD is detached or unborn
    fn current_branch(&self) -> Result<Option<String>>;

    /// Upstream of the checked-out branch, e.g. `origin/feat-a`
    fn tracking_branch(&self) -> Result<Option<String>>;

    /// Working tree status in `git status -s` form
    fn status_lines(&self) -> Result<Vec<String>>;

    /// Stash entries, newest first
    fn stashes(&mut self) -> Result<Vec<String>>;
}

/// libgit2 implementation
pub struct Git2Inspector {
    repo: Repository,
}

impl Git2Inspector {
    /// Open the repository containing `path`, searching parent directories
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).context("Not inside a git repository")?;
        Ok(Self { repo })
    }
}

impl RepoInspect for Git2Inspector {
    fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        match self.repo.find_remote(remote) {
            Ok(found) => Ok(found.url().map(str::to_string)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read remote '{remote}'")),
        }
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e).context("Failed to read HEAD"),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }

    fn tracking_branch(&self) -> Result<Option<String>> {
        let Some(name) = self.current_branch()? else {
            return Ok(None);
        };
        let branch = self
            .repo
            .find_branch(&name, BranchType::Local)
            .with_context(|| format!("Branch '{name}' not found"))?;
        match branch.upstream() {
            Ok(upstream) => Ok(upstream.name()?.map(str::to_string)),
            Err(_) => Ok(None),
        }
    }

    fn status_lines(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(false);
        let statuses = self.repo.statuses(Some(&mut options))?;

        let mut lines = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let status = entry.status();
            let code = if status.is_conflicted() {
                "UU"
            } else if status.contains(git2::Status::WT_NEW) {
                "??"
            } else if status.contains(git2::Status::INDEX_NEW) {
                "A "
            } else if status.contains(git2::Status::INDEX_MODIFIED) {
                "M "
            } else if status.contains(git2::Status::INDEX_DELETED) {
                "D "
            } else if status.contains(git2::Status::WT_MODIFIED) {
                " M"
            } else if status.contains(git2::Status::WT_DELETED) {
                " D"
            } else {
                continue;
            };
            lines.push(format!("{code} {path}"));
        }
        Ok(lines)
    }

    fn stashes(&mut self) -> Result<Vec<String>> {
        let mut entries = Vec::new();
        self.repo.stash_foreach(|index, message, _oid| {
            entries.push(format!("stash@{{{index}}}: {message}"));
            true
        })?;
        Ok(entries)
    }
}
