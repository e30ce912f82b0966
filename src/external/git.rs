//! Git command abstractions
//!
//! `VcsPort` is the narrow surface the workflow engine drives; `GitClient`
//! implements it (plus the plumbing used by the maintenance commands) on top
//! of a `CommandExecutor`, so every git invocation is a blocking subprocess
//! returning stdout and an exit code.

use super::command::{CommandError, CommandExecutor};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use regex::RegexBuilder;
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository not found or not a git repository")]
    RepositoryNotFound,
    #[error("`git {command}` exited with status {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("Invalid branch pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
}

/// A remote branch as observed through the VCS. Identity is the name.
#[derive(Debug, Clone, Serialize)]
pub struct BranchRef {
    pub name: String,
    pub last_commit: Option<DateTime<FixedOffset>>,
}

impl BranchRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_commit: None,
        }
    }

    pub fn with_time(name: impl Into<String>, time: DateTime<FixedOffset>) -> Self {
        Self {
            name: name.into(),
            last_commit: Some(time),
        }
    }

    pub fn display_time(&self) -> String {
        match self.last_commit {
            Some(time) => time.format("%Y-%m-%d %H:%M:%S %z").to_string(),
            None => "unknown".to_string(),
        }
    }
}

impl PartialEq for BranchRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for BranchRef {}

impl Hash for BranchRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Newest first; refs without a known commit time sort last.
pub fn sort_newest_first(refs: &mut [BranchRef]) {
    refs.sort_by(|a, b| {
        b.last_commit
            .cmp(&a.last_commit)
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Clean,
    Conflict { files: Vec<String> },
}

/// Operations the workflow engine consumes from the version-control tool.
///
/// Every call blocks until git returns; failures come back as `GitError`
/// and are never swallowed by implementations.
#[async_trait]
pub trait VcsPort: Send + Sync {
    /// Name of the remote all branch operations target
    fn remote(&self) -> &str;

    /// Remote branches whose name matches `pattern` (case-insensitive regex),
    /// newest commit first. Reads remote-tracking refs, so fetch first.
    async fn list_remote_branches_with_times(&self, pattern: &str)
        -> Result<Vec<BranchRef>, GitError>;

    async fn fetch_all_prune(&self) -> Result<(), GitError>;

    /// Stash local changes; `true` when a stash entry was created
    async fn stash(&self) -> Result<bool, GitError>;

    async fn checkout_new(&self, name: &str, from_ref: &str) -> Result<(), GitError>;

    async fn checkout_existing(&self, name: &str) -> Result<(), GitError>;

    async fn checkout_detached(&self, git_ref: &str) -> Result<(), GitError>;

    async fn delete_local_branch(&self, name: &str) -> Result<(), GitError>;

    async fn delete_remote_branch(&self, name: &str) -> Result<(), GitError>;

    async fn merge(&self, git_ref: &str) -> Result<MergeOutcome, GitError>;

    async fn abort_merge(&self) -> Result<(), GitError>;

    async fn merge_in_progress(&self) -> Result<bool, GitError>;

    /// Paths that still carry unmerged (conflict) entries
    async fn unresolved_conflicts(&self) -> Result<Vec<String>, GitError>;

    async fn force_push(&self, local_ref: &str, remote_target: &str) -> Result<(), GitError>;

    async fn current_branch_name(&self) -> Result<String, GitError>;

    /// Remote branches already merged into `remote/source`, excluding `source`
    async fn merged_remote_branches(&self, source: &str) -> Result<Vec<String>, GitError>;
}

/// Real Git implementation
pub struct GitClient {
    executor: Arc<dyn CommandExecutor>,
    remote: String,
}

impl GitClient {
    pub fn new(executor: Arc<dyn CommandExecutor>, remote: impl Into<String>) -> Self {
        Self {
            executor,
            remote: remote.into(),
        }
    }

    async fn run_git(&self, args: &[&str]) -> Result<super::command::CommandOutput, GitError> {
        Ok(self.executor.execute("git", args).await?)
    }

    async fn execute_git_command(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.run_git(args).await?;

        if !output.success() {
            return Err(Self::classify_git_error(output.status_code, &output.stderr, args));
        }

        Ok(output.stdout.trim().to_string())
    }

    fn classify_git_error(code: i32, stderr: &str, args: &[&str]) -> GitError {
        if stderr.contains("not a git repository") {
            GitError::RepositoryNotFound
        } else {
            GitError::CommandFailed {
                command: args.join(" "),
                code,
                stderr: stderr.trim().to_string(),
            }
        }
    }

    fn lines(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }

    pub async fn has_remote(&self) -> Result<bool, GitError> {
        let output = self.execute_git_command(&["remote"]).await?;
        Ok(output.lines().any(|line| line.trim() == self.remote))
    }

    pub async fn list_local_branches(&self) -> Result<Vec<String>, GitError> {
        let output = self
            .execute_git_command(&["branch", "--format=%(refname:short)"])
            .await?;
        Ok(Self::lines(&output))
    }

    pub async fn stash_pop(&self) -> Result<(), GitError> {
        self.execute_git_command(&["stash", "pop"]).await?;
        Ok(())
    }

    pub async fn pull_rebase(&self) -> Result<(), GitError> {
        self.execute_git_command(&["pull", "--rebase"]).await?;
        Ok(())
    }

    /// Rebase the current branch onto the remote copy of `onto`
    pub async fn rebase_onto_remote(&self, onto: &str) -> Result<(), GitError> {
        let target = self.remote_ref(onto);
        self.execute_git_command(&["rebase", &target]).await?;
        Ok(())
    }

    /// Create a local branch tracking `remote/name` and switch to it
    pub async fn checkout_tracking(&self, name: &str) -> Result<(), GitError> {
        let target = self.remote_ref(name);
        self.execute_git_command(&["checkout", "-b", name, "--track", &target])
            .await?;
        Ok(())
    }

    pub async fn push_upstream(&self, name: &str) -> Result<(), GitError> {
        self.execute_git_command(&["push", "-u", &self.remote, name])
            .await?;
        Ok(())
    }

    /// Most recent tag across all refs, if any
    pub async fn last_tag(&self) -> Result<Option<String>, GitError> {
        let newest = self
            .run_git(&["rev-list", "--tags", "--max-count=1"])
            .await?;
        let sha = newest.stdout.trim();
        if !newest.success() || sha.is_empty() {
            return Ok(None);
        }
        let described = self.run_git(&["describe", "--tags", sha]).await?;
        if !described.success() {
            return Ok(None);
        }
        Ok(Some(described.stdout.trim().to_string()))
    }

    pub async fn first_commit(&self) -> Result<String, GitError> {
        let output = self
            .execute_git_command(&["rev-list", "--max-parents=0", "HEAD"])
            .await?;
        Ok(output.lines().next().unwrap_or_default().to_string())
    }

    /// One-line summaries of non-merge commits in `from..to` (`to` defaults to HEAD)
    pub async fn commits_between(&self, from: &str, to: Option<&str>) -> Result<Vec<String>, GitError> {
        let range = format!("{}..{}", from, to.unwrap_or("HEAD"));
        let output = self
            .execute_git_command(&["log", "--find-renames", "--no-merges", "--oneline", &range])
            .await?;
        Ok(Self::lines(&output))
    }

    /// Recent commits since `since_tag`, or the last `limit` commits when untagged
    pub async fn recent_commits(&self, since_tag: Option<&str>, limit: usize) -> Result<Vec<String>, GitError> {
        let mut commits = match since_tag {
            Some(tag) => self.commits_between(tag, None).await?,
            None => {
                let count = format!("-{limit}");
                let output = self
                    .execute_git_command(&["log", "--find-renames", "--no-merges", "--oneline", &count])
                    .await?;
                Self::lines(&output)
            }
        };
        commits.truncate(limit);
        Ok(commits)
    }

    pub async fn unpushed_commits(&self) -> Result<Vec<String>, GitError> {
        let output = self
            .run_git(&["log", "--find-renames", "--no-merges", "--oneline", "@{u}.."])
            .await?;
        // No upstream configured is not an error here
        if !output.success() {
            return Ok(Vec::new());
        }
        Ok(Self::lines(&output.stdout))
    }

    pub async fn create_annotated_tag(&self, tag: &str, commit: &str, notes_file: &Path) -> Result<(), GitError> {
        let notes = notes_file.to_string_lossy();
        self.execute_git_command(&["tag", "-a", tag, commit, "-F", &notes])
            .await?;
        Ok(())
    }

    pub async fn push_tags(&self) -> Result<(), GitError> {
        self.execute_git_command(&["push", &self.remote, "--tags"])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VcsPort for GitClient {
    fn remote(&self) -> &str {
        &self.remote
    }

    async fn list_remote_branches_with_times(&self, pattern: &str) -> Result<Vec<BranchRef>, GitError> {
        let matcher = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| GitError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;

        let namespace = format!("refs/remotes/{}/", self.remote);
        let output = self
            .execute_git_command(&[
                "for-each-ref",
                "--format=%(refname:lstrip=3)%09%(committerdate:iso-strict)",
                &namespace,
            ])
            .await?;

        let mut refs: Vec<BranchRef> = output
            .lines()
            .filter_map(|line| {
                let (name, time) = line.split_once('\t').unwrap_or((line, ""));
                let name = name.trim();
                if name.is_empty() || name == "HEAD" || !matcher.is_match(name) {
                    return None;
                }
                Some(match DateTime::parse_from_rfc3339(time.trim()) {
                    Ok(time) => BranchRef::with_time(name, time),
                    Err(_) => BranchRef::new(name),
                })
            })
            .collect();

        sort_newest_first(&mut refs);
        Ok(refs)
    }

    async fn fetch_all_prune(&self) -> Result<(), GitError> {
        self.execute_git_command(&["fetch", "--all", "--prune"]).await?;
        Ok(())
    }

    async fn stash(&self) -> Result<bool, GitError> {
        let output = self.execute_git_command(&["stash"]).await?;
        Ok(!output.is_empty() && !output.contains("No local changes to save"))
    }

    async fn checkout_new(&self, name: &str, from_ref: &str) -> Result<(), GitError> {
        self.execute_git_command(&["checkout", "-b", name, from_ref, "--no-track"])
            .await?;
        Ok(())
    }

    async fn checkout_existing(&self, name: &str) -> Result<(), GitError> {
        self.execute_git_command(&["checkout", name]).await?;
        Ok(())
    }

    async fn checkout_detached(&self, git_ref: &str) -> Result<(), GitError> {
        self.execute_git_command(&["checkout", "--detach", git_ref])
            .await?;
        Ok(())
    }

    async fn delete_local_branch(&self, name: &str) -> Result<(), GitError> {
        self.execute_git_command(&["branch", "-D", name]).await?;
        Ok(())
    }

    async fn delete_remote_branch(&self, name: &str) -> Result<(), GitError> {
        tracing::info!(remote = %self.remote, branch = name, "deleting remote branch");
        self.execute_git_command(&["push", &self.remote, "--delete", name])
            .await?;
        Ok(())
    }

    async fn merge(&self, git_ref: &str) -> Result<MergeOutcome, GitError> {
        let args = ["merge", "--no-edit", git_ref];
        let output = self.run_git(&args).await?;
        if output.success() {
            return Ok(MergeOutcome::Clean);
        }

        let files = self.unresolved_conflicts().await?;
        if files.is_empty() {
            // Failed for a reason other than conflicts (unknown ref, dirty tree)
            return Err(Self::classify_git_error(output.status_code, &output.stderr, &args));
        }
        Ok(MergeOutcome::Conflict { files })
    }

    async fn abort_merge(&self) -> Result<(), GitError> {
        self.execute_git_command(&["merge", "--abort"]).await?;
        Ok(())
    }

    async fn merge_in_progress(&self) -> Result<bool, GitError> {
        let output = self
            .run_git(&["rev-parse", "-q", "--verify", "MERGE_HEAD"])
            .await?;
        Ok(output.success())
    }

    async fn unresolved_conflicts(&self) -> Result<Vec<String>, GitError> {
        let output = self
            .execute_git_command(&["diff", "--name-only", "--diff-filter=U"])
            .await?;
        Ok(Self::lines(&output))
    }

    async fn force_push(&self, local_ref: &str, remote_target: &str) -> Result<(), GitError> {
        let refspec = format!("{local_ref}:refs/heads/{remote_target}");
        tracing::info!(remote = %self.remote, refspec = %refspec, "force pushing");
        self.execute_git_command(&["push", "--force", &self.remote, &refspec])
            .await?;
        Ok(())
    }

    async fn current_branch_name(&self) -> Result<String, GitError> {
        self.execute_git_command(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await
    }

    async fn merged_remote_branches(&self, source: &str) -> Result<Vec<String>, GitError> {
        let merged_into = self.remote_ref(source);
        let output = self
            .execute_git_command(&[
                "branch",
                "-r",
                "--merged",
                &merged_into,
                "--format=%(refname)",
            ])
            .await?;

        let namespace = format!("refs/remotes/{}/", self.remote);
        Ok(output
            .lines()
            .filter_map(|line| line.trim().strip_prefix(namespace.as_str()))
            .filter(|name| *name != "HEAD" && *name != source)
            .map(str::to_string)
            .collect())
    }
}
