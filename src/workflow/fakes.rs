// In-memory VCS and operator doubles for the workflow tests - no side effects.
//
// A "tree" is the ordered list of branches merged into a commit; remote
// branches and HEAD carry one. Pushing copies HEAD's tree, so two refs that
// were pushed from the same HEAD compare equal.

use crate::config::WorkflowConfig;
use crate::external::{BranchRef, CommandError, ConflictResolver, GitError, MergeOutcome, VcsPort};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use regex::RegexBuilder;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct RemoteBranch {
    tree: Vec<String>,
    time: DateTime<FixedOffset>,
}

#[derive(Debug, Default)]
struct FakeState {
    remote: BTreeMap<String, RemoteBranch>,
    local_branches: BTreeSet<String>,
    current_branch: String,
    head: Vec<String>,
    conflicting: HashSet<String>,
    pending_merge: Option<(String, Vec<String>)>,
    failing_pushes: HashSet<String>,
    failing_deletes: HashSet<String>,
    pushes: Vec<String>,
    log: Vec<String>,
    clock: i64,
    dirty: bool,
}

#[derive(Debug, Default)]
pub struct FakeVcs {
    state: Mutex<FakeState>,
}

fn failed(command: &str) -> GitError {
    GitError::CommandFailed {
        command: command.to_string(),
        code: 1,
        stderr: format!("fatal: {command} failed"),
    }
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config() -> WorkflowConfig {
        WorkflowConfig {
            qa_branches: vec!["qa1".to_string(), "qa2".to_string()],
            ignore_branches: vec!["release".to_string()],
            local_branch: "qa-train-local".to_string(),
            source_branch: "main".to_string(),
            remote: "origin".to_string(),
            ..WorkflowConfig::default()
        }
    }

    /// Remote branches; everything except `main` is based on `main`
    pub fn with_branches(names: &[&str]) -> Self {
        let vcs = Self::new();
        for name in names {
            let tree = if *name == "main" {
                vec!["main".to_string()]
            } else {
                vec!["main".to_string(), name.to_string()]
            };
            vcs.add_remote_branch(name, tree);
        }
        vcs.set_current_branch("main");
        vcs.add_local_branch("main");
        vcs
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(state: &mut FakeState) -> DateTime<FixedOffset> {
        state.clock += 1;
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap() + Duration::minutes(state.clock)
    }

    pub fn add_remote_branch(&self, name: &str, tree: Vec<String>) {
        let mut state = self.state();
        let time = Self::tick(&mut state);
        state.remote.insert(name.to_string(), RemoteBranch { tree, time });
    }

    pub fn add_local_branch(&self, name: &str) {
        self.state().local_branches.insert(name.to_string());
    }

    pub fn set_current_branch(&self, name: &str) {
        self.state().current_branch = name.to_string();
    }

    pub fn set_conflicting(&self, branch: &str) {
        self.state().conflicting.insert(format!("origin/{branch}"));
    }

    pub fn fail_push_to(&self, target: &str) {
        self.state().failing_pushes.insert(target.to_string());
    }

    pub fn fail_delete_of(&self, branch: &str) {
        self.state().failing_deletes.insert(branch.to_string());
    }

    pub fn current_branch(&self) -> String {
        self.state().current_branch.clone()
    }

    pub fn head_tree(&self) -> Vec<String> {
        self.state().head.clone()
    }

    pub fn remote_tree(&self, name: &str) -> Option<Vec<String>> {
        self.state().remote.get(name).map(|b| b.tree.clone())
    }

    pub fn remote_names(&self) -> Vec<String> {
        self.state().remote.keys().cloned().collect()
    }

    pub fn merge_pending(&self) -> bool {
        self.state().pending_merge.is_some()
    }

    /// Mutating commands, in order
    pub fn log(&self) -> Vec<String> {
        self.state().log.clone()
    }

    /// Successful push targets, in order
    pub fn pushes(&self) -> Vec<String> {
        self.state().pushes.clone()
    }

    pub fn deletions(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix("push origin --delete ").map(str::to_string))
            .collect()
    }

    /// What an operator does in the sub-shell: fix, add, commit
    pub fn complete_pending_merge(&self) {
        let mut state = self.state();
        if let Some((git_ref, _)) = state.pending_merge.take() {
            let branch = git_ref.trim_start_matches("origin/").to_string();
            let incoming = state.remote.get(&branch).map(|b| b.tree.clone()).unwrap_or_default();
            for part in incoming {
                if !state.head.contains(&part) {
                    state.head.push(part);
                }
            }
            state.log.push(format!("commit (resolved {branch})"));
        }
    }

    fn remote_tree_of(state: &FakeState, git_ref: &str) -> Option<Vec<String>> {
        let branch = git_ref.strip_prefix("origin/")?;
        state.remote.get(branch).map(|b| b.tree.clone())
    }
}

#[async_trait]
impl VcsPort for FakeVcs {
    fn remote(&self) -> &str {
        "origin"
    }

    async fn list_remote_branches_with_times(&self, pattern: &str) -> Result<Vec<BranchRef>, GitError> {
        let matcher = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| GitError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        let mut refs: Vec<BranchRef> = self
            .state()
            .remote
            .iter()
            .filter(|(name, _)| matcher.is_match(name))
            .map(|(name, branch)| BranchRef::with_time(name.clone(), branch.time))
            .collect();
        crate::external::git::sort_newest_first(&mut refs);
        Ok(refs)
    }

    async fn fetch_all_prune(&self) -> Result<(), GitError> {
        self.state().log.push("fetch --all --prune".to_string());
        Ok(())
    }

    async fn stash(&self) -> Result<bool, GitError> {
        let mut state = self.state();
        state.log.push("stash".to_string());
        Ok(std::mem::take(&mut state.dirty))
    }

    async fn checkout_new(&self, name: &str, from_ref: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push(format!("checkout -b {name} {from_ref}"));
        if state.local_branches.contains(name) {
            return Err(failed("checkout -b"));
        }
        let tree = Self::remote_tree_of(&state, from_ref).ok_or_else(|| failed("checkout -b"))?;
        state.local_branches.insert(name.to_string());
        state.current_branch = name.to_string();
        state.head = tree;
        Ok(())
    }

    async fn checkout_existing(&self, name: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push(format!("checkout {name}"));
        if !state.local_branches.contains(name) {
            return Err(failed("checkout"));
        }
        state.current_branch = name.to_string();
        Ok(())
    }

    async fn checkout_detached(&self, git_ref: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push(format!("checkout --detach {git_ref}"));
        let tree = Self::remote_tree_of(&state, git_ref).ok_or_else(|| failed("checkout --detach"))?;
        state.current_branch = "HEAD".to_string();
        state.head = tree;
        Ok(())
    }

    async fn delete_local_branch(&self, name: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push(format!("branch -D {name}"));
        if state.current_branch == name || !state.local_branches.remove(name) {
            return Err(failed("branch -D"));
        }
        Ok(())
    }

    async fn delete_remote_branch(&self, name: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push(format!("push origin --delete {name}"));
        if state.failing_deletes.contains(name) || state.remote.remove(name).is_none() {
            return Err(failed("push --delete"));
        }
        Ok(())
    }

    async fn merge(&self, git_ref: &str) -> Result<MergeOutcome, GitError> {
        let mut state = self.state();
        state.log.push(format!("merge {git_ref}"));
        if state.pending_merge.is_some() {
            return Err(failed("merge"));
        }
        let incoming = Self::remote_tree_of(&state, git_ref).ok_or_else(|| failed("merge"))?;
        if state.conflicting.contains(git_ref) {
            let files = vec![format!("{}.txt", git_ref.trim_start_matches("origin/"))];
            state.pending_merge = Some((git_ref.to_string(), files.clone()));
            return Ok(MergeOutcome::Conflict { files });
        }
        for part in incoming {
            if !state.head.contains(&part) {
                state.head.push(part);
            }
        }
        Ok(MergeOutcome::Clean)
    }

    async fn abort_merge(&self) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push("merge --abort".to_string());
        state.pending_merge = None;
        Ok(())
    }

    async fn merge_in_progress(&self) -> Result<bool, GitError> {
        Ok(self.state().pending_merge.is_some())
    }

    async fn unresolved_conflicts(&self) -> Result<Vec<String>, GitError> {
        Ok(self
            .state()
            .pending_merge
            .as_ref()
            .map(|(_, files)| files.clone())
            .unwrap_or_default())
    }

    async fn force_push(&self, local_ref: &str, remote_target: &str) -> Result<(), GitError> {
        let mut state = self.state();
        state.log.push(format!("push --force origin {local_ref}:{remote_target}"));
        if state.failing_pushes.contains(remote_target) {
            return Err(failed("push --force"));
        }
        let tree = state.head.clone();
        let time = Self::tick(&mut state);
        state.remote.insert(remote_target.to_string(), RemoteBranch { tree, time });
        state.pushes.push(remote_target.to_string());
        Ok(())
    }

    async fn current_branch_name(&self) -> Result<String, GitError> {
        Ok(self.state().current_branch.clone())
    }

    async fn merged_remote_branches(&self, source: &str) -> Result<Vec<String>, GitError> {
        let state = self.state();
        let Some(source_tree) = state.remote.get(source).map(|b| b.tree.clone()) else {
            return Ok(Vec::new());
        };
        Ok(state
            .remote
            .iter()
            .filter(|(name, _)| name.as_str() != source)
            .filter(|(_, branch)| branch.tree.iter().all(|part| source_tree.contains(part)))
            .map(|(name, _)| name.clone())
            .collect())
    }
}

/// Operator double for the manual conflict pass
pub struct FakeResolver {
    vcs: Arc<FakeVcs>,
    resolves: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn resolving(vcs: Arc<FakeVcs>) -> Self {
        Self {
            vcs,
            resolves: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn giving_up(vcs: Arc<FakeVcs>) -> Self {
        Self {
            vcs,
            resolves: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConflictResolver for FakeResolver {
    async fn resolve(&self, branch: &str, _files: &[String]) -> Result<(), CommandError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(branch.to_string());
        }
        if self.resolves {
            self.vcs.complete_pending_merge();
        }
        Ok(())
    }
}
