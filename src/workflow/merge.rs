//! Builds compositions on the reserved local integration branch
//!
//! Merging is two-phase: a fast automated pass that aborts and records every
//! conflicting ref, then (in interactive mode) a guided pass that re-runs
//! each failed merge and hands it to the operator. Either every requested
//! ref ends up merged or the run fails.

use super::error::WorkflowError;
use crate::config::{ConflictMode, WorkflowConfig};
use crate::external::{ConflictResolver, MergeOutcome, VcsPort};
use std::collections::BTreeSet;

/// Result of the automated pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomatedPass {
    pub succeeded: BTreeSet<String>,
    /// In request order
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Merged cleanly on the automated pass
    pub clean: Vec<String>,
    /// Conflicted, then resolved by the operator
    pub resolved: Vec<String>,
}

impl MergeReport {
    pub fn merged(&self) -> impl Iterator<Item = &String> {
        self.clean.iter().chain(self.resolved.iter())
    }
}

pub struct MergeOrchestrator<'a> {
    vcs: &'a dyn VcsPort,
    resolver: &'a dyn ConflictResolver,
    config: &'a WorkflowConfig,
}

impl<'a> MergeOrchestrator<'a> {
    pub fn new(vcs: &'a dyn VcsPort, resolver: &'a dyn ConflictResolver, config: &'a WorkflowConfig) -> Self {
        Self {
            vcs,
            resolver,
            config,
        }
    }

    fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.vcs.remote(), branch)
    }

    /// Fetch, stash local changes, and recreate the local integration branch
    /// from the remote tip of `source`.
    pub async fn build_clean(&self, source: &str) -> Result<(), WorkflowError> {
        let local = self.config.local_branch.as_str();
        let source_ref = self.remote_ref(source);

        println!("\n$ git fetch --all --prune");
        self.vcs.fetch_all_prune().await?;

        println!("\n$ git stash");
        if self.vcs.stash().await? {
            println!("Stashed local changes");
        }

        println!("\n$ git checkout --detach {source_ref}");
        self.vcs.checkout_detached(&source_ref).await?;

        // Absent on first use; a failure here is not an error
        println!("\n$ git branch -D {local}");
        if let Err(e) = self.vcs.delete_local_branch(local).await {
            tracing::debug!(branch = local, error = %e, "no local integration branch to delete");
        }

        println!("\n$ git checkout -b {local} {source_ref} --no-track");
        self.vcs.checkout_new(local, &source_ref).await?;
        tracing::info!(local, source = %source_ref, "rebuilt local integration branch");
        Ok(())
    }

    /// Merge each branch in order, aborting and recording conflicts.
    pub async fn automated_pass(&self, branches: &[String]) -> Result<AutomatedPass, WorkflowError> {
        let mut pass = AutomatedPass::default();
        for branch in branches {
            let git_ref = self.remote_ref(branch);
            println!("\n$ git merge {git_ref}");
            match self.vcs.merge(&git_ref).await? {
                MergeOutcome::Clean => {
                    pass.succeeded.insert(branch.clone());
                }
                MergeOutcome::Conflict { files } => {
                    tracing::info!(branch = %branch, files = ?files, "merge conflict, aborting for now");
                    println!("\n$ git merge --abort");
                    self.vcs.abort_merge().await?;
                    pass.failed.push(branch.clone());
                }
            }
        }
        Ok(pass)
    }

    /// Merge all `branches` onto the current local integration branch.
    pub async fn merge_all(&self, branches: &[String]) -> Result<MergeReport, WorkflowError> {
        let pass = self.automated_pass(branches).await?;
        let clean: Vec<String> = branches
            .iter()
            .filter(|b| pass.succeeded.contains(*b))
            .cloned()
            .collect();

        if pass.failed.is_empty() {
            return Ok(MergeReport {
                clean,
                resolved: Vec::new(),
            });
        }

        println!("\n!!!!! The following branch(es) had merge conflicts: {:?}", pass.failed);
        if self.config.conflict_mode == ConflictMode::FailFast {
            return Err(WorkflowError::MergeConflict {
                branches: pass.failed,
            });
        }

        let mut resolved = Vec::new();
        for branch in &pass.failed {
            self.merge_with_operator(branch).await?;
            resolved.push(branch.clone());
        }
        Ok(MergeReport { clean, resolved })
    }

    async fn merge_with_operator(&self, branch: &str) -> Result<(), WorkflowError> {
        let git_ref = self.remote_ref(branch);
        println!("\n$ git merge {git_ref}");
        let files = match self.vcs.merge(&git_ref).await? {
            // An earlier resolution can make a later merge clean
            MergeOutcome::Clean => return Ok(()),
            MergeOutcome::Conflict { files } => files,
        };

        self.resolver.resolve(branch, &files).await?;

        let unresolved = self.vcs.unresolved_conflicts().await?;
        let still_merging = self.vcs.merge_in_progress().await?;
        if unresolved.is_empty() && !still_merging {
            tracing::info!(branch, "conflicts resolved by operator");
            return Ok(());
        }

        println!("\nConflicts still not resolved, aborting");
        println!("\n$ git merge --abort");
        self.vcs.abort_merge().await?;
        Err(WorkflowError::UnresolvedConflict {
            branch: branch.to_string(),
            files: if unresolved.is_empty() { files } else { unresolved },
        })
    }
}
