use super::{Command, Services};
use crate::external::VcsPort;
use crate::git::{Git2Inspector, RepoInspect};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflow::Operation;
use anyhow::Result;
use tracing::Instrument;

pub struct UpdateCommand {
    pub branch: Option<String>,
    pub pop_stash: bool,
    services: Services,
}

impl UpdateCommand {
    pub fn new(services: Services, branch: Option<String>, pop_stash: bool) -> Self {
        Self {
            branch,
            pop_stash,
            services,
        }
    }
}

impl Command for UpdateCommand {
    async fn execute(&self) -> Result<()> {
        if update_branch(&self.services, self.branch.as_deref(), self.pop_stash).await? {
            println!();
            println!("✅ Branch is up to date");
        }
        Ok(())
    }
}

/// Check out `branch` (if given) and bring it up to date with its upstream
/// and the source branch. Returns `false` for local-only repositories.
pub async fn update_branch(services: &Services, branch: Option<&str>, pop_stash: bool) -> Result<bool> {
    let correlation_id = generate_correlation_id();
    let span = create_workflow_span(Operation::UpdateBranch.as_str(), None, &correlation_id);
    async move {
        let git = services.git.as_ref();
        if let Some(branch) = branch {
            let local = git.list_local_branches().await?;
            if local.iter().any(|b| b == branch) {
                println!("\n$ git checkout {branch}");
                git.checkout_existing(branch).await?;
            } else {
                println!("\n$ git checkout -b {branch} --track {}/{branch}", git.remote());
                git.checkout_tracking(branch).await?;
            }
        }

        let current = git.current_branch_name().await?;
        if !git.has_remote().await? {
            println!("\nLocal-only repo, not updating");
            return Ok(false);
        }

        let tracking = Git2Inspector::discover(".")?.tracking_branch()?;
        let Some(tracking) = tracking else {
            println!("\n$ git fetch --all --prune");
            git.fetch_all_prune().await?;
            return Ok(true);
        };
        tracing::debug!(branch = %current, tracking = %tracking, "updating tracked branch");

        println!("\n$ git stash");
        let stashed = git.stash().await?;
        println!("\n$ git pull --rebase");
        git.pull_rebase().await?;

        let source = services.config.source_branch.as_str();
        if current != source {
            println!("\n$ git rebase {}/{source}", git.remote());
            git.rebase_onto_remote(source).await?;
        }

        if pop_stash && stashed {
            println!("\n$ git stash pop");
            git.stash_pop().await?;
        }
        Ok(true)
    }
    .instrument(span)
    .await
}
