use crate::config::WorkflowConfig;
use crate::external::{
    CommandExecutor, GitClient, ProcessCommandExecutor, Prompter, ShellConflictResolver, TerminalPrompter,
};
use crate::workflow::{LifecycleCoordinator, Outcome};
use anyhow::Result;
use std::sync::Arc;

pub mod branch;
pub mod clear;
pub mod deploy;
pub mod init;
pub mod promote;
pub mod repo_info;
pub mod show;
pub mod tag_release;
pub mod update;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Collaborators shared by every command of one invocation
#[derive(Clone)]
pub struct Services {
    pub config: WorkflowConfig,
    pub executor: Arc<dyn CommandExecutor>,
    pub git: Arc<GitClient>,
    pub prompter: Arc<dyn Prompter>,
}

impl Services {
    /// Real git, terminal prompts, sub-shell conflict resolution
    pub fn new(config: WorkflowConfig) -> Self {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessCommandExecutor::new());
        Self::with_parts(config, executor, Arc::new(TerminalPrompter::new()))
    }

    pub fn with_parts(config: WorkflowConfig, executor: Arc<dyn CommandExecutor>, prompter: Arc<dyn Prompter>) -> Self {
        let git = Arc::new(GitClient::new(executor.clone(), config.remote.clone()));
        Self {
            config,
            executor,
            git,
            prompter,
        }
    }

    pub fn coordinator(&self) -> Result<LifecycleCoordinator> {
        let resolver = Arc::new(ShellConflictResolver::new(
            self.executor.clone(),
            self.config.shell.clone(),
        ));
        Ok(LifecycleCoordinator::new(
            self.config.clone(),
            self.git.clone(),
            self.prompter.clone(),
            resolver,
        )?)
    }
}

/// Print the reason an operation had nothing to do; both cases exit 0
pub fn report_outcome<T>(outcome: Outcome<T>, on_done: impl FnOnce(T)) {
    match outcome {
        Outcome::Completed(value) => on_done(value),
        Outcome::NoOp(reason) => {
            println!();
            println!("💤 Nothing to do: {reason}");
        }
    }
}

pub fn show_how_to_get_started() {
    println!("🚂 qa-train - QA environment branch workflow");
    println!();
    println!("Inspect:");
    println!("  📋 qa-train show-qa           # What is deployed where");
    println!("  🌿 qa-train show-branches     # Branches available to deploy");
    println!("  ℹ️  qa-train repo-info         # Local repository state");
    println!();
    println!("Ship:");
    println!("  🚀 qa-train deploy-to-qa      # Merge branches onto a QA environment");
    println!("  ✅ qa-train qa-to-source      # Promote a verified environment");
    println!("  🧹 qa-train clear-qa          # Empty QA environments");
    println!("  🏷️  qa-train tag-release       # Tag a commit on the source branch");
    println!();
    println!("💡 Run 'qa-train init' to write a qa-train.toml for this repository.");
}
