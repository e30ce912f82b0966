use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "qa-train")]
#[command(version)]
#[command(about = "Compose feature branches onto shared QA environments and promote them")]
#[command(long_about = "qa-train merges selected feature branches onto shared QA environment branches, \
                       records what each environment contains in the branch name, and promotes a \
                       verified environment into the source branch. Start with 'qa-train show-qa'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what is deployed to each QA environment
    ShowQa {
        /// QA environment to show (default: all)
        qa: Option<String>,
        /// Show every environment, including empty ones
        #[arg(long, help = "Include empty environments in the listing")]
        all: bool,
        /// Print machine-readable JSON
        #[arg(long, help = "Print environments as JSON")]
        json: bool,
    },
    /// List remote branches with their last commit time, newest first
    ShowBranches {
        /// Case-insensitive regex to filter branch names
        pattern: Option<String>,
        /// Include QA, history and ignored branches
        #[arg(long, help = "Do not hide branches that cannot be deployed")]
        all: bool,
    },
    /// Merge selected branches onto a QA environment
    DeployToQa {
        /// QA environment to deploy to (default: select among empty ones)
        #[arg(long, help = "Target QA environment")]
        qa: Option<String>,
        /// Case-insensitive regex to narrow the branch menu
        pattern: Option<String>,
    },
    /// Delete the QA branch and every composite name recorded for it
    ClearQa {
        /// QA environments to clear (default: select)
        qas: Vec<String>,
        /// Clear every configured QA environment
        #[arg(long, help = "Clear all QA environments")]
        all: bool,
    },
    /// Merge a QA environment into the source branch and delete what it superseded
    QaToSource {
        /// QA environment to promote (default: select among deployed ones)
        #[arg(long, help = "QA environment to promote")]
        qa: Option<String>,
    },
    /// Pull the latest changes into a branch and rebase it onto the source branch
    UpdateBranch {
        /// Branch to update (default: the current branch)
        branch: Option<String>,
        /// Pop the stash made before updating
        #[arg(long, help = "Run 'git stash pop' after updating if a stash was made")]
        pop_stash: bool,
    },
    /// Create and push a new branch from the source branch
    NewBranchFromSource {
        /// Name of the new branch (prompted for when omitted)
        name: Option<String>,
    },
    /// Create and push a new branch from a selected remote branch
    BranchFrom {
        /// Name of the new branch (prompted for when omitted)
        name: Option<String>,
    },
    /// Tag a recent commit on the source branch and push the tag
    TagRelease,
    /// Show repository state: branch, tracking, status, stashes, tags
    RepoInfo {
        /// Print machine-readable JSON
        #[arg(long, help = "Print repository information as JSON")]
        json: bool,
    },
    /// Write a default qa-train.toml
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, help = "Force initialization, overwriting existing configuration")]
        force: bool,
    },
}
