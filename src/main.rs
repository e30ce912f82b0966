use anyhow::Result;
use clap::Parser;
use qa_train::cli::commands::{
    branch::{BranchBase, NewBranchCommand},
    clear::ClearCommand,
    deploy::DeployCommand,
    init::InitCommand,
    promote::PromoteCommand,
    repo_info::RepoInfoCommand,
    show::{ShowBranchesCommand, ShowQaCommand},
    show_how_to_get_started,
    tag_release::TagReleaseCommand,
    update::UpdateCommand,
    Command, Services,
};
use qa_train::cli::{Cli, Commands};
use qa_train::config::{LogFormat, WorkflowConfig};
use qa_train::telemetry::init_telemetry;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    let command = match cli.command {
        None => {
            show_how_to_get_started();
            return Ok(());
        }
        Some(Commands::Init { force }) => {
            init_telemetry("warn", LogFormat::Pretty)?;
            return runtime.block_on(InitCommand::new(force).execute());
        }
        Some(command) => command,
    };

    WorkflowConfig::load_env_file()?;
    let config = WorkflowConfig::load()?;
    init_telemetry(&config.log_level, config.log_format)?;
    tracing::debug!(qa_branches = ?config.qa_branches, source = %config.source_branch, "configuration loaded");
    let services = Services::new(config);

    runtime.block_on(async {
        match command {
            Commands::ShowQa { qa, all, json } => ShowQaCommand::new(services, qa, all, json).execute().await,
            Commands::ShowBranches { pattern, all } => ShowBranchesCommand::new(services, pattern, all).execute().await,
            Commands::DeployToQa { qa, pattern } => DeployCommand::new(services, qa, pattern).execute().await,
            Commands::ClearQa { qas, all } => ClearCommand::new(services, qas, all).execute().await,
            Commands::QaToSource { qa } => PromoteCommand::new(services, qa).execute().await,
            Commands::UpdateBranch { branch, pop_stash } => {
                UpdateCommand::new(services, branch, pop_stash).execute().await
            }
            Commands::NewBranchFromSource { name } => {
                NewBranchCommand::new(services, name, BranchBase::Source).execute().await
            }
            Commands::BranchFrom { name } => {
                NewBranchCommand::new(services, name, BranchBase::Selected).execute().await
            }
            Commands::TagRelease => TagReleaseCommand::new(services).execute().await,
            Commands::RepoInfo { json } => RepoInfoCommand::new(services, json).execute().await,
            Commands::Init { .. } => Ok(()),
        }
    })
}
