use super::{Command, Services};
use crate::external::VcsPort;
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflow::{BranchClassifier, Operation};
use anyhow::Result;
use tracing::Instrument;

/// Where a new branch starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchBase {
    Source,
    /// Operator picks a remote branch
    Selected,
}

pub struct NewBranchCommand {
    pub name: Option<String>,
    pub base: BranchBase,
    services: Services,
}

impl NewBranchCommand {
    pub fn new(services: Services, name: Option<String>, base: BranchBase) -> Self {
        Self { name, base, services }
    }

    /// Ask until the operator gives an acceptable name or gives up
    fn prompt_for_name(
        &self,
        classifier: &BranchClassifier,
        remote: &[String],
        local: &[String],
    ) -> Option<String> {
        let mut candidate = self.name.clone();
        loop {
            let name = match candidate.take() {
                Some(name) => name,
                None => self
                    .services
                    .prompter
                    .free_text("Enter name of new branch to create")?,
            };
            match classifier.validate_new_branch_name(&name, remote, local) {
                Ok(valid) => return Some(valid),
                Err(reason) => println!("'{name}' {reason}"),
            }
        }
    }

    async fn select_base(&self, coordinator_branches: Vec<String>) -> Option<String> {
        match self.base {
            BranchBase::Source => Some(self.services.config.source_branch.clone()),
            BranchBase::Selected => {
                let index = self
                    .services
                    .prompter
                    .select_one(&coordinator_branches, "Select remote branch to branch from")?;
                coordinator_branches.get(index).cloned()
            }
        }
    }
}

impl Command for NewBranchCommand {
    async fn execute(&self) -> Result<()> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(Operation::NewBranch.as_str(), None, &correlation_id);
        async move {
            let coordinator = self.services.coordinator()?;
            let git = self.services.git.as_ref();
            coordinator.refresh().await?;

            let remote: Vec<String> = coordinator
                .remote_branches(None, true)
                .await?
                .into_iter()
                .map(|b| b.name)
                .collect();
            let local = git.list_local_branches().await?;

            let Some(name) = self.prompt_for_name(coordinator.classifier(), &remote, &local) else {
                println!("\n💤 Nothing to do: no branch name given");
                return Ok(());
            };

            let selectable: Vec<String> = coordinator
                .remote_branches(None, false)
                .await?
                .into_iter()
                .map(|b| b.name)
                .collect();
            let Some(base) = self.select_base(selectable).await else {
                println!("\n💤 Nothing to do: no branch selected");
                return Ok(());
            };

            println!("\n$ git stash");
            git.stash().await?;

            let from = format!("{}/{base}", git.remote());
            println!("\n$ git checkout -b {name} {from} --no-track");
            git.checkout_new(&name, &from).await?;

            println!("\n$ git push -u {} {name}", git.remote());
            git.push_upstream(&name).await?;

            tracing::info!(branch = %name, base = %base, "created branch");
            println!();
            println!("✅ Created {name} from {from}");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
