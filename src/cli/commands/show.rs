use super::{Command, Services};
use crate::workflow::{EnvironmentState, SnapshotView};
use anyhow::Result;

pub struct ShowQaCommand {
    pub qa: Option<String>,
    pub all: bool,
    pub json: bool,
    services: Services,
}

impl ShowQaCommand {
    pub fn new(services: Services, qa: Option<String>, all: bool, json: bool) -> Self {
        Self {
            qa,
            all,
            json,
            services,
        }
    }
}

impl Command for ShowQaCommand {
    async fn execute(&self) -> Result<()> {
        let coordinator = self.services.coordinator()?;
        coordinator.refresh().await?;

        let snapshots = match &self.qa {
            Some(qa) => vec![coordinator.snapshot(qa).await?],
            None => coordinator.environments().await?,
        };
        let shown: Vec<_> = snapshots
            .iter()
            .filter(|s| self.all || self.qa.is_some() || s.state() == EnvironmentState::Deployed)
            .collect();

        if self.json {
            let views: Vec<SnapshotView> = shown.iter().map(|s| SnapshotView::from(*s)).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
            return Ok(());
        }

        if shown.is_empty() {
            println!();
            println!("📭 Nothing deployed to {}", self.services.config.qa_branches.join(", "));
            return Ok(());
        }
        for snapshot in shown {
            println!();
            println!("{}", snapshot.render());
        }
        Ok(())
    }
}

pub struct ShowBranchesCommand {
    pub pattern: Option<String>,
    pub all: bool,
    services: Services,
}

impl ShowBranchesCommand {
    pub fn new(services: Services, pattern: Option<String>, all: bool) -> Self {
        Self {
            pattern,
            all,
            services,
        }
    }
}

impl Command for ShowBranchesCommand {
    async fn execute(&self) -> Result<()> {
        let coordinator = self.services.coordinator()?;
        coordinator.refresh().await?;
        let branches = coordinator
            .remote_branches(self.pattern.as_deref(), self.all)
            .await?;

        println!();
        if branches.is_empty() {
            println!("📭 No matching remote branches");
            return Ok(());
        }
        for branch in branches {
            println!("- {} .::. {}", branch.name, branch.display_time());
        }
        Ok(())
    }
}
