use super::{report_outcome, Command, Services};
use anyhow::Result;

pub struct ClearCommand {
    pub qas: Vec<String>,
    pub all: bool,
    services: Services,
}

impl ClearCommand {
    pub fn new(services: Services, qas: Vec<String>, all: bool) -> Self {
        Self { qas, all, services }
    }
}

impl Command for ClearCommand {
    async fn execute(&self) -> Result<()> {
        println!("🧹 Clearing QA environments...");
        let coordinator = self.services.coordinator()?;
        let outcome = coordinator.clear_qa(&self.qas, self.all).await?;

        report_outcome(outcome, |report| {
            println!();
            println!("✅ Deleted {} remote branch(es)", report.deleted.len());
            for name in &report.deleted {
                println!("   - {name}");
            }
        });
        Ok(())
    }
}
