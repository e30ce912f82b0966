use super::{report_outcome, Command, Services};
use anyhow::Result;

pub struct PromoteCommand {
    pub qa: Option<String>,
    services: Services,
}

impl PromoteCommand {
    pub fn new(services: Services, qa: Option<String>) -> Self {
        Self { qa, services }
    }
}

impl Command for PromoteCommand {
    async fn execute(&self) -> Result<()> {
        println!(
            "✅ Promoting a QA environment to {}...",
            self.services.config.source_branch
        );
        let coordinator = self.services.coordinator()?;
        let outcome = coordinator.promote_qa_to_source(self.qa.as_deref()).await?;

        let source = &self.services.config.source_branch;
        report_outcome(outcome, |report| {
            println!();
            println!("🎉 {} merged into {source}", report.qa);
            println!("   🧹 Deleted {} remote branch(es):", report.deleted.len());
            for name in &report.deleted {
                println!("   - {name}");
            }
        });
        Ok(())
    }
}
