use super::{report_outcome, Command, Services};
use anyhow::Result;

pub struct DeployCommand {
    pub qa: Option<String>,
    pub pattern: Option<String>,
    services: Services,
}

impl DeployCommand {
    pub fn new(services: Services, qa: Option<String>, pattern: Option<String>) -> Self {
        Self { qa, pattern, services }
    }
}

impl Command for DeployCommand {
    async fn execute(&self) -> Result<()> {
        println!("🚀 Deploying to QA...");
        let coordinator = self.services.coordinator()?;
        let outcome = coordinator
            .deploy_to_qa(self.qa.as_deref(), self.pattern.as_deref())
            .await?;

        report_outcome(outcome, |report| {
            println!();
            println!("✅ Deployed to {}", report.qa);
            println!("   🌿 Recorded as: {}", report.composite);
            for branch in &report.merge.clean {
                println!("   - {branch}");
            }
            for branch in &report.merge.resolved {
                println!("   - {branch} (conflicts resolved)");
            }
        });
        Ok(())
    }
}
