//! Init command: write a starter `qa-train.toml`
//!
//! An existing configuration file is never overwritten without `--force`.

use super::Command;
use crate::config::{WorkflowConfig, CONFIG_FILE};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub struct InitCommand {
    pub force: bool,
    dir: PathBuf,
}

impl InitCommand {
    pub fn new(force: bool) -> Self {
        Self {
            force,
            dir: PathBuf::from("."),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }
}

impl Command for InitCommand {
    async fn execute(&self) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        if path.exists() && !self.force {
            bail!(
                "{} already exists. Use --force to overwrite it",
                path.display()
            );
        }

        let config = WorkflowConfig::default();
        config.validate()?;
        config.save_to_file(&path)?;

        println!("✅ Wrote {}", path.display());
        println!();
        println!("Next steps:");
        println!("  ✏️  List your QA environments in qa_branches");
        println!("  🚫 Add release/production branches to ignore_branches");
        println!("  📋 Run 'qa-train show-qa' to check the setup");
        Ok(())
    }
}
