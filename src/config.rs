use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "qa-train.toml";
pub const RC_FILE: &str = ".qa-train-rc";
pub const ENV_PREFIX: &str = "QA_TRAIN";

/// What the merge orchestrator does after the automated pass finds conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictMode {
    /// Re-run each conflicting merge in a sub-shell for manual resolution
    #[default]
    Interactive,
    /// Fail the run as soon as the automated pass reports a conflict (CI use)
    FailFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Main configuration structure for qa-train
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Shared QA environment branches (must not be empty)
    pub qa_branches: Vec<String>,
    /// Branches never offered for selection (release, production, ...)
    pub ignore_branches: Vec<String>,
    /// Reserved scratch branch every composition is built on
    pub local_branch: String,
    /// Protected mainline that QA-verified work is promoted into
    pub source_branch: String,
    /// Remote all branch operations target
    pub remote: String,
    pub conflict_mode: ConflictMode,
    /// Program used as the manual conflict-resolution shell
    pub shell: String,
    /// Program used to edit release tag notes
    pub editor: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            qa_branches: vec!["qa1".to_string(), "qa2".to_string()],
            ignore_branches: Vec::new(),
            local_branch: "qa-train-local".to_string(),
            source_branch: "main".to_string(),
            remote: "origin".to_string(),
            conflict_mode: ConflictMode::Interactive,
            shell: std::env::var("SHELL").unwrap_or_else(|_| "sh".to_string()),
            editor: std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string()),
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (qa-train.toml, .qa-train-rc)
    /// 3. Environment variables (prefixed with QA_TRAIN_, lists comma-separated)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`WorkflowConfig::load`] with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = dir.join(CONFIG_FILE);
        if config_file.exists() {
            builder = builder.add_source(File::from(config_file).format(FileFormat::Toml));
        }

        let rc_file = dir.join(RC_FILE);
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("qa_branches")
                .with_list_parse_key("ignore_branches"),
        );

        let config = builder.build().context("Failed to read configuration")?;
        let workflow_config: WorkflowConfig = config
            .try_deserialize()
            .context("Invalid configuration values")?;
        workflow_config.validate()?;
        Ok(workflow_config)
    }

    /// Reject configurations the naming scheme cannot represent
    pub fn validate(&self) -> Result<()> {
        if self.qa_branches.is_empty() {
            bail!("qa_branches must name at least one QA environment");
        }
        for qa in &self.qa_branches {
            if qa.trim().is_empty() {
                bail!("qa_branches contains an empty name");
            }
            if qa.contains("--") {
                bail!("QA branch '{qa}' must not contain '--'");
            }
        }
        for (label, name) in [
            ("local_branch", &self.local_branch),
            ("source_branch", &self.source_branch),
        ] {
            if name.trim().is_empty() {
                bail!("{label} must not be empty");
            }
            if let Some(qa) = self.qa_branches.iter().find(|qa| name.starts_with(qa.as_str())) {
                bail!("{label} '{name}' must not start with QA branch name '{qa}'");
            }
        }
        if self.local_branch == self.source_branch {
            bail!("local_branch and source_branch must differ");
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
