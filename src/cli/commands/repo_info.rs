use super::{Command, Services};
use crate::git::{Git2Inspector, RepoInspect};
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
pub struct RepoInfo {
    pub path: Option<String>,
    pub url: Option<String>,
    pub branch: Option<String>,
    pub branch_tracking: Option<String>,
    pub last_tag: Option<String>,
    pub status: Vec<String>,
    pub stashes: Vec<String>,
    pub unpushed: Vec<String>,
    pub commits_since_last_tag: Vec<String>,
}

impl RepoInfo {
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        let field = |label: &str, value: &Option<String>| format!("{label}: {}", value.as_deref().unwrap_or("-"));
        lines.push(field("path", &self.path));
        lines.push(field("url", &self.url));
        lines.push(field("branch", &self.branch));
        lines.push(field("branch_tracking", &self.branch_tracking));
        lines.push(field("last_tag", &self.last_tag));
        for (label, items) in [
            ("status", &self.status),
            ("stashes", &self.stashes),
            ("unpushed", &self.unpushed),
            ("commits_since_last_tag", &self.commits_since_last_tag),
        ] {
            if items.is_empty() {
                continue;
            }
            lines.push(format!("{label}:"));
            lines.extend(items.iter().map(|item| format!("  - {item}")));
        }
        lines.join("\n")
    }
}

pub struct RepoInfoCommand {
    pub json: bool,
    services: Services,
}

impl RepoInfoCommand {
    pub fn new(services: Services, json: bool) -> Self {
        Self { json, services }
    }

    async fn collect(&self) -> Result<RepoInfo> {
        let git = self.services.git.as_ref();

        let last_tag = git.last_tag().await?;
        let since = match &last_tag {
            Some(tag) => Some(tag.clone()),
            None => git.first_commit().await.ok().filter(|c| !c.is_empty()),
        };
        let commits_since_last_tag = match since {
            Some(since) => git.commits_between(&since, None).await.unwrap_or_default(),
            None => Vec::new(),
        };

        let unpushed = git.unpushed_commits().await?;

        let mut inspector = Git2Inspector::discover(".")?;
        Ok(RepoInfo {
            path: inspector.workdir().map(|p| p.display().to_string()),
            url: inspector.remote_url(&self.services.config.remote)?,
            branch: inspector.current_branch()?,
            branch_tracking: inspector.tracking_branch()?,
            last_tag,
            status: inspector.status_lines()?,
            stashes: inspector.stashes()?,
            unpushed,
            commits_since_last_tag,
        })
    }
}

impl Command for RepoInfoCommand {
    async fn execute(&self) -> Result<()> {
        let info = self.collect().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            println!("{}", info.render());
        }
        Ok(())
    }
}
