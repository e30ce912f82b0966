use super::update::update_branch;
use super::{Command, Services};
use crate::external::{NoteEditor, VcsPort};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflow::Operation;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use tracing::Instrument;

/// How many recent commits are offered for tagging
const COMMITS_TO_OFFER: usize = 10;

pub struct TagReleaseCommand {
    services: Services,
}

impl TagReleaseCommand {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

/// Tag names are the local time the tag was made
pub fn tag_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y-%m%d-%H%M%S").to_string()
}

/// Summary line, blank line, then one commit per line
pub fn notes_content(summary: &str, commits: &[String]) -> String {
    let mut notes = format!("{summary}\n\n");
    for commit in commits {
        notes.push_str(commit);
        notes.push('\n');
    }
    notes
}

impl Command for TagReleaseCommand {
    async fn execute(&self) -> Result<()> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(Operation::TagRelease.as_str(), None, &correlation_id);
        async move {
            let source = self.services.config.source_branch.clone();
            if !update_branch(&self.services, Some(&source), false).await? {
                println!("\n💤 Nothing to do: no remote to push a tag to");
                return Ok(());
            }

            let git = self.services.git.as_ref();
            let current = git.current_branch_name().await?;
            anyhow::ensure!(
                current == source,
                "Must be on {source} to select a commit to tag, not {current}"
            );

            let last_tag = git.last_tag().await?;
            let recent = git.recent_commits(last_tag.as_deref(), COMMITS_TO_OFFER).await?;
            if recent.is_empty() {
                println!("\n💤 Nothing to do: no commits since {}", last_tag.as_deref().unwrap_or("the first commit"));
                return Ok(());
            }

            println!("\nRecent commits");
            let Some(index) = self.services.prompter.select_one(&recent, "Select commit to tag") else {
                println!("\n💤 Nothing to do: no commit selected");
                return Ok(());
            };
            let commit = recent
                .get(index)
                .and_then(|line| line.split_whitespace().next())
                .context("Selected commit line has no commit id")?
                .to_string();

            let tag = tag_name(&Local::now());
            let since = match &last_tag {
                Some(tag) => tag.clone(),
                None => git.first_commit().await?,
            };
            let commits = git.commits_between(&since, Some(&commit)).await?;
            let summary = self
                .services
                .prompter
                .free_text("One-line summary for tag")
                .unwrap_or_else(|| tag.clone());

            let notes_dir = tempfile::tempdir().context("Failed to create directory for tag notes")?;
            let notes_file = notes_dir.path().join(format!("{tag}.txt"));
            std::fs::write(&notes_file, notes_content(&summary, &commits))
                .with_context(|| format!("Failed to write {}", notes_file.display()))?;

            NoteEditor::new(self.services.executor.clone(), self.services.config.editor.clone())
                .edit(&notes_file)
                .await?;

            println!(
                "Tag command would be -> git tag -a {tag} {commit} -F {}",
                notes_file.display()
            );
            if !self.services.prompter.confirm("Continue?") {
                println!("\n💤 Nothing to do: tag not created");
                return Ok(());
            }

            println!("\n$ git tag -a {tag} {commit} -F {}", notes_file.display());
            git.create_annotated_tag(&tag, &commit, &notes_file).await?;
            println!("\n$ git push {} --tags", git.remote());
            git.push_tags().await?;

            tracing::info!(tag = %tag, commit = %commit, "tagged release");
            println!();
            println!("🏷️  Tagged {commit} as {tag}");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
