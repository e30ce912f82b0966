//! Interactive collaborators that suspend the workflow on the operator
//!
//! There is no timeout: the pipeline waits until the operator exits the
//! shell or editor.

use super::command::{CommandError, CommandExecutor};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Hands a conflicted merge to the operator for manual resolution
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    /// Returns once the operator is done; the caller re-checks the tree
    async fn resolve(&self, branch: &str, files: &[String]) -> Result<(), CommandError>;
}

/// Drops the operator into a sub-shell inside the working tree
pub struct ShellConflictResolver {
    executor: Arc<dyn CommandExecutor>,
    shell: String,
}

impl ShellConflictResolver {
    pub fn new(executor: Arc<dyn CommandExecutor>, shell: impl Into<String>) -> Self {
        Self {
            executor,
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl ConflictResolver for ShellConflictResolver {
    async fn resolve(&self, branch: &str, files: &[String]) -> Result<(), CommandError> {
        println!();
        println!("⚠️  Merging '{branch}' left conflicts in:");
        for file in files {
            println!("   - {file}");
        }
        println!();
        println!("Resolve the conflict(s), then `git add ...`, then `git commit`, then `exit`");
        println!();

        let code = self.executor.execute_interactive(&self.shell, &[]).await?;
        tracing::debug!(branch, shell = %self.shell, code, "conflict resolution shell exited");
        Ok(())
    }
}

/// Opens a file in the operator's editor
pub struct NoteEditor {
    executor: Arc<dyn CommandExecutor>,
    editor: String,
}

impl NoteEditor {
    pub fn new(executor: Arc<dyn CommandExecutor>, editor: impl Into<String>) -> Self {
        Self {
            executor,
            editor: editor.into(),
        }
    }

    pub async fn edit(&self, path: &Path) -> Result<(), CommandError> {
        let path = path.to_string_lossy();
        let code = self
            .executor
            .execute_interactive(&self.editor, &[path.as_ref()])
            .await?;
        if code != 0 {
            return Err(CommandError::ExecutionFailed {
                message: format!("{} exited with status {code}", self.editor),
            });
        }
        Ok(())
    }
}
