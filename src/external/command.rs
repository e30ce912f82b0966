//! Base command execution abstraction
//!
//! Provides the foundational trait for executing external commands, enabling
//! dependency injection for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },
    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
    #[error("IO error: {message}")]
    Io { message: String },
}

impl CommandError {
    fn from_spawn(program: &str, e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            CommandError::CommandNotFound {
                command: program.to_string(),
            }
        } else {
            CommandError::Io {
                message: e.to_string(),
            }
        }
    }
}

/// Trait for executing external commands
///
/// `execute` captures output; `execute_interactive` hands the terminal to the
/// child (sub-shells, editors) and blocks until the operator exits it.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError>;

    async fn execute_interactive(&self, program: &str, args: &[&str]) -> Result<i32, CommandError>;
}

/// Real implementation using `tokio::process::Command`
#[derive(Debug, Clone, Default)]
pub struct ProcessCommandExecutor {
    working_dir: Option<PathBuf>,
}

impl ProcessCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command from `dir` instead of the process working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }

    fn command(&self, program: &str, args: &[&str]) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        tracing::debug!(program, args = ?args, "executing command");

        let output = self
            .command(program, args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CommandError::from_spawn(program, e))?;

        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn execute_interactive(&self, program: &str, args: &[&str]) -> Result<i32, CommandError> {
        tracing::debug!(program, args = ?args, "handing terminal to interactive command");

        let status = self
            .command(program, args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| CommandError::from_spawn(program, e))?;

        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_process_command_executor_success() {
        let executor = ProcessCommandExecutor::new();
        let result = executor.execute("echo", &["hello"]).await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_process_command_executor_command_not_found() {
        let executor = ProcessCommandExecutor::new();
        let result = executor.execute("nonexistent_command_xyz", &[]).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            CommandError::CommandNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_working_dir_is_honoured() {
        let dir = tempfile::TempDir::new().unwrap();
        let executor = ProcessCommandExecutor::in_dir(dir.path());
        let output = executor.execute("pwd", &[]).await.unwrap();

        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_interactive_reports_exit_code() {
        let executor = ProcessCommandExecutor::new();
        let code = executor
            .execute_interactive("sh", &["-c", "exit 3"])
            .await
            .unwrap();
        assert_eq!(code, 3);
    }
}
