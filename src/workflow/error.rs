use crate::external::{CommandError, GitError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Non-zero exit from git; aborts the current step without retry
    #[error("VCS command failed: {0}")]
    VcsCommandFailed(#[from] GitError),

    #[error("Merge conflict while merging {}", .branches.join(", "))]
    MergeConflict { branches: Vec<String> },

    #[error("Conflicts from merging '{branch}' are still unresolved: {}", .files.join(", "))]
    UnresolvedConflict { branch: String, files: Vec<String> },

    #[error("Operation '{operation}' is not allowed to force push to '{target}'")]
    UnauthorizedPush { operation: String, target: String },

    #[error("Will not force push from branch '{actual}', only from '{expected}'")]
    WrongLocalBranch { expected: String, actual: String },

    #[error("'{name}' is not a QA environment name")]
    MalformedEnvironmentName { name: String },

    #[error("Branch '{branch}' cannot be encoded into a QA environment name")]
    UnencodableBranchName { branch: String },

    #[error("'{name}' is not a configured QA branch")]
    UnknownQaBranch { name: String },

    #[error("Failed to delete remote branch(es): {}", .failed.join(", "))]
    DeletionFailed {
        deleted: Vec<String>,
        failed: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Interactive step failed: {0}")]
    Operator(#[from] CommandError),
}

impl WorkflowError {
    /// Errors that refused a push before anything reached the remote
    pub fn is_push_refusal(&self) -> bool {
        matches!(
            self,
            WorkflowError::UnauthorizedPush { .. } | WorkflowError::WrongLocalBranch { .. }
        )
    }
}

/// Result of an operation that may legitimately have nothing to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    NoOp(String),
}

impl<T> Outcome<T> {
    pub fn no_op(reason: impl Into<String>) -> Self {
        Outcome::NoOp(reason.into())
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::NoOp(_) => None,
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, Outcome::NoOp(_))
    }
}
