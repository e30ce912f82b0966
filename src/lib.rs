// qa-train library - QA environment branch workflow over git
// This exposes the workflow engine and its collaborators for the binary and tests

pub mod cli;
pub mod config;
pub mod external;
pub mod git;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::{ConflictMode, LogFormat, WorkflowConfig};
pub use external::{BranchRef, CommandExecutor, GitClient, GitError, Prompter, ProcessCommandExecutor, VcsPort};
pub use git::{Git2Inspector, RepoInspect};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    authorize_push, BranchClassifier, LifecycleCoordinator, NamingCodec, Operation, Outcome, QaEnvironmentName,
    QaEnvironmentSnapshot, WorkflowError,
};
