//! External tool abstractions
//!
//! Trait-based seams around git, the terminal and interactive programs, so
//! the workflow engine can be driven by in-memory fakes in tests.

pub mod command;
pub mod git;
pub mod operator;
pub mod prompt;

pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use git::{BranchRef, GitClient, GitError, MergeOutcome, VcsPort};
pub use operator::{ConflictResolver, NoteEditor, ShellConflictResolver};
pub use prompt::{Prompter, TerminalPrompter};
