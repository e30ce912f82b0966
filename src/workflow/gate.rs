//! Force-push authorization
//!
//! Two layers, both unconditional: the calling operation must be on an
//! allowlist for the target, and the checked-out branch must be the reserved
//! local integration branch. The operation identity is an explicit argument
//! supplied by the caller.

use super::error::WorkflowError;
use crate::config::WorkflowConfig;
use crate::external::VcsPort;

/// Logical workflow operation currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DeployToQa,
    ClearQa,
    PromoteQaToSource,
    UpdateBranch,
    TagRelease,
    NewBranch,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::DeployToQa,
        Operation::ClearQa,
        Operation::PromoteQaToSource,
        Operation::UpdateBranch,
        Operation::TagRelease,
        Operation::NewBranch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::DeployToQa => "deploy-to-qa",
            Operation::ClearQa => "clear-qa",
            Operation::PromoteQaToSource => "qa-to-source",
            Operation::UpdateBranch => "update-branch",
            Operation::TagRelease => "tag-release",
            Operation::NewBranch => "new-branch",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations that just rebuilt the local integration branch from a remote
/// tip and may publish it with a force push
pub const ALLOWED_TO_FORCE_PUSH: &[Operation] = &[Operation::DeployToQa, Operation::PromoteQaToSource];

/// Strict subset allowed to overwrite the source branch
pub const ALLOWED_TO_FORCE_PUSH_TO_SOURCE: &[Operation] = &[Operation::PromoteQaToSource];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// The bare QA environment branch, e.g. `qa1`
    QaEnvironment(String),
    /// The composite name recording the composition
    Composite(String),
    Source,
}

impl PushTarget {
    pub fn ref_name<'a>(&'a self, source_branch: &'a str) -> &'a str {
        match self {
            PushTarget::QaEnvironment(name) | PushTarget::Composite(name) => name,
            PushTarget::Source => source_branch,
        }
    }
}

/// Identity layer of the gate: pure allowlist check.
pub fn authorize_push(caller: Operation, target: &PushTarget, source_branch: &str) -> Result<(), WorkflowError> {
    let target_name = target.ref_name(source_branch);
    let unauthorized = || WorkflowError::UnauthorizedPush {
        operation: caller.to_string(),
        target: target_name.to_string(),
    };

    if !ALLOWED_TO_FORCE_PUSH.contains(&caller) {
        return Err(unauthorized());
    }
    if target_name == source_branch && !ALLOWED_TO_FORCE_PUSH_TO_SOURCE.contains(&caller) {
        return Err(unauthorized());
    }
    Ok(())
}

pub struct PromotionGate<'a> {
    vcs: &'a dyn VcsPort,
    config: &'a WorkflowConfig,
}

impl<'a> PromotionGate<'a> {
    pub fn new(vcs: &'a dyn VcsPort, config: &'a WorkflowConfig) -> Self {
        Self { vcs, config }
    }

    /// Authorize, then force push the local integration branch to `target`.
    pub async fn force_push(&self, caller: Operation, target: &PushTarget) -> Result<(), WorkflowError> {
        let source = self.config.source_branch.as_str();
        let target_name = target.ref_name(source);

        if let Err(e) = authorize_push(caller, target, source) {
            tracing::warn!(operation = %caller, target = target_name, "refusing unauthorized force push");
            return Err(e);
        }

        if let PushTarget::QaEnvironment(qa) = target {
            if !self.config.qa_branches.iter().any(|known| known == qa) {
                return Err(WorkflowError::UnknownQaBranch { name: qa.clone() });
            }
        }

        let current = self.vcs.current_branch_name().await?;
        if current != self.config.local_branch {
            tracing::warn!(current = %current, expected = %self.config.local_branch, "refusing force push from wrong branch");
            return Err(WorkflowError::WrongLocalBranch {
                expected: self.config.local_branch.clone(),
                actual: current,
            });
        }

        println!("\n$ git push --force {} {}:{}", self.vcs.remote(), self.config.local_branch, target_name);
        self.vcs.force_push(&self.config.local_branch, target_name).await?;
        Ok(())
    }
}
