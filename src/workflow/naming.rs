//! QA environment composite names
//!
//! A deployed environment is recorded on the remote as a branch named
//! `<qa>--with--<b1>--<b2>--...--<bn>`. This module is the only place that
//! knows the format; everything else works with [`QaEnvironmentName`].

use super::error::WorkflowError;

pub const SEGMENT_SEPARATOR: &str = "--";
pub const COMPOSITE_MARKER: &str = "with";

/// `qa + "--with--" + join(branches, "--")`
pub fn encode(qa: &str, branches: &[String]) -> String {
    format!(
        "{qa}{SEGMENT_SEPARATOR}{COMPOSITE_MARKER}{SEGMENT_SEPARATOR}{}",
        branches.join(SEGMENT_SEPARATOR)
    )
}

/// Whether `branch` survives a round trip through the composite format
pub fn is_encodable(branch: &str) -> bool {
    !branch.is_empty()
        && !branch.contains(SEGMENT_SEPARATOR)
        && !branch.starts_with('-')
        && !branch.ends_with('-')
}

/// Which feature branches a QA environment contains, in merge order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEnvironmentName {
    qa: String,
    branches: Vec<String>,
}

impl QaEnvironmentName {
    pub fn new(qa: impl Into<String>, branches: Vec<String>) -> Result<Self, WorkflowError> {
        let qa = qa.into();
        if branches.is_empty() {
            return Err(WorkflowError::MalformedEnvironmentName { name: encode(&qa, &branches) });
        }
        if let Some(branch) = branches.iter().find(|b| !is_encodable(b) || **b == qa) {
            return Err(WorkflowError::UnencodableBranchName {
                branch: branch.clone(),
            });
        }
        Ok(Self { qa, branches })
    }

    pub fn qa(&self) -> &str {
        &self.qa
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// The remote branch name recording this composition
    pub fn encode(&self) -> String {
        encode(&self.qa, &self.branches)
    }
}

impl std::fmt::Display for QaEnvironmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decodes composite names against the configured QA identifiers
#[derive(Debug, Clone)]
pub struct NamingCodec {
    qa_branches: Vec<String>,
}

impl NamingCodec {
    pub fn new(qa_branches: Vec<String>) -> Self {
        Self { qa_branches }
    }

    pub fn decode(&self, name: &str) -> Result<QaEnvironmentName, WorkflowError> {
        let malformed = || WorkflowError::MalformedEnvironmentName {
            name: name.to_string(),
        };

        let mut segments = name.split(SEGMENT_SEPARATOR);
        let qa = segments.next().ok_or_else(malformed)?;
        if !self.qa_branches.iter().any(|known| known == qa) {
            return Err(malformed());
        }
        if segments.next() != Some(COMPOSITE_MARKER) {
            return Err(malformed());
        }

        let branches: Vec<String> = segments.map(str::to_string).collect();
        if branches.is_empty() || branches.iter().any(|b| b.is_empty()) {
            return Err(malformed());
        }
        QaEnvironmentName::new(qa, branches).map_err(|_| malformed())
    }
}
