use crate::config::WorkflowConfig;
use crate::external::BranchRef;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Selectable,
    QaBranch,
    /// Configured as ignored, or derived from a QA branch (history refs)
    Ignored,
}

impl Classification {
    pub fn is_selectable(self) -> bool {
        self == Classification::Selectable
    }
}

/// Why a proposed new branch name was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRejection {
    ExistsOnRemote,
    ExistsLocally,
    NotAllowed,
    QaPrefix,
}

impl std::fmt::Display for NameRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameRejection::ExistsOnRemote => write!(f, "already exists on the remote"),
            NameRejection::ExistsLocally => write!(f, "already exists locally"),
            NameRejection::NotAllowed => write!(f, "is reserved"),
            NameRejection::QaPrefix => write!(f, "starts with a QA branch name"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BranchClassifier {
    qa_branches: Vec<String>,
    ignore_branches: Vec<String>,
    qa_prefix: Regex,
}

impl BranchClassifier {
    pub fn new(qa_branches: Vec<String>, ignore_branches: Vec<String>) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = qa_branches.iter().map(|qa| regex::escape(qa)).collect();
        let qa_prefix = Regex::new(&format!("^(?:{})", alternatives.join("|")))?;
        Ok(Self {
            qa_branches,
            ignore_branches,
            qa_prefix,
        })
    }

    /// The source and local integration branches are never deployable,
    /// whether or not they are listed in `ignore_branches`.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, regex::Error> {
        let mut ignore = config.ignore_branches.clone();
        for protected in [&config.source_branch, &config.local_branch] {
            if !ignore.contains(protected) {
                ignore.push(protected.clone());
            }
        }
        Self::new(config.qa_branches.clone(), ignore)
    }

    pub fn qa_branches(&self) -> &[String] {
        &self.qa_branches
    }

    pub fn is_qa_branch(&self, name: &str) -> bool {
        self.qa_branches.iter().any(|qa| qa == name)
    }

    /// Rules in order: exact QA name, exact ignored name, QA prefix, otherwise selectable.
    pub fn classify(&self, name: &str) -> Classification {
        if self.is_qa_branch(name) {
            Classification::QaBranch
        } else if self.ignore_branches.iter().any(|ignored| ignored == name) {
            Classification::Ignored
        } else if self.qa_prefix.is_match(name) {
            Classification::Ignored
        } else {
            Classification::Selectable
        }
    }

    pub fn selectable(&self, refs: Vec<BranchRef>) -> Vec<BranchRef> {
        refs.into_iter()
            .filter(|r| self.classify(&r.name).is_selectable())
            .collect()
    }

    /// Check a proposed new branch name; spaces become underscores
    pub fn validate_new_branch_name(
        &self,
        name: &str,
        remote_branches: &[String],
        local_branches: &[String],
    ) -> Result<String, NameRejection> {
        let name = name.trim().replace(' ', "_");
        if remote_branches.iter().any(|b| *b == name) {
            Err(NameRejection::ExistsOnRemote)
        } else if local_branches.iter().any(|b| *b == name) {
            Err(NameRejection::ExistsLocally)
        } else {
            match self.classify(&name) {
                Classification::Selectable => Ok(name),
                Classification::QaBranch => Err(NameRejection::NotAllowed),
                Classification::Ignored if self.qa_prefix.is_match(&name) => {
                    Err(NameRejection::QaPrefix)
                }
                Classification::Ignored => Err(NameRejection::NotAllowed),
            }
        }
    }
}
