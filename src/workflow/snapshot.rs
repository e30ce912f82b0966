//! Derived state of one QA environment
//!
//! Built from the remote refs named `<qa>--...`, newest first: the newest
//! decodable one is the current composition, the rest are stale history.

use super::naming::{NamingCodec, QaEnvironmentName, SEGMENT_SEPARATOR};
use crate::external::BranchRef;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnvironmentState {
    /// No composite ref exists
    Empty,
    /// A current composite ref exists
    Deployed,
}

#[derive(Debug, Clone)]
pub struct EnvironmentRecord {
    pub branch: BranchRef,
    pub composition: QaEnvironmentName,
}

#[derive(Debug, Clone)]
pub struct QaEnvironmentSnapshot {
    qa: String,
    /// Newest first; index 0 is current
    records: Vec<EnvironmentRecord>,
}

/// Regex matching every composite/history ref of `qa`
pub fn history_pattern(qa: &str) -> String {
    format!("^{}{}", regex::escape(qa), SEGMENT_SEPARATOR)
}

impl QaEnvironmentSnapshot {
    /// `refs` must already be sorted newest first. Refs that do not decode
    /// are logged and skipped.
    pub fn from_refs(qa: &str, refs: Vec<BranchRef>, codec: &NamingCodec) -> Self {
        let records = refs
            .into_iter()
            .filter_map(|branch| match codec.decode(&branch.name) {
                Ok(composition) if composition.qa() == qa => Some(EnvironmentRecord {
                    branch,
                    composition,
                }),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(qa, branch = %branch.name, error = %e, "skipping malformed environment ref");
                    None
                }
            })
            .collect();
        Self {
            qa: qa.to_string(),
            records,
        }
    }

    pub fn qa(&self) -> &str {
        &self.qa
    }

    pub fn state(&self) -> EnvironmentState {
        if self.records.is_empty() {
            EnvironmentState::Empty
        } else {
            EnvironmentState::Deployed
        }
    }

    pub fn current(&self) -> Option<&EnvironmentRecord> {
        self.records.first()
    }

    pub fn stale(&self) -> &[EnvironmentRecord] {
        self.records.get(1..).unwrap_or_default()
    }

    /// Feature branches of the current composition
    pub fn contained_branches(&self) -> &[String] {
        self.current()
            .map(|record| record.composition.branches())
            .unwrap_or_default()
    }

    /// Every composite ref name recorded for this environment, current included
    pub fn composite_names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.branch.name.clone()).collect()
    }

    /// Human-readable listing used by show-qa and the promotion preview
    pub fn render(&self) -> String {
        let mut out = String::new();
        let Some(current) = self.current() else {
            let _ = write!(out, "Environment: {} (empty)", self.qa);
            return out;
        };
        let _ = write!(out, "Environment: {} ({})", self.qa, current.branch.display_time());
        for branch in current.composition.branches() {
            let _ = write!(out, "\n  - {branch}");
        }
        if !self.stale().is_empty() {
            out.push_str("\n  ----------   older   ----------");
            for record in self.stale() {
                let _ = write!(out, "\n  - {} ({})", record.branch.name, record.branch.display_time());
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct SnapshotView {
    pub qa: String,
    pub state: EnvironmentState,
    pub updated: Option<String>,
    pub contains: Vec<String>,
    pub older: Vec<String>,
}

impl From<&QaEnvironmentSnapshot> for SnapshotView {
    fn from(snapshot: &QaEnvironmentSnapshot) -> Self {
        Self {
            qa: snapshot.qa.clone(),
            state: snapshot.state(),
            updated: snapshot.current().map(|r| r.branch.display_time()),
            contains: snapshot.contained_branches().to_vec(),
            older: snapshot.stale().iter().map(|r| r.branch.name.clone()).collect(),
        }
    }
}
