//! QA environment lifecycle: deploy, clear and promote
//!
//! Per QA identifier the state is derived from remote refs on every call:
//! `Empty` when no composite ref exists, `Deployed` otherwise. Deploy moves
//! `Empty|Deployed -> Deployed`; clear and promote move `Deployed -> Empty`.
//! Every mutating operation runs inside a [`CleanWorkspace`] scope.

use super::classifier::BranchClassifier;
use super::error::{Outcome, WorkflowError};
use super::gate::{Operation, PromotionGate, PushTarget};
use super::merge::{MergeOrchestrator, MergeReport};
use super::naming::{NamingCodec, QaEnvironmentName};
use super::snapshot::{history_pattern, EnvironmentState, QaEnvironmentSnapshot};
use super::workspace::CleanWorkspace;
use crate::config::WorkflowConfig;
use crate::external::{BranchRef, ConflictResolver, Prompter, VcsPort};
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::Instrument;

/// Which QA environments a selection menu offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaFilter {
    Empty,
    Deployed,
}

impl QaFilter {
    fn accepts(self, state: EnvironmentState) -> bool {
        match self {
            QaFilter::Empty => state == EnvironmentState::Empty,
            QaFilter::Deployed => state == EnvironmentState::Deployed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub qa: String,
    pub composite: String,
    pub merge: MergeReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionReport {
    pub qa: String,
    pub deleted: Vec<String>,
}

pub struct LifecycleCoordinator {
    config: WorkflowConfig,
    vcs: Arc<dyn VcsPort>,
    prompter: Arc<dyn Prompter>,
    resolver: Arc<dyn ConflictResolver>,
    classifier: BranchClassifier,
    codec: NamingCodec,
}

impl LifecycleCoordinator {
    pub fn new(
        config: WorkflowConfig,
        vcs: Arc<dyn VcsPort>,
        prompter: Arc<dyn Prompter>,
        resolver: Arc<dyn ConflictResolver>,
    ) -> Result<Self, WorkflowError> {
        let classifier = BranchClassifier::from_config(&config).map_err(|e| WorkflowError::Config(e.to_string()))?;
        let codec = NamingCodec::new(config.qa_branches.clone());
        Ok(Self {
            config,
            vcs,
            prompter,
            resolver,
            classifier,
            codec,
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn classifier(&self) -> &BranchClassifier {
        &self.classifier
    }

    pub fn vcs(&self) -> &dyn VcsPort {
        self.vcs.as_ref()
    }

    pub async fn refresh(&self) -> Result<(), WorkflowError> {
        println!("\n$ git fetch --all --prune");
        self.vcs.fetch_all_prune().await?;
        Ok(())
    }

    /// Remote branches matching `pattern`, newest first. Unless `all` is set,
    /// only branches that can be deployed are returned.
    pub async fn remote_branches(&self, pattern: Option<&str>, all: bool) -> Result<Vec<BranchRef>, WorkflowError> {
        let refs = self
            .vcs
            .list_remote_branches_with_times(pattern.unwrap_or("."))
            .await?;
        Ok(if all { refs } else { self.classifier.selectable(refs) })
    }

    pub async fn snapshot(&self, qa: &str) -> Result<QaEnvironmentSnapshot, WorkflowError> {
        self.ensure_known(qa)?;
        let refs = self.vcs.list_remote_branches_with_times(&history_pattern(qa)).await?;
        Ok(QaEnvironmentSnapshot::from_refs(qa, refs, &self.codec))
    }

    /// Snapshots of every configured environment, in configuration order
    pub async fn environments(&self) -> Result<Vec<QaEnvironmentSnapshot>, WorkflowError> {
        let mut snapshots = Vec::with_capacity(self.config.qa_branches.len());
        for qa in &self.config.qa_branches {
            snapshots.push(self.snapshot(qa).await?);
        }
        Ok(snapshots)
    }

    fn ensure_known(&self, qa: &str) -> Result<(), WorkflowError> {
        if self.classifier.is_qa_branch(qa) {
            Ok(())
        } else {
            Err(WorkflowError::UnknownQaBranch { name: qa.to_string() })
        }
    }

    /// Pick one QA environment; a single candidate is selected without asking.
    pub async fn select_qa(&self, filter: QaFilter) -> Result<Option<String>, WorkflowError> {
        let mut candidates = Vec::new();
        for snapshot in self.environments().await? {
            if filter.accepts(snapshot.state()) {
                candidates.push(snapshot.qa().to_string());
            }
        }
        candidates.sort();

        match candidates.len() {
            0 => {
                println!("No QA environment to select");
                Ok(None)
            }
            1 => {
                println!("Selected: '{}'", candidates[0]);
                Ok(candidates.pop())
            }
            _ => Ok(self
                .prompter
                .select_one(&candidates, "Select QA branch")
                .and_then(|index| candidates.get(index).cloned())),
        }
    }

    async fn select_branches(&self, pattern: Option<&str>) -> Result<Vec<String>, WorkflowError> {
        let refs = self.remote_branches(pattern, false).await?;
        if refs.is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<String> = refs
            .iter()
            .map(|r| format!("{} ({})", r.name, r.display_time()))
            .collect();
        let picked = self
            .prompter
            .select_many(&items, "Select remote branch(es) to deploy")
            .unwrap_or_default();
        Ok(picked
            .into_iter()
            .filter_map(|index| refs.get(index).map(|r| r.name.clone()))
            .collect())
    }

    /// Merge selected branches onto a fresh copy of the source branch and
    /// publish the result to both `qa` and its composite name.
    pub async fn deploy_to_qa(
        &self,
        qa: Option<&str>,
        pattern: Option<&str>,
    ) -> Result<Outcome<DeployReport>, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(Operation::DeployToQa.as_str(), qa, &correlation_id);
        async move {
            let workspace = CleanWorkspace::acquire(self.vcs.as_ref()).await;
            let result = self.deploy_in_workspace(qa, pattern).await;
            workspace.release(result.is_ok()).await;
            result
        }
        .instrument(span)
        .await
    }

    async fn deploy_in_workspace(
        &self,
        qa: Option<&str>,
        pattern: Option<&str>,
    ) -> Result<Outcome<DeployReport>, WorkflowError> {
        self.refresh().await?;

        let qa = match qa {
            Some(qa) => {
                self.ensure_known(qa)?;
                qa.to_string()
            }
            None => match self.select_qa(QaFilter::Empty).await? {
                Some(qa) => qa,
                None => return Ok(Outcome::no_op("No empty QA environment selected")),
            },
        };

        let current = self.snapshot(&qa).await?;
        if current.state() == EnvironmentState::Deployed {
            println!("\n{}\n", current.render());
            if !self.prompter.confirm("Something is already there, are you sure?") {
                return Ok(Outcome::no_op(format!("Left {qa} as it was")));
            }
        }

        let branches = self.select_branches(pattern).await?;
        if branches.is_empty() {
            return Ok(Outcome::no_op("No branches selected"));
        }
        let composition = QaEnvironmentName::new(qa.clone(), branches)?;
        tracing::info!(composite = %composition, "deploying");

        let orchestrator = MergeOrchestrator::new(self.vcs.as_ref(), self.resolver.as_ref(), &self.config);
        orchestrator.build_clean(&self.config.source_branch).await?;
        let merge = orchestrator.merge_all(composition.branches()).await?;

        let composite = composition.encode();
        let gate = PromotionGate::new(self.vcs.as_ref(), &self.config);
        if let Err(e) = gate
            .force_push(Operation::DeployToQa, &PushTarget::QaEnvironment(qa.clone()))
            .await
        {
            if e.is_push_refusal() {
                println!("\nPush refused, neither {qa} nor {composite} was touched");
            } else {
                println!("\nPush to {qa} failed, {composite} was not pushed");
            }
            return Err(e);
        }
        if let Err(e) = gate
            .force_push(Operation::DeployToQa, &PushTarget::Composite(composite.clone()))
            .await
        {
            println!("\n{qa} was updated but {composite} was not pushed");
            return Err(e);
        }

        tracing::info!(qa = %qa, composite = %composite, "deployed");
        Ok(Outcome::Completed(DeployReport { qa, composite, merge }))
    }

    /// Delete the bare ref and every composite ref of the chosen environments.
    ///
    /// With no valid names in `qas` (and `all` unset) the operator picks.
    pub async fn clear_qa(&self, qas: &[String], all: bool) -> Result<Outcome<ClearReport>, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let label = qas.join(",");
        let span = create_workflow_span(Operation::ClearQa.as_str(), Some(label.as_str()), &correlation_id);
        async move {
            self.refresh().await?;
            let targets = match self.qa_targets(qas, all) {
                Some(targets) => targets,
                None => return Ok(Outcome::no_op("No QA environment selected")),
            };

            let alternatives: Vec<String> = targets
                .iter()
                .map(|qa| format!("{0}$|{0}--", regex::escape(qa)))
                .collect();
            let pattern = format!("^(?:{})", alternatives.join("|"));
            let refs: Vec<String> = self
                .vcs
                .list_remote_branches_with_times(&pattern)
                .await?
                .into_iter()
                .map(|r| r.name)
                .collect();

            if refs.is_empty() {
                return Ok(Outcome::no_op(format!("Nothing to clear on {}", targets.join(", "))));
            }

            println!();
            for name in &refs {
                println!("  - {name}");
            }
            println!();
            if !self.prompter.confirm("Does this look correct?") {
                return Ok(Outcome::no_op("Not going to do anything"));
            }

            let deleted = self.delete_all(refs).await?;
            Ok(Outcome::Completed(ClearReport { deleted }))
        }
        .instrument(span)
        .await
    }

    fn qa_targets(&self, qas: &[String], all: bool) -> Option<Vec<String>> {
        if all {
            return Some(self.config.qa_branches.clone());
        }
        let mut valid = Vec::new();
        for qa in qas {
            if self.classifier.is_qa_branch(qa) {
                if !valid.contains(qa) {
                    valid.push(qa.clone());
                }
            } else {
                tracing::warn!(qa = %qa, "ignoring unknown QA branch");
            }
        }
        if !valid.is_empty() {
            return Some(valid);
        }

        let mut items = self.config.qa_branches.clone();
        items.sort();
        let picked = self.prompter.select_many(&items, "Select QA branches")?;
        let picked: Vec<String> = picked.into_iter().filter_map(|i| items.get(i).cloned()).collect();
        (!picked.is_empty()).then_some(picked)
    }

    /// Merge the environment's contents into the source branch, force push
    /// it, then delete everything that promotion superseded.
    pub async fn promote_qa_to_source(&self, qa: Option<&str>) -> Result<Outcome<PromotionReport>, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(Operation::PromoteQaToSource.as_str(), qa, &correlation_id);
        async move {
            let workspace = CleanWorkspace::acquire(self.vcs.as_ref()).await;
            let result = self.promote_in_workspace(qa).await;
            workspace.release(result.is_ok()).await;
            result
        }
        .instrument(span)
        .await
    }

    async fn promote_in_workspace(&self, qa: Option<&str>) -> Result<Outcome<PromotionReport>, WorkflowError> {
        self.refresh().await?;

        let qa = match qa {
            Some(qa) => {
                self.ensure_known(qa)?;
                qa.to_string()
            }
            None => {
                for snapshot in self.environments().await? {
                    println!("\n{}", snapshot.render());
                }
                println!();
                match self.select_qa(QaFilter::Deployed).await? {
                    Some(qa) => qa,
                    None => return Ok(Outcome::no_op("No deployed QA environment selected")),
                }
            }
        };

        let snapshot = self.snapshot(&qa).await?;
        if snapshot.state() == EnvironmentState::Empty || snapshot.contained_branches().is_empty() {
            return Ok(Outcome::no_op(format!("Nothing on {qa} to merge")));
        }
        println!("\n{}\n", snapshot.render());
        if !self.prompter.confirm("Does this look correct?") {
            return Ok(Outcome::no_op("Not going to do anything"));
        }

        let mut deletion_set: Vec<String> = snapshot.contained_branches().to_vec();
        deletion_set.extend(snapshot.composite_names());
        deletion_set.retain(|name| !self.is_protected(name));

        if let Err(e) = self.publish_to_source(&qa).await {
            println!("\nThere was a failure, not going to delete these: {deletion_set:?}");
            return Err(e);
        }
        tracing::info!(qa = %qa, source = %self.config.source_branch, "promoted to source");

        deletion_set.extend(self.merged_into_source().await);
        deletion_set.retain(|name| !self.is_protected(name));
        let deleted = self.delete_all(deletion_set).await?;
        Ok(Outcome::Completed(PromotionReport { qa, deleted }))
    }

    /// Rebuild the local integration branch from `qa`, bring the source
    /// branch in, and force push the result onto the source branch.
    async fn publish_to_source(&self, qa: &str) -> Result<(), WorkflowError> {
        let source = self.config.source_branch.clone();
        let orchestrator = MergeOrchestrator::new(self.vcs.as_ref(), self.resolver.as_ref(), &self.config);
        orchestrator.build_clean(qa).await?;
        orchestrator.merge_all(std::slice::from_ref(&source)).await?;
        PromotionGate::new(self.vcs.as_ref(), &self.config)
            .force_push(Operation::PromoteQaToSource, &PushTarget::Source)
            .await
    }

    /// Remote branches already contained in the source branch. Detection
    /// runs after a successful promotion, so a failure only narrows cleanup.
    async fn merged_into_source(&self) -> Vec<String> {
        match self.vcs.merged_remote_branches(&self.config.source_branch).await {
            Ok(names) => names
                .into_iter()
                .filter(|name| !self.config.ignore_branches.contains(name))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not list branches merged into source");
                Vec::new()
            }
        }
    }

    /// Branches promotion must never delete from the remote
    fn is_protected(&self, name: &str) -> bool {
        name == self.config.source_branch || name == self.config.local_branch
    }

    /// Delete every ref once, in name order; every deletion is attempted.
    async fn delete_all(&self, names: Vec<String>) -> Result<Vec<String>, WorkflowError> {
        let names: BTreeSet<String> = names.into_iter().collect();
        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for name in names {
            println!("\n$ git push {} -d {name}", self.vcs.remote());
            match self.vcs.delete_remote_branch(&name).await {
                Ok(()) => {
                    tracing::info!(branch = %name, "deleted remote branch");
                    deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(branch = %name, error = %e, "remote delete failed");
                    failed.push(name);
                }
            }
        }
        if failed.is_empty() {
            Ok(deleted)
        } else {
            Err(WorkflowError::DeletionFailed { deleted, failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::prompt::MockPrompter;
    use crate::workflow::fakes::{FakeResolver, FakeVcs};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Answer a multi-select by branch name, in the given order
    fn pick(wanted: &'static [&'static str]) -> impl Fn(&[String], &str) -> Option<Vec<usize>> + Send {
        move |items: &[String], _: &str| {
            let picked: Vec<usize> = wanted
                .iter()
                .filter_map(|w| items.iter().position(|item| item.starts_with(&format!("{w} "))))
                .collect();
            Some(picked)
        }
    }

    fn coordinator(vcs: Arc<FakeVcs>, prompter: MockPrompter) -> LifecycleCoordinator {
        let resolver = Arc::new(FakeResolver::resolving(vcs.clone()));
        LifecycleCoordinator::new(FakeVcs::config(), vcs, Arc::new(prompter), resolver).unwrap()
    }

    fn deployed_fixture() -> Arc<FakeVcs> {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a", "feat-b", "feat-c"]));
        let deployed = names(&["main", "feat-a", "feat-b"]);
        vcs.add_remote_branch("qa1--with--feat-a", names(&["main", "feat-a"]));
        vcs.add_remote_branch("qa1", deployed.clone());
        vcs.add_remote_branch("qa1--with--feat-a--feat-b", deployed);
        vcs
    }

    #[tokio::test]
    async fn test_deploy_pushes_qa_and_composite_to_same_tip() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a", "feat-b"]));
        let mut prompter = MockPrompter::new();
        prompter.expect_select_one().times(0);
        prompter.expect_confirm().times(0);
        prompter.expect_select_many().times(1).returning(pick(&["feat-a", "feat-b"]));
        let coordinator = coordinator(vcs.clone(), prompter);

        let report = coordinator
            .deploy_to_qa(Some("qa1"), None)
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(report.composite, "qa1--with--feat-a--feat-b");
        assert_eq!(vcs.pushes(), names(&["qa1", "qa1--with--feat-a--feat-b"]));
        let qa_tip = vcs.remote_tree("qa1");
        assert!(qa_tip.is_some());
        assert_eq!(qa_tip, vcs.remote_tree("qa1--with--feat-a--feat-b"));
        assert_eq!(qa_tip.unwrap(), names(&["main", "feat-a", "feat-b"]));
    }

    #[tokio::test]
    async fn test_deploy_with_resolved_conflict_keeps_branch_in_name() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a", "feat-b"]));
        vcs.set_conflicting("feat-b");
        let mut prompter = MockPrompter::new();
        prompter.expect_select_many().returning(pick(&["feat-a", "feat-b"]));
        let coordinator = coordinator(vcs.clone(), prompter);

        let report = coordinator
            .deploy_to_qa(Some("qa1"), None)
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(report.merge.resolved, names(&["feat-b"]));
        assert_eq!(report.composite, "qa1--with--feat-a--feat-b");
        assert!(vcs.remote_names().contains(&"qa1--with--feat-a--feat-b".to_string()));
    }

    #[tokio::test]
    async fn test_deploy_selects_the_only_empty_environment() {
        let vcs = deployed_fixture();
        let mut prompter = MockPrompter::new();
        prompter.expect_select_one().times(0);
        prompter.expect_select_many().returning(pick(&["feat-c"]));
        let coordinator = coordinator(vcs.clone(), prompter);

        let report = coordinator.deploy_to_qa(None, None).await.unwrap().completed().unwrap();
        assert_eq!(report.qa, "qa2");
        assert_eq!(report.composite, "qa2--with--feat-c");
    }

    #[tokio::test]
    async fn test_declined_overwrite_is_a_no_op() {
        let vcs = deployed_fixture();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| false);
        prompter.expect_select_many().times(0);
        let coordinator = coordinator(vcs.clone(), prompter);

        let outcome = coordinator.deploy_to_qa(Some("qa1"), None).await.unwrap();
        assert!(outcome.is_no_op());
        assert!(vcs.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_is_a_no_op() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a"]));
        let mut prompter = MockPrompter::new();
        prompter.expect_select_many().returning(|_, _| None);
        let coordinator = coordinator(vcs.clone(), prompter);

        let outcome = coordinator.deploy_to_qa(Some("qa1"), None).await.unwrap();
        assert!(outcome.is_no_op());
        assert!(vcs.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_to_unknown_qa_is_refused() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a"]));
        let coordinator = coordinator(vcs.clone(), MockPrompter::new());

        let err = coordinator.deploy_to_qa(Some("staging"), None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownQaBranch { .. }));
    }

    #[tokio::test]
    async fn test_failed_composite_push_fails_deploy() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a"]));
        vcs.fail_push_to("qa1--with--feat-a");
        let mut prompter = MockPrompter::new();
        prompter.expect_select_many().returning(pick(&["feat-a"]));
        let coordinator = coordinator(vcs.clone(), prompter);

        let err = coordinator.deploy_to_qa(Some("qa1"), None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::VcsCommandFailed(_)));
    }

    #[tokio::test]
    async fn test_clear_with_nothing_to_clear_never_prompts() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a"]));
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(0);
        let coordinator = coordinator(vcs.clone(), prompter);

        let outcome = coordinator.clear_qa(&names(&["qa1"]), false).await.unwrap();
        assert!(outcome.is_no_op());
        assert!(vcs.deletions().is_empty());
    }

    #[tokio::test]
    async fn test_clear_deletes_bare_and_composite_refs_only() {
        let vcs = deployed_fixture();
        vcs.add_remote_branch("qa10", names(&["main"]));
        vcs.add_remote_branch("qa2--with--feat-c", names(&["main", "feat-c"]));
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| true);
        let coordinator = coordinator(vcs.clone(), prompter);

        let report = coordinator
            .clear_qa(&names(&["qa1"]), false)
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(
            report.deleted,
            names(&["qa1", "qa1--with--feat-a", "qa1--with--feat-a--feat-b"])
        );
        let remaining = vcs.remote_names();
        assert!(remaining.contains(&"qa10".to_string()));
        assert!(remaining.contains(&"qa2--with--feat-c".to_string()));
    }

    #[tokio::test]
    async fn test_clear_declined_deletes_nothing() {
        let vcs = deployed_fixture();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_| false);
        let coordinator = coordinator(vcs.clone(), prompter);

        let outcome = coordinator.clear_qa(&[], true).await.unwrap();
        assert!(outcome.is_no_op());
        assert!(vcs.deletions().is_empty());
    }

    #[tokio::test]
    async fn test_promotion_deletes_superseded_refs_after_push() {
        let vcs = deployed_fixture();
        vcs.add_remote_branch("release", names(&["main"]));
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| true);
        let coordinator = coordinator(vcs.clone(), prompter);

        let report = coordinator
            .promote_qa_to_source(Some("qa1"))
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(vcs.pushes(), names(&["main"]));
        assert_eq!(vcs.remote_tree("main").unwrap(), names(&["main", "feat-a", "feat-b"]));
        assert_eq!(
            report.deleted,
            names(&["feat-a", "feat-b", "qa1", "qa1--with--feat-a", "qa1--with--feat-a--feat-b"])
        );
        let remaining = vcs.remote_names();
        assert_eq!(remaining, names(&["feat-c", "main", "release"]));

        let log = vcs.log();
        let push_at = log.iter().position(|e| e.starts_with("push --force")).unwrap();
        let first_delete = log.iter().position(|e| e.starts_with("push origin --delete")).unwrap();
        assert!(push_at < first_delete);
    }

    #[tokio::test]
    async fn test_failed_source_push_deletes_nothing() {
        let vcs = deployed_fixture();
        vcs.fail_push_to("main");
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_| true);
        let coordinator = coordinator(vcs.clone(), prompter);

        let err = coordinator.promote_qa_to_source(Some("qa1")).await.unwrap_err();

        assert!(matches!(err, WorkflowError::VcsCommandFailed(_)));
        assert!(vcs.deletions().is_empty());
        let snapshot = coordinator.snapshot("qa1").await.unwrap();
        assert_eq!(snapshot.state(), EnvironmentState::Deployed);
    }

    #[tokio::test]
    async fn test_unresolved_merge_during_promotion_deletes_nothing() {
        let vcs = deployed_fixture();
        vcs.set_conflicting("main");
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_| true);
        let resolver = Arc::new(FakeResolver::giving_up(vcs.clone()));
        let coordinator =
            LifecycleCoordinator::new(FakeVcs::config(), vcs.clone(), Arc::new(prompter), resolver.clone()).unwrap();

        let err = coordinator.promote_qa_to_source(Some("qa1")).await.unwrap_err();

        assert!(matches!(err, WorkflowError::UnresolvedConflict { ref branch, .. } if branch == "main"));
        assert_eq!(resolver.calls(), names(&["main"]));
        assert!(vcs.pushes().is_empty());
        assert!(vcs.deletions().is_empty());
        assert!(!vcs.merge_pending());
        let snapshot = coordinator.snapshot("qa1").await.unwrap();
        assert_eq!(snapshot.state(), EnvironmentState::Deployed);
    }

    #[tokio::test]
    async fn test_promotion_never_deletes_source_or_local_branch() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a", "feat-c"]));
        let deployed = names(&["main", "feat-a"]);
        vcs.add_remote_branch("qa-train-local", names(&["main"]));
        vcs.add_remote_branch("qa1", deployed.clone());
        vcs.add_remote_branch("qa1--with--feat-a--main", deployed);
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| true);
        let coordinator = coordinator(vcs.clone(), prompter);

        let report = coordinator
            .promote_qa_to_source(Some("qa1"))
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(vcs.pushes(), names(&["main"]));
        assert_eq!(report.deleted, names(&["feat-a", "qa1", "qa1--with--feat-a--main"]));
        assert!(!vcs.deletions().iter().any(|d| d == "main" || d == "qa-train-local"));
        assert_eq!(vcs.remote_names(), names(&["feat-c", "main", "qa-train-local"]));
    }

    #[tokio::test]
    async fn test_source_branch_is_not_offered_for_deploy() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a"]));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_select_many()
            .withf(|items: &[String], _: &str| items.iter().all(|item| !item.starts_with("main ")))
            .times(1)
            .returning(|_, _| None);
        let coordinator = coordinator(vcs.clone(), prompter);

        let outcome = coordinator.deploy_to_qa(Some("qa1"), None).await.unwrap();
        assert!(outcome.is_no_op());
        assert!(vcs.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_promoting_empty_environment_is_a_no_op() {
        let vcs = Arc::new(FakeVcs::with_branches(&["main", "feat-a"]));
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(0);
        let coordinator = coordinator(vcs.clone(), prompter);

        let outcome = coordinator.promote_qa_to_source(Some("qa2")).await.unwrap();
        assert!(outcome.is_no_op());
        assert!(vcs.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_partial_delete_failure_is_reported() {
        let vcs = deployed_fixture();
        vcs.fail_delete_of("qa1--with--feat-a");
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|_| true);
        let coordinator = coordinator(vcs.clone(), prompter);

        let err = coordinator.clear_qa(&names(&["qa1"]), false).await.unwrap_err();
        match err {
            WorkflowError::DeletionFailed { deleted, failed } => {
                assert_eq!(failed, names(&["qa1--with--feat-a"]));
                assert_eq!(deleted, names(&["qa1", "qa1--with--feat-a--feat-b"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_listing_hides_qa_and_ignored_branches() {
        let vcs = deployed_fixture();
        vcs.add_remote_branch("release", names(&["main"]));
        let coordinator = coordinator(vcs.clone(), MockPrompter::new());

        let selectable: Vec<String> = coordinator
            .remote_branches(None, false)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(selectable, names(&["feat-c", "feat-b", "feat-a"]));

        let all = coordinator.remote_branches(Some("^qa1"), true).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
