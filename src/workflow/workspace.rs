use crate::external::VcsPort;

/// Setup/teardown scope around every operation that mutates the local
/// checkout. The working tree and the local integration branch are shared
/// by the whole process; two concurrent runs against one checkout are not
/// supported and nothing locks against them.
pub struct CleanWorkspace<'a> {
    vcs: &'a dyn VcsPort,
    original_branch: Option<String>,
}

impl<'a> CleanWorkspace<'a> {
    pub async fn acquire(vcs: &'a dyn VcsPort) -> CleanWorkspace<'a> {
        let original_branch = match vcs.current_branch_name().await {
            Ok(branch) if branch != "HEAD" => Some(branch),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not determine the starting branch");
                None
            }
        };
        Self {
            vcs,
            original_branch,
        }
    }

    /// Runs on success and failure alike: never leaves a merge half-applied,
    /// and after a failure returns the operator to where they started.
    pub async fn release(self, succeeded: bool) {
        match self.vcs.merge_in_progress().await {
            Ok(true) => {
                tracing::warn!("aborting merge left in progress");
                println!("\n$ git merge --abort");
                if let Err(e) = self.vcs.abort_merge().await {
                    tracing::error!(error = %e, "failed to abort in-progress merge");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "could not check for an in-progress merge"),
        }

        if succeeded {
            return;
        }
        let Some(original) = self.original_branch else {
            return;
        };
        match self.vcs.current_branch_name().await {
            Ok(current) if current == original => {}
            _ => {
                println!("\n$ git checkout {original}");
                if let Err(e) = self.vcs.checkout_existing(&original).await {
                    tracing::warn!(branch = %original, error = %e, "could not return to starting branch");
                }
            }
        }
    }
}
