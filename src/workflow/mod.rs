//! QA environment workflow engine
//!
//! Feature branches are composed onto a reserved local integration branch,
//! published to shared QA environment refs, and finally promoted into the
//! source branch. The composition of each environment lives only in remote
//! ref names (`<qa>--with--<b1>--...--<bn>`).

pub mod classifier;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod merge;
pub mod naming;
pub mod snapshot;
pub mod workspace;

#[cfg(test)]
pub(crate) mod fakes;

pub use classifier::{BranchClassifier, Classification, NameRejection};
pub use coordinator::{ClearReport, DeployReport, LifecycleCoordinator, PromotionReport, QaFilter};
pub use error::{Outcome, WorkflowError};
pub use gate::{authorize_push, Operation, PromotionGate, PushTarget};
pub use merge::{AutomatedPass, MergeOrchestrator, MergeReport};
pub use naming::{NamingCodec, QaEnvironmentName};
pub use snapshot::{EnvironmentState, QaEnvironmentSnapshot, SnapshotView};
pub use workspace::CleanWorkspace;
