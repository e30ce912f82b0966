//! Local repository inspection
//!
//! Read-only queries go through libgit2; everything that changes the
//! repository or talks to the remote goes through the git binary
//! (`crate::external::git`).

pub mod inspect;

pub use inspect::{Git2Inspector, RepoInspect};
