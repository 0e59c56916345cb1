//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations
//! the release pipeline needs, allowing for a real implementation backed by
//! the `git2` crate and a mock implementation for testing.
//!
//! Most code should depend on the [Vcs] trait rather than concrete
//! implementations to enable easy testing and flexibility.

pub mod mock;
pub mod repository;

pub use mock::MockVcs;
pub use repository::Git2Vcs;

use crate::error::Result;

/// Common git operation trait for abstraction
///
/// All implementors must be `Send + Sync` to allow safe sharing across
/// threads. All methods return [crate::error::Result] which handles
/// git-specific and application errors uniformly; implementations map
/// underlying failures (like `git2::Error`) to [crate::error::FlowError]
/// variants carrying a textual reason.
///
/// Implementations:
/// - [Git2Vcs](repository::Git2Vcs): real implementation using `git2`
/// - [MockVcs](mock::MockVcs): test implementation
pub trait Vcs: Send + Sync {
    /// Name of the currently checked-out branch, `None` on detached HEAD
    fn current_branch(&self) -> Result<Option<String>>;

    /// Branches from `expected` that exist and are topological ancestors of
    /// HEAD, excluding the current branch itself
    fn ancestors(&self, expected: &[String]) -> Result<Vec<String>>;

    /// All local branch names
    fn local_branches(&self) -> Result<Vec<String>>;

    /// Whether a local branch with this name exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Whether a tag with this name exists
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Commit hash of a branch tip; on `remote`'s copy of the branch when a
    /// remote is given. `None` when the branch does not exist there.
    fn hash(&self, branch: &str, remote: Option<&str>) -> Result<Option<String>>;

    /// Most recent common ancestor of a local branch and its counterpart on
    /// a remote, `None` when either side is missing
    fn merge_base_with_remote(
        &self,
        branch: &str,
        branch_on_remote: &str,
        remote: &str,
    ) -> Result<Option<String>>;

    /// Check out an existing local branch
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Create a branch at HEAD and check it out
    fn checkout_new_branch(&self, branch: &str) -> Result<()>;

    /// Create a branch at the given commit and check it out
    fn checkout_commit_with_new_branch(&self, commit: &str, branch: &str) -> Result<()>;

    /// Create an annotated tag at HEAD
    fn tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push a branch (and optionally a tag) to each of the given remotes.
    /// When `set_upstream` is true the first remote becomes the branch's
    /// tracked upstream.
    fn push(
        &self,
        remotes: &[String],
        branch: &str,
        tag: Option<&str>,
        set_upstream: bool,
    ) -> Result<()>;

    /// Fetch from a remote
    fn fetch(&self, remote: &str) -> Result<()>;

    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// The remote a branch currently tracks, if any
    fn tracked_remote(&self, branch: &str) -> Result<Option<String>>;
}
