//! Issue-tracker abstraction layer
//!
//! Mirrors the subset of a JIRA-style version/issue API the release flow
//! needs. The [Tracker] trait is the collaborator contract; [RestTracker]
//! talks to the real REST API and [MockTracker] backs the tests. The
//! synchronization algorithms themselves live in [sync].

pub mod client;
pub mod mock;
pub mod sync;

pub use client::RestTracker;
pub use mock::MockTracker;
pub use sync::VersionSync;

use crate::error::Result;
use chrono::NaiveDate;

/// A tracker version record, mirrored not owned
///
/// Its position among sibling versions is the tracker's own manually
/// ordered list, independent of semantic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerVersion {
    pub id: String,
    pub name: String,
    pub released: bool,
    pub release_date: Option<NaiveDate>,
    pub project_id: String,
    /// Opaque link used for relative-move operations
    pub self_link: String,
}

/// A tracker issue, identified by its key (e.g. "PRJ-42")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerIssue {
    pub id: String,
    pub key: String,
}

/// Issue-tracker collaborator contract
///
/// Each call maps a non-2xx response to a typed error carrying the HTTP
/// status. No call is retried automatically.
pub trait Tracker: Send + Sync {
    /// Create a version in a project; the tracker appends it to the end of
    /// the project's version list
    fn create_version(&self, project: &str, name: &str) -> Result<TrackerVersion>;

    /// All versions of a project in the tracker's native manual order
    fn versions(&self, project: &str) -> Result<Vec<TrackerVersion>>;

    /// Move a version to immediately follow the version behind `after_self_link`
    fn move_version_after(&self, id: &str, after_self_link: &str) -> Result<()>;

    /// Move a version to the first position of its project's list
    fn move_version_first(&self, id: &str) -> Result<()>;

    /// Mark a version released on the given date
    fn release_version(&self, id: &str, release_date: NaiveDate) -> Result<()>;

    /// Delete a version record
    fn delete_version(&self, id: &str) -> Result<()>;

    /// All issues fixed in a version that are not closed
    fn non_closed_issues(&self, version_id: &str) -> Result<Vec<TrackerIssue>>;

    /// All closed issues fixed in a version
    fn closed_issues(&self, version_id: &str) -> Result<Vec<TrackerIssue>>;

    /// Re-target the fix version of the given issues from one version to another
    fn move_issues_to_version(
        &self,
        issues: &[TrackerIssue],
        from_id: &str,
        to_id: &str,
    ) -> Result<()>;
}
