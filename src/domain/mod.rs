//! Domain logic - pure version and branch rules independent of git or tracker

pub mod branch;
pub mod ordering;
pub mod stage;
pub mod version;

pub use branch::{BranchName, Classification};
pub use ordering::OrderingKey;
pub use stage::{PreRelease, PreReleaseStage};
pub use version::SemanticVersion;
