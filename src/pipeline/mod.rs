//! Release pipeline state machine
//!
//! States are (branch classification x flags); transitions are a fixed
//! dispatch table, not a cycle. Every path terminates in at most one
//! build-and-commit pause point followed by optional continuation, modeled
//! as an explicit [NextAction] instead of step-to-step chaining.

pub mod steps;

pub use steps::ReleasePipeline;

use crate::domain::{BranchName, SemanticVersion};

/// Per-invocation state threaded through the pipeline steps
///
/// Constructed once per operator invocation, never shared across
/// invocations.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Branch the pipeline was invoked on
    pub branch: BranchName,
    /// Optional commit to branch from when resuming
    pub commit: Option<String>,
    /// Stop after resolving state, before any side effect
    pub start_release_phase: bool,
    /// Run build and tracker sync, then stop for manual inspection
    pub pause_for_commit: bool,
    /// Squash superseded unreleased tracker versions on release
    pub squash_unreleased: bool,
}

impl PipelineContext {
    pub fn new(branch: impl Into<String>) -> Self {
        PipelineContext {
            branch: BranchName::new(branch),
            commit: None,
            start_release_phase: false,
            pause_for_commit: false,
            squash_unreleased: false,
        }
    }
}

/// The pipeline steps a dispatch can land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Entry on develop: resolve the next version and head for master
    BranchFromDevelop,
    /// Entry on master: resolve the next patch
    BranchFromMaster,
    /// Entry on a release branch: first RC or RC continuation
    BranchFromRelease,
    /// Entry on a hotfix branch: version comes from the branch name
    BranchFromHotfix,
    /// Terminal: release on master (or the release train branch)
    ContinueOnMaster,
    /// Terminal: release a patch on its line
    ContinuePatch,
    /// Terminal: tag a pre-release on the release branch
    TagPrerelease,
}

/// What a step decided to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Path complete, or stopped by `start_release_phase`
    Stop,
    /// Stopped by `pause_for_commit`; the operator continues manually
    PauseAndStop,
    /// Chain into the given step with the resolved version
    Continue {
        step: StepKind,
        version: SemanticVersion,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Classification;

    #[test]
    fn test_context_classifies_branch() {
        let ctx = PipelineContext::new("release/v1.3.0");
        assert_eq!(ctx.branch.classification, Classification::Release);
        assert!(!ctx.start_release_phase);
        assert!(ctx.commit.is_none());
    }
}
