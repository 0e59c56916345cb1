//! Branch topology queries: ancestor resolution and remote freshness checks
//!
//! Backed entirely by the [Vcs] collaborator; holds no state of its own.

use crate::error::{FlowError, Result};
use crate::git::Vcs;

/// Outcome of an ancestor query over an operator-supplied expected set
///
/// Ephemeral, recomputed per query. The caller decides how to proceed:
/// an empty result falls back to an operator-supplied value, multiple
/// matches must be disambiguated by the operator, never auto-selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorResult {
    None,
    Single(String),
    Multiple(Vec<String>),
}

/// Branch topology component over a VCS collaborator
pub struct BranchTopology<'a> {
    vcs: &'a dyn Vcs,
    remotes: &'a [String],
}

impl<'a> BranchTopology<'a> {
    pub fn new(vcs: &'a dyn Vcs, remotes: &'a [String]) -> Self {
        BranchTopology { vcs, remotes }
    }

    /// Find which of the expected branches are ancestors of HEAD
    pub fn find_ancestor(&self, expected: &[String]) -> Result<AncestorResult> {
        let mut matches = self.vcs.ancestors(expected)?;
        Ok(match matches.len() {
            0 => AncestorResult::None,
            1 => AncestorResult::Single(matches.remove(0)),
            _ => AncestorResult::Multiple(matches),
        })
    }

    /// Verify that a branch is not behind or diverged from any remote
    ///
    /// Per remote: fetch, then compare the local tip, the remote tip, and
    /// their merge base. Equal tips are up to date; a local tip equal to
    /// the base means the branch is behind (pull first); a remote tip equal
    /// to the base means the remote is behind, which a later push will fix;
    /// anything else is a divergence (rebase first).
    ///
    /// The originally checked-out branch is restored on every exit path.
    pub fn ensure_branch_up_to_date(&self, branch: &str) -> Result<()> {
        if self.remotes.is_empty() {
            return Err(FlowError::NoRemotesConfigured);
        }

        let original = self.vcs.current_branch()?;
        let result = self.check_remotes(branch);

        if let Some(original) = original {
            if self.vcs.current_branch()?.as_deref() != Some(original.as_str()) {
                self.vcs.checkout(&original)?;
            }
        }

        result
    }

    fn check_remotes(&self, branch: &str) -> Result<()> {
        self.vcs.checkout(branch)?;

        for remote in self.remotes {
            self.vcs.fetch(remote)?;

            let local = self.vcs.hash(branch, None)?;
            let remote_hash = self.vcs.hash(branch, Some(remote))?;
            let base = self.vcs.merge_base_with_remote(branch, branch, remote)?;

            // Branch not on this remote yet; a later push will create it
            let Some(remote_hash) = remote_hash else {
                continue;
            };

            if local.as_deref() == Some(remote_hash.as_str()) {
                continue;
            }
            if local == base {
                return Err(FlowError::Behind {
                    branch: branch.to_string(),
                    remote: remote.clone(),
                });
            }
            if Some(remote_hash.as_str()) == base.as_deref() {
                continue;
            }
            return Err(FlowError::Diverged {
                branch: branch.to_string(),
                remote: remote.clone(),
            });
        }

        Ok(())
    }
}
