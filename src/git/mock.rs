use crate::error::{FlowError, Result};
use crate::git::Vcs;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A recorded push for later assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub remote: String,
    pub branch: String,
    pub tag: Option<String>,
    pub set_upstream: bool,
}

#[derive(Default)]
struct State {
    current_branch: Option<String>,
    /// Local branch tip hashes
    local_hashes: HashMap<String, String>,
    /// (remote, branch) -> tip hash
    remote_hashes: HashMap<(String, String), String>,
    /// (branch, remote) -> merge base hash
    merge_bases: HashMap<(String, String), String>,
    /// Branches that are ancestors of HEAD
    ancestor_branches: HashSet<String>,
    tags: HashSet<String>,
    tracked_remotes: HashMap<String, String>,
    checkouts: Vec<String>,
    pushes: Vec<PushRecord>,
    fetches: Vec<String>,
}

/// Mock VCS for testing without actual git operations
///
/// State is seeded through the `set_*`/`add_*` builders; mutating trait
/// calls (checkout, tag, push) are recorded for assertions.
pub struct MockVcs {
    state: Mutex<State>,
}

impl MockVcs {
    /// Create an empty mock on the given branch
    pub fn new(current_branch: impl Into<String>) -> Self {
        let mock = MockVcs {
            state: Mutex::new(State::default()),
        };
        mock.state.lock().unwrap().current_branch = Some(current_branch.into());
        mock
    }

    /// Set a local branch tip hash (creates the branch)
    pub fn set_branch_hash(&self, branch: impl Into<String>, hash: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .local_hashes
            .insert(branch.into(), hash.into());
    }

    /// Set a remote branch tip hash
    pub fn set_remote_hash(
        &self,
        remote: impl Into<String>,
        branch: impl Into<String>,
        hash: impl Into<String>,
    ) {
        self.state
            .lock()
            .unwrap()
            .remote_hashes
            .insert((remote.into(), branch.into()), hash.into());
    }

    /// Set the merge base between a branch and its remote counterpart
    pub fn set_merge_base(
        &self,
        branch: impl Into<String>,
        remote: impl Into<String>,
        hash: impl Into<String>,
    ) {
        self.state
            .lock()
            .unwrap()
            .merge_bases
            .insert((branch.into(), remote.into()), hash.into());
    }

    /// Mark a branch as a topological ancestor of HEAD
    pub fn add_ancestor(&self, branch: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .ancestor_branches
            .insert(branch.into());
    }

    /// Add an existing tag
    pub fn add_tag(&self, name: impl Into<String>) {
        self.state.lock().unwrap().tags.insert(name.into());
    }

    /// Set the remote a branch tracks
    pub fn set_tracked_remote(&self, branch: impl Into<String>, remote: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .tracked_remotes
            .insert(branch.into(), remote.into());
    }

    /// Every checkout performed, in order
    pub fn checkouts(&self) -> Vec<String> {
        self.state.lock().unwrap().checkouts.clone()
    }

    /// Every push performed, in order
    pub fn pushes(&self) -> Vec<PushRecord> {
        self.state.lock().unwrap().pushes.clone()
    }

    /// Every remote fetched, in order
    pub fn fetches(&self) -> Vec<String> {
        self.state.lock().unwrap().fetches.clone()
    }

    /// Tags created through the trait (seeded tags included)
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.state.lock().unwrap().tags.iter().cloned().collect();
        tags.sort();
        tags
    }
}

impl Vcs for MockVcs {
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().current_branch.clone())
    }

    fn ancestors(&self, expected: &[String]) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(expected
            .iter()
            .filter(|name| Some(name.as_str()) != state.current_branch.as_deref())
            .filter(|name| state.ancestor_branches.contains(name.as_str()))
            .cloned()
            .collect())
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state.local_hashes.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().local_hashes.contains_key(name))
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().tags.contains(name))
    }

    fn hash(&self, branch: &str, remote: Option<&str>) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(match remote {
            Some(remote) => state
                .remote_hashes
                .get(&(remote.to_string(), branch.to_string()))
                .cloned(),
            None => state.local_hashes.get(branch).cloned(),
        })
    }

    fn merge_base_with_remote(
        &self,
        branch: &str,
        _branch_on_remote: &str,
        remote: &str,
    ) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .merge_bases
            .get(&(branch.to_string(), remote.to_string()))
            .cloned())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.local_hashes.contains_key(branch) {
            return Err(FlowError::branch(format!("Branch not found: {}", branch)));
        }
        state.checkouts.push(branch.to_string());
        state.current_branch = Some(branch.to_string());
        Ok(())
    }

    fn checkout_new_branch(&self, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let head_hash = state
            .current_branch
            .as_ref()
            .and_then(|b| state.local_hashes.get(b))
            .cloned()
            .unwrap_or_else(|| "HEAD".to_string());
        state.local_hashes.insert(branch.to_string(), head_hash);
        state.checkouts.push(branch.to_string());
        state.current_branch = Some(branch.to_string());
        Ok(())
    }

    fn checkout_commit_with_new_branch(&self, commit: &str, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .local_hashes
            .insert(branch.to_string(), commit.to_string());
        state.checkouts.push(branch.to_string());
        state.current_branch = Some(branch.to_string());
        Ok(())
    }

    fn tag(&self, name: &str, _message: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.tags.insert(name.to_string()) {
            return Err(FlowError::tag(format!("Tag already exists: {}", name)));
        }
        Ok(())
    }

    fn push(
        &self,
        remotes: &[String],
        branch: &str,
        tag: Option<&str>,
        set_upstream: bool,
    ) -> Result<()> {
        if remotes.is_empty() {
            return Err(FlowError::NoRemotesConfigured);
        }
        let mut state = self.state.lock().unwrap();
        for (i, remote) in remotes.iter().enumerate() {
            state.pushes.push(PushRecord {
                remote: remote.clone(),
                branch: branch.to_string(),
                tag: tag.map(|t| t.to_string()),
                set_upstream: set_upstream && i == 0,
            });
        }
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.state.lock().unwrap().fetches.push(remote.to_string());
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.tags())
    }

    fn tracked_remote(&self, branch: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tracked_remotes
            .get(branch)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_current_branch_and_checkout() {
        let vcs = MockVcs::new("develop");
        vcs.set_branch_hash("master", "abc");

        assert_eq!(vcs.current_branch().unwrap(), Some("develop".to_string()));
        vcs.checkout("master").unwrap();
        assert_eq!(vcs.current_branch().unwrap(), Some("master".to_string()));
        assert_eq!(vcs.checkouts(), vec!["master".to_string()]);
    }

    #[test]
    fn test_mock_checkout_missing_branch_fails() {
        let vcs = MockVcs::new("develop");
        assert!(vcs.checkout("nope").is_err());
    }

    #[test]
    fn test_mock_ancestors_exclude_current() {
        let vcs = MockVcs::new("develop");
        vcs.add_ancestor("develop");
        vcs.add_ancestor("master");

        let found = vcs
            .ancestors(&["develop".to_string(), "master".to_string()])
            .unwrap();
        assert_eq!(found, vec!["master".to_string()]);
    }

    #[test]
    fn test_mock_tags() {
        let vcs = MockVcs::new("master");
        vcs.add_tag("v1.0.0");
        assert!(vcs.tag_exists("v1.0.0").unwrap());
        assert!(!vcs.tag_exists("v2.0.0").unwrap());

        vcs.tag("v1.1.0", "release v1.1.0").unwrap();
        assert!(vcs.tag_exists("v1.1.0").unwrap());
        // Duplicate tag creation is an error
        assert!(vcs.tag("v1.1.0", "again").is_err());
    }

    #[test]
    fn test_mock_push_records_upstream_on_first_remote_only() {
        let vcs = MockVcs::new("master");
        vcs.push(
            &["origin".to_string(), "backup".to_string()],
            "master",
            Some("v1.0.0"),
            true,
        )
        .unwrap();

        let pushes = vcs.pushes();
        assert_eq!(pushes.len(), 2);
        assert!(pushes[0].set_upstream);
        assert!(!pushes[1].set_upstream);
        assert_eq!(pushes[0].tag, Some("v1.0.0".to_string()));
    }

    #[test]
    fn test_mock_push_no_remotes_fails() {
        let vcs = MockVcs::new("master");
        let err = vcs.push(&[], "master", None, false).unwrap_err();
        assert!(matches!(err, FlowError::NoRemotesConfigured));
    }
}
