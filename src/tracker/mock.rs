use crate::error::{FlowError, Result};
use crate::tracker::{Tracker, TrackerIssue, TrackerVersion};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

struct MockIssue {
    issue: TrackerIssue,
    closed: bool,
}

#[derive(Default)]
struct State {
    versions: Vec<TrackerVersion>,
    issues: HashMap<String, Vec<MockIssue>>,
    next_id: u32,
    move_count: usize,
    deleted: Vec<String>,
}

/// Mock tracker for testing without a REST endpoint
///
/// Keeps versions in a manually ordered list the way the real tracker
/// does: created versions land at the end, move operations reorder.
pub struct MockTracker {
    state: Mutex<State>,
}

impl MockTracker {
    pub fn new() -> Self {
        MockTracker {
            state: Mutex::new(State::default()),
        }
    }

    /// Seed a version at the end of the list; returns its id
    pub fn add_version(&self, name: impl Into<String>, released: bool) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("{}", 10000 + state.next_id);
        state.versions.push(TrackerVersion {
            id: id.clone(),
            name: name.into(),
            released,
            release_date: None,
            project_id: "10200".to_string(),
            self_link: format!("https://tracker.test/rest/api/2/version/{}", id),
        });
        id
    }

    /// Seed an issue fixed in a version
    pub fn add_issue(&self, version_id: &str, key: impl Into<String>, closed: bool) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let issue = TrackerIssue {
            id: format!("{}", 20000 + state.next_id),
            key: key.into(),
        };
        state
            .issues
            .entry(version_id.to_string())
            .or_default()
            .push(MockIssue { issue, closed });
    }

    /// Version names in the tracker's current native order
    pub fn version_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .versions
            .iter()
            .map(|v| v.name.clone())
            .collect()
    }

    /// Look up a version by id
    pub fn version(&self, id: &str) -> Option<TrackerVersion> {
        self.state
            .lock()
            .unwrap()
            .versions
            .iter()
            .find(|v| v.id == id)
            .cloned()
    }

    /// Number of move operations performed so far
    pub fn move_count(&self) -> usize {
        self.state.lock().unwrap().move_count
    }

    /// Ids of deleted versions, in deletion order
    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// Keys of all issues currently fixed in a version
    pub fn issue_keys(&self, version_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .issues
            .get(version_id)
            .map(|issues| issues.iter().map(|i| i.issue.key.clone()).collect())
            .unwrap_or_default()
    }

    fn position(state: &State, id: &str) -> Result<usize> {
        state
            .versions
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| FlowError::tracker(404, format!("version id '{}' not found", id)))
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker for MockTracker {
    fn create_version(&self, _project: &str, name: &str) -> Result<TrackerVersion> {
        let id = self.add_version(name, false);
        Ok(self.version(&id).unwrap())
    }

    fn versions(&self, _project: &str) -> Result<Vec<TrackerVersion>> {
        Ok(self.state.lock().unwrap().versions.clone())
    }

    fn move_version_after(&self, id: &str, after_self_link: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let from = Self::position(&state, id)?;
        let version = state.versions.remove(from);
        let anchor = state
            .versions
            .iter()
            .position(|v| v.self_link == after_self_link)
            .ok_or_else(|| {
                FlowError::tracker(404, format!("anchor '{}' not found", after_self_link))
            })?;
        state.versions.insert(anchor + 1, version);
        state.move_count += 1;
        Ok(())
    }

    fn move_version_first(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let from = Self::position(&state, id)?;
        let version = state.versions.remove(from);
        state.versions.insert(0, version);
        state.move_count += 1;
        Ok(())
    }

    fn release_version(&self, id: &str, release_date: NaiveDate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let pos = Self::position(&state, id)?;
        state.versions[pos].released = true;
        state.versions[pos].release_date = Some(release_date);
        Ok(())
    }

    fn delete_version(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let pos = Self::position(&state, id)?;
        state.versions.remove(pos);
        state.issues.remove(id);
        state.deleted.push(id.to_string());
        Ok(())
    }

    fn non_closed_issues(&self, version_id: &str) -> Result<Vec<TrackerIssue>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .issues
            .get(version_id)
            .map(|issues| {
                issues
                    .iter()
                    .filter(|i| !i.closed)
                    .map(|i| i.issue.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn closed_issues(&self, version_id: &str) -> Result<Vec<TrackerIssue>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .issues
            .get(version_id)
            .map(|issues| {
                issues
                    .iter()
                    .filter(|i| i.closed)
                    .map(|i| i.issue.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn move_issues_to_version(
        &self,
        issues: &[TrackerIssue],
        from_id: &str,
        to_id: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for issue in issues {
            let moved = state
                .issues
                .get_mut(from_id)
                .and_then(|list| {
                    list.iter()
                        .position(|i| i.issue.id == issue.id)
                        .map(|pos| list.remove(pos))
                })
                .ok_or_else(|| {
                    FlowError::tracker(
                        404,
                        format!("issue '{}' not fixed in version '{}'", issue.key, from_id),
                    )
                })?;
            state
                .issues
                .entry(to_id.to_string())
                .or_default()
                .push(moved);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_create_appends_at_end() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.0", false);
        tracker.create_version("PRJ", "1.1.0").unwrap();
        assert_eq!(tracker.version_names(), vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_mock_move_first_and_after() {
        let tracker = MockTracker::new();
        let a = tracker.add_version("1.0.0", false);
        tracker.add_version("1.1.0", false);
        let c = tracker.add_version("0.9.0", false);

        tracker.move_version_first(&c).unwrap();
        assert_eq!(tracker.version_names(), vec!["0.9.0", "1.0.0", "1.1.0"]);

        let a_link = tracker.version(&a).unwrap().self_link;
        let names_before = tracker.version_names();
        tracker.move_version_after(&c, &a_link).unwrap();
        assert_ne!(tracker.version_names(), names_before);
        assert_eq!(tracker.version_names(), vec!["1.0.0", "0.9.0", "1.1.0"]);
        assert_eq!(tracker.move_count(), 2);
    }

    #[test]
    fn test_mock_issue_filters() {
        let tracker = MockTracker::new();
        let v = tracker.add_version("1.0.0", false);
        tracker.add_issue(&v, "PRJ-1", false);
        tracker.add_issue(&v, "PRJ-2", true);

        let open = tracker.non_closed_issues(&v).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].key, "PRJ-1");

        let closed = tracker.closed_issues(&v).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].key, "PRJ-2");
    }

    #[test]
    fn test_mock_move_issues() {
        let tracker = MockTracker::new();
        let from = tracker.add_version("1.0.0", false);
        let to = tracker.add_version("1.1.0", false);
        tracker.add_issue(&from, "PRJ-1", false);

        let issues = tracker.non_closed_issues(&from).unwrap();
        tracker.move_issues_to_version(&issues, &from, &to).unwrap();

        assert!(tracker.issue_keys(&from).is_empty());
        assert_eq!(tracker.issue_keys(&to), vec!["PRJ-1"]);
    }

    #[test]
    fn test_mock_release_and_delete() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("1.0.0", false);
        tracker
            .release_version(&id, NaiveDate::from_ymd_opt(2026, 8, 24).unwrap())
            .unwrap();
        assert!(tracker.version(&id).unwrap().released);

        tracker.delete_version(&id).unwrap();
        assert!(tracker.version(&id).is_none());
        assert_eq!(tracker.deleted(), vec![id]);
    }
}
