//! Tracker version synchronization
//!
//! Keeps the tracker's manually ordered version list consistent with the
//! release history: creating versions on demand, repairing their position
//! to match version order, releasing shipped versions, and squashing
//! superseded unreleased versions into the one that actually ships.

use crate::domain::{OrderingKey, SemanticVersion};
use crate::error::{FlowError, Result};
use crate::tracker::{Tracker, TrackerVersion};
use chrono::Local;
use std::cmp::Ordering;

/// Version synchronization component over a tracker collaborator
pub struct VersionSync<'a> {
    tracker: &'a dyn Tracker,
}

impl<'a> VersionSync<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        VersionSync { tracker }
    }

    /// Look up a version by exact name, creating and positioning it when
    /// absent. Returns the version id.
    ///
    /// # Errors
    /// [FlowError::VersionAlreadyReleased] when a version of this name
    /// exists but was already shipped.
    pub fn create_version_if_absent(&self, project: &str, name: &str) -> Result<String> {
        let versions = self.tracker.versions(project)?;

        if let Some(existing) = versions.iter().find(|v| v.name == name) {
            if existing.released {
                return Err(FlowError::VersionAlreadyReleased(name.to_string()));
            }
            return Ok(existing.id.clone());
        }

        let created = self.tracker.create_version(project, name)?;
        self.repair_version_position(project, &created.id)?;
        Ok(created.id)
    }

    /// Move a version to its correct relative position in the tracker's
    /// manually ordered list
    ///
    /// The target and its siblings are parsed under the same scheme
    /// (4-component dotted numeric or semantic); siblings that fail to
    /// parse stay in the raw sequence but are excluded from comparability
    /// decisions. The target is moved to follow the nearest preceding
    /// version with a strictly smaller value, or to the first position
    /// when no preceding version is smaller. No-op when already placed.
    pub fn repair_version_position(&self, project: &str, version_id: &str) -> Result<()> {
        let versions = self.tracker.versions(project)?;
        let target_pos = versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| {
                FlowError::tracker(
                    404,
                    format!("version id '{}' not found in project '{}'", version_id, project),
                )
            })?;
        let target = &versions[target_pos];

        // An unparsable target has no defined position; leave it alone
        let Some(target_key) = OrderingKey::parse(&target.name) else {
            return Ok(());
        };

        let anchor = versions[..target_pos]
            .iter()
            .enumerate()
            .filter_map(|(i, v)| OrderingKey::parse(&v.name).map(|key| (i, v, key)))
            .filter(|(_, _, key)| {
                key.same_scheme(&target_key)
                    && key.partial_cmp(&target_key) == Some(Ordering::Less)
            })
            .last();

        match anchor {
            None => {
                if target_pos != 0 {
                    self.tracker.move_version_first(version_id)?;
                }
            }
            Some((anchor_pos, anchor_version, _)) => {
                if target_pos != anchor_pos + 1 {
                    self.tracker
                        .move_version_after(version_id, &anchor_version.self_link)?;
                }
            }
        }

        Ok(())
    }

    /// Release a version, carrying its unresolved work forward
    ///
    /// When `id` and `next_id` differ, every non-closed issue migrates from
    /// `id` to `next_id` first; closed issues stay. The version is then
    /// marked released with today's date.
    pub fn release_version(&self, id: &str, next_id: &str) -> Result<()> {
        if id != next_id {
            let open = self.tracker.non_closed_issues(id)?;
            if !open.is_empty() {
                self.tracker.move_issues_to_version(&open, id, next_id)?;
            }
        }
        self.tracker
            .release_version(id, Local::now().date_naive())
    }

    /// Release a version and squash every unreleased version strictly
    /// between it and the follow-up version
    ///
    /// The squash set is computed over the semantic total order of the
    /// project's parseable version names. Two invariants are checked, both
    /// before any write:
    /// - no member of the squash set may already be released
    /// - no member may carry closed issues
    ///
    /// Only then each member's open issues move to `next_id` and the member
    /// is deleted; a tracker failure partway leaves a partially-squashed,
    /// operator-recoverable state. Finishes with [Self::release_version].
    pub fn release_and_squash_unreleased(
        &self,
        project: &str,
        id: &str,
        next_id: &str,
    ) -> Result<()> {
        if id == next_id {
            return self.release_version(id, next_id);
        }

        let versions = self.tracker.versions(project)?;
        let mut parsed: Vec<(SemanticVersion, &TrackerVersion)> = versions
            .iter()
            .filter_map(|v| SemanticVersion::parse(&v.name).ok().map(|sv| (sv, v)))
            .collect();
        parsed.sort_by(|a, b| a.0.cmp(&b.0));

        let position = |wanted: &str| -> Result<usize> {
            parsed
                .iter()
                .position(|(_, v)| v.id == wanted)
                .ok_or_else(|| {
                    FlowError::tracker(
                        404,
                        format!("version id '{}' not found in project '{}'", wanted, project),
                    )
                })
        };
        let lo = position(id)?;
        let hi = position(next_id)?;
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };

        let squash_set: Vec<&TrackerVersion> =
            parsed[lo + 1..hi].iter().map(|(_, v)| *v).collect();

        let released: Vec<String> = squash_set
            .iter()
            .filter(|v| v.released)
            .map(|v| v.name.clone())
            .collect();
        if !released.is_empty() {
            return Err(FlowError::SquashBlockedReleased(released));
        }

        let mut closed_keys = Vec::new();
        for member in &squash_set {
            for issue in self.tracker.closed_issues(&member.id)? {
                closed_keys.push(issue.key);
            }
        }
        if !closed_keys.is_empty() {
            return Err(FlowError::SquashBlockedClosedIssues(closed_keys));
        }

        for member in &squash_set {
            let open = self.tracker.non_closed_issues(&member.id)?;
            if !open.is_empty() {
                self.tracker
                    .move_issues_to_version(&open, &member.id, next_id)?;
            }
            self.tracker.delete_version(&member.id)?;
        }

        self.release_version(id, next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MockTracker;

    const PROJECT: &str = "PRJ";

    #[test]
    fn test_create_version_if_absent_creates_and_positions() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.0", false);
        tracker.add_version("1.2.0", false);

        let sync = VersionSync::new(&tracker);
        let id = sync.create_version_if_absent(PROJECT, "1.1.0").unwrap();

        assert!(tracker.version(&id).is_some());
        assert_eq!(tracker.version_names(), vec!["1.0.0", "1.1.0", "1.2.0"]);
    }

    #[test]
    fn test_create_version_if_absent_returns_existing_unreleased() {
        let tracker = MockTracker::new();
        let existing = tracker.add_version("1.1.0", false);

        let sync = VersionSync::new(&tracker);
        let id = sync.create_version_if_absent(PROJECT, "1.1.0").unwrap();

        assert_eq!(id, existing);
        assert_eq!(tracker.move_count(), 0);
    }

    #[test]
    fn test_create_version_if_absent_rejects_released() {
        let tracker = MockTracker::new();
        tracker.add_version("1.1.0", true);

        let sync = VersionSync::new(&tracker);
        let err = sync.create_version_if_absent(PROJECT, "1.1.0").unwrap_err();
        assert!(matches!(err, FlowError::VersionAlreadyReleased(_)));
    }

    #[test]
    fn test_repair_moves_to_first_when_smallest() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.0", false);
        tracker.add_version("1.1.0", false);
        let id = tracker.add_version("0.9.0", false);

        let sync = VersionSync::new(&tracker);
        sync.repair_version_position(PROJECT, &id).unwrap();
        assert_eq!(tracker.version_names(), vec!["0.9.0", "1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_repair_moves_after_nearest_smaller() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.0", false);
        tracker.add_version("1.2.0", false);
        let id = tracker.add_version("1.1.0", false);

        let sync = VersionSync::new(&tracker);
        sync.repair_version_position(PROJECT, &id).unwrap();
        assert_eq!(tracker.version_names(), vec!["1.0.0", "1.1.0", "1.2.0"]);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.0", false);
        tracker.add_version("1.2.0", false);
        let id = tracker.add_version("1.1.0", false);

        let sync = VersionSync::new(&tracker);
        sync.repair_version_position(PROJECT, &id).unwrap();
        let moves = tracker.move_count();
        sync.repair_version_position(PROJECT, &id).unwrap();
        assert_eq!(tracker.move_count(), moves, "second repair must not move");
    }

    #[test]
    fn test_repair_skips_unparsable_siblings() {
        let tracker = MockTracker::new();
        tracker.add_version("Sprint 42", false);
        tracker.add_version("1.0.0", false);
        let id = tracker.add_version("1.1.0", false);

        let sync = VersionSync::new(&tracker);
        sync.repair_version_position(PROJECT, &id).unwrap();
        // Unparsable name keeps its raw position, parseable ones order
        assert_eq!(tracker.version_names(), vec!["Sprint 42", "1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_repair_ignores_other_scheme() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.0.5", false);
        let id = tracker.add_version("1.1.0", false);

        let sync = VersionSync::new(&tracker);
        sync.repair_version_position(PROJECT, &id).unwrap();
        // Dotted-4 and semantic are incomparable: target moves to first
        assert_eq!(tracker.version_names(), vec!["1.1.0", "1.0.0.5"]);
    }

    #[test]
    fn test_repair_prerelease_ordering() {
        let tracker = MockTracker::new();
        tracker.add_version("1.0.1-alpha.1", false);
        tracker.add_version("1.0.1", false);
        let id = tracker.add_version("1.0.1-beta.1", false);

        let sync = VersionSync::new(&tracker);
        sync.repair_version_position(PROJECT, &id).unwrap();
        assert_eq!(
            tracker.version_names(),
            vec!["1.0.1-alpha.1", "1.0.1-beta.1", "1.0.1"]
        );
    }

    #[test]
    fn test_release_version_migrates_open_issues() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("1.0.0", false);
        let next = tracker.add_version("1.1.0", false);
        tracker.add_issue(&id, "PRJ-1", false);
        tracker.add_issue(&id, "PRJ-2", true);

        let sync = VersionSync::new(&tracker);
        sync.release_version(&id, &next).unwrap();

        assert!(tracker.version(&id).unwrap().released);
        // Open issue moved, closed issue stayed
        assert_eq!(tracker.issue_keys(&id), vec!["PRJ-2"]);
        assert_eq!(tracker.issue_keys(&next), vec!["PRJ-1"]);
    }

    #[test]
    fn test_release_version_same_id_keeps_issues() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("1.0.0", false);
        tracker.add_issue(&id, "PRJ-1", false);

        let sync = VersionSync::new(&tracker);
        sync.release_version(&id, &id).unwrap();

        assert!(tracker.version(&id).unwrap().released);
        assert_eq!(tracker.issue_keys(&id), vec!["PRJ-1"]);
    }

    /// Layout from the squash scenarios: 1.0.0 releasing into 1.0.1-beta.1
    /// with two alpha versions in between
    fn squash_layout(tracker: &MockTracker) -> (String, String, String, String) {
        let id = tracker.add_version("1.0.0", false);
        let alpha1 = tracker.add_version("1.0.1-alpha.1", false);
        let alpha2 = tracker.add_version("1.0.1-alpha.2", false);
        let next = tracker.add_version("1.0.1-beta.1", false);
        (id, alpha1, alpha2, next)
    }

    #[test]
    fn test_squash_blocked_by_released_member() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("1.0.0", false);
        tracker.add_version("1.0.1-alpha.1", false);
        tracker.add_version("1.0.1-alpha.2", true);
        let next = tracker.add_version("1.0.1-beta.1", false);

        let sync = VersionSync::new(&tracker);
        let err = sync
            .release_and_squash_unreleased(PROJECT, &id, &next)
            .unwrap_err();

        match err {
            FlowError::SquashBlockedReleased(names) => {
                assert_eq!(names, vec!["1.0.1-alpha.2"]);
            }
            other => panic!("expected SquashBlockedReleased, got {:?}", other),
        }
        // Nothing mutated
        assert_eq!(tracker.version_names().len(), 4);
        assert!(tracker.deleted().is_empty());
        assert!(!tracker.version(&id).unwrap().released);
    }

    #[test]
    fn test_squash_blocked_by_closed_issues() {
        let tracker = MockTracker::new();
        let (id, alpha1, _, next) = squash_layout(&tracker);
        tracker.add_issue(&alpha1, "PRJ-7", true);

        let sync = VersionSync::new(&tracker);
        let err = sync
            .release_and_squash_unreleased(PROJECT, &id, &next)
            .unwrap_err();

        match err {
            FlowError::SquashBlockedClosedIssues(keys) => {
                assert_eq!(keys, vec!["PRJ-7"]);
            }
            other => panic!("expected SquashBlockedClosedIssues, got {:?}", other),
        }
        assert_eq!(tracker.version_names().len(), 4);
        assert!(tracker.deleted().is_empty());
    }

    #[test]
    fn test_squash_deletes_members_and_moves_open_issues() {
        let tracker = MockTracker::new();
        let (id, alpha1, alpha2, next) = squash_layout(&tracker);
        tracker.add_issue(&alpha1, "PRJ-3", false);
        tracker.add_issue(&id, "PRJ-1", false);

        let sync = VersionSync::new(&tracker);
        sync.release_and_squash_unreleased(PROJECT, &id, &next)
            .unwrap();

        assert_eq!(tracker.deleted(), vec![alpha1, alpha2]);
        assert_eq!(tracker.version_names(), vec!["1.0.0", "1.0.1-beta.1"]);
        assert!(tracker.version(&id).unwrap().released);
        // Both the squashed member's and the released version's open issues
        // ended up on the shipping version
        assert_eq!(tracker.issue_keys(&next), vec!["PRJ-3", "PRJ-1"]);
    }

    #[test]
    fn test_squash_with_empty_set_behaves_like_release() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("1.0.0", false);
        let next = tracker.add_version("1.0.1", false);
        tracker.add_issue(&id, "PRJ-1", false);

        let sync = VersionSync::new(&tracker);
        sync.release_and_squash_unreleased(PROJECT, &id, &next)
            .unwrap();

        assert!(tracker.deleted().is_empty());
        assert!(tracker.version(&id).unwrap().released);
        assert_eq!(tracker.issue_keys(&next), vec!["PRJ-1"]);
    }

    #[test]
    fn test_squash_ignores_unparsable_version_names() {
        let tracker = MockTracker::new();
        let id = tracker.add_version("1.0.0", false);
        tracker.add_version("Backlog", true);
        let next = tracker.add_version("1.0.1", false);

        let sync = VersionSync::new(&tracker);
        // "Backlog" is released but unparsable, so it never enters the
        // squash set and cannot block the release
        sync.release_and_squash_unreleased(PROJECT, &id, &next)
            .unwrap();
        assert!(tracker.version(&id).unwrap().released);
    }
}
