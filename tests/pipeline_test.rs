// tests/pipeline_test.rs
//
// End-to-end pipeline runs against the mock collaborators: each test drives
// a complete release path and asserts on the recorded git, tracker, and
// build side effects.

use releaseflow::build::RecordingBuildRunner;
use releaseflow::config::Config;
use releaseflow::domain::SemanticVersion;
use releaseflow::error::FlowError;
use releaseflow::git::MockVcs;
use releaseflow::operator::{Answer, ScriptedOperator};
use releaseflow::pipeline::{PipelineContext, ReleasePipeline};
use releaseflow::tracker::{MockTracker, Tracker};

fn v(s: &str) -> SemanticVersion {
    SemanticVersion::parse(s).unwrap()
}

fn config_with_remotes(remotes: &[&str]) -> Config {
    let mut config = Config::default();
    config.git.remotes = remotes.iter().map(|r| r.to_string()).collect();
    config.tracker.base_url = "https://tracker.test".to_string();
    config.tracker.project = "PRJ".to_string();
    config
}

#[test]
fn test_develop_release_pushes_to_every_remote() {
    let vcs = MockVcs::new("develop");
    vcs.set_branch_hash("develop", "d0");
    vcs.set_branch_hash("master", "m0");
    vcs.set_tracked_remote("master", "origin");
    vcs.add_tag("v1.2.3");

    let tracker = MockTracker::new();
    let operator = ScriptedOperator::new(vec![
        Answer::Version(v("1.3.0")),
        Answer::Version(v("1.4.0-alpha.1")),
    ]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin", "backup"]);

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline.run(&PipelineContext::new("develop")).unwrap();

    // Branch and tag pushed once per remote
    let pushes = vcs.pushes();
    assert_eq!(pushes.len(), 2);
    assert!(pushes.iter().all(|p| p.branch == "master"));
    assert!(pushes.iter().all(|p| p.tag == Some("v1.3.0".to_string())));
    assert_eq!(pushes[0].remote, "origin");
    assert_eq!(pushes[1].remote, "backup");

    // Shipped version released on the tracker, follow-up created unreleased
    let versions = tracker.versions("PRJ").unwrap();
    let shipped = versions.iter().find(|ver| ver.name == "1.3.0").unwrap();
    assert!(shipped.released);
    let follow = versions
        .iter()
        .find(|ver| ver.name == "1.4.0-alpha.1")
        .unwrap();
    assert!(!follow.released);
}

#[test]
fn test_rc_promotion_moves_from_release_branch_to_master() {
    let vcs = MockVcs::new("release/v1.3.0");
    vcs.set_branch_hash("release/v1.3.0", "r0");
    vcs.add_tag("v1.3.0-rc.1");

    let tracker = MockTracker::new();
    let operator = ScriptedOperator::new(vec![
        Answer::Version(v("1.3.0")),
        Answer::Version(v("1.4.0-alpha.1")),
    ]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline.run(&PipelineContext::new("release/v1.3.0")).unwrap();

    // Promotion left the release branch: master created and pushed
    assert!(vcs.checkouts().contains(&"master".to_string()));
    let pushes = vcs.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].branch, "master");
    assert_eq!(pushes[0].tag, Some("v1.3.0".to_string()));
}

#[test]
fn test_resume_disambiguation_is_never_automatic() {
    let vcs = MockVcs::new("prerelease/v1.2.4-alpha.2");
    vcs.set_branch_hash("prerelease/v1.2.4-alpha.2", "p0");
    vcs.set_branch_hash("develop", "d0");
    vcs.set_branch_hash("hotfix/v1.2.4", "h0");
    vcs.add_ancestor("develop");
    vcs.add_ancestor("hotfix/v1.2.4");
    vcs.add_tag("v1.2.3");

    let tracker = MockTracker::new();
    // The only question is the ancestor; the version comes from the branch
    let operator = ScriptedOperator::new(vec![Answer::Choice("hotfix/v1.2.4".to_string())]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline
        .run(&PipelineContext::new("prerelease/v1.2.4-alpha.2"))
        .unwrap();

    // The ancestor question was actually asked, never auto-selected
    assert!(operator
        .questions()
        .iter()
        .any(|q| q.contains("ancestor")));
    // Resumed on the hotfix line, tagging the in-flight pre-release
    assert!(vcs.checkouts().contains(&"hotfix/v1.2.4".to_string()));
    assert!(vcs.tags().contains(&"v1.2.4-alpha.2".to_string()));
    assert_eq!(tracker.version_names(), vec!["1.2.4-alpha.2"]);
}

#[test]
fn test_resume_without_gitflow_ancestor_fails() {
    let vcs = MockVcs::new("feature/login");
    vcs.set_branch_hash("feature/login", "f0");

    let tracker = MockTracker::new();
    let operator = ScriptedOperator::new(vec![]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    let err = pipeline
        .run(&PipelineContext::new("feature/login"))
        .unwrap_err();
    assert!(matches!(err, FlowError::InvalidAncestor(_)));
}

#[test]
fn test_release_aborts_when_master_is_behind() {
    let vcs = MockVcs::new("develop");
    vcs.set_branch_hash("develop", "d0");
    vcs.set_branch_hash("master", "m0");
    vcs.set_remote_hash("origin", "master", "m1");
    vcs.set_merge_base("master", "origin", "m0");
    vcs.add_tag("v1.2.3");

    let tracker = MockTracker::new();
    let operator = ScriptedOperator::new(vec![Answer::Version(v("1.3.0"))]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    let err = pipeline.run(&PipelineContext::new("develop")).unwrap_err();

    assert!(matches!(err, FlowError::Behind { .. }));
    // Nothing tagged or pushed on the failure path
    assert!(!vcs.tags().contains(&"v1.3.0".to_string()));
    assert!(vcs.pushes().is_empty());
}

#[test]
fn test_blocked_squash_prevents_tagging() {
    let vcs = MockVcs::new("hotfix/v1.0.1");
    vcs.set_branch_hash("hotfix/v1.0.1", "h0");

    let tracker = MockTracker::new();
    tracker.add_version("1.0.1", false);
    let alpha = tracker.add_version("1.0.2-alpha.1", false);
    // Closed issue in the squash set between 1.0.1 and the follow-up 1.0.2
    tracker.add_issue(&alpha, "PRJ-7", true);

    let operator = ScriptedOperator::new(vec![Answer::Version(v("1.0.2"))]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let mut ctx = PipelineContext::new("hotfix/v1.0.1");
    ctx.squash_unreleased = true;

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    let err = pipeline.run(&ctx).unwrap_err();

    match err {
        FlowError::SquashBlockedClosedIssues(keys) => assert_eq!(keys, vec!["PRJ-7"]),
        other => panic!("expected SquashBlockedClosedIssues, got {:?}", other),
    }
    // Tracker sync runs before tagging, so the failure left no tag behind
    assert!(!vcs.tags().contains(&"v1.0.1".to_string()));
    assert!(vcs.pushes().is_empty());
    assert!(tracker.deleted().is_empty());
}

#[test]
fn test_start_release_phase_has_no_side_effects() {
    let vcs = MockVcs::new("hotfix/v1.2.4");
    vcs.set_branch_hash("hotfix/v1.2.4", "h0");

    let tracker = MockTracker::new();
    let operator = ScriptedOperator::new(vec![]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let mut ctx = PipelineContext::new("hotfix/v1.2.4");
    ctx.start_release_phase = true;

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline.run(&ctx).unwrap();

    assert!(build.calls().is_empty());
    assert!(tracker.version_names().is_empty());
    assert!(vcs.tags().is_empty());
    assert!(vcs.pushes().is_empty());
}

#[test]
fn test_pause_for_commit_orders_build_before_sync() {
    let vcs = MockVcs::new("release/v2.0.0");
    vcs.set_branch_hash("release/v2.0.0", "r0");

    let tracker = MockTracker::new();
    let operator = ScriptedOperator::new(vec![]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let mut ctx = PipelineContext::new("release/v2.0.0");
    ctx.pause_for_commit = true;

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline.run(&ctx).unwrap();

    // Sole candidate 2.0.0-rc.1 auto-selected, built, synced, then paused
    assert_eq!(build.calls().len(), 1);
    assert_eq!(build.calls()[0].1, v("2.0.0-rc.1"));
    assert_eq!(tracker.version_names(), vec!["2.0.0-rc.1"]);
    assert!(vcs.tags().is_empty());
    assert!(vcs.pushes().is_empty());
}

#[test]
fn test_successful_squash_through_the_pipeline() {
    let vcs = MockVcs::new("develop");
    vcs.set_branch_hash("develop", "d0");
    vcs.set_branch_hash("master", "m0");
    vcs.add_tag("v1.2.3");

    let tracker = MockTracker::new();
    tracker.add_version("1.3.0", false);
    let alpha1 = tracker.add_version("1.3.1-alpha.1", false);
    tracker.add_issue(&alpha1, "PRJ-3", false);
    let alpha2 = tracker.add_version("1.3.1-alpha.2", false);

    let operator = ScriptedOperator::new(vec![
        Answer::Version(v("1.3.0")),
        Answer::Version(v("1.4.0-alpha.1")),
    ]);
    let build = RecordingBuildRunner::new();
    let config = config_with_remotes(&["origin"]);

    let mut ctx = PipelineContext::new("develop");
    ctx.squash_unreleased = true;

    let pipeline = ReleasePipeline::new(&vcs, &tracker, &operator, &build, &config);
    pipeline.run(&ctx).unwrap();

    // The alpha train between 1.3.0 and 1.4.0-alpha.1 was squashed into
    // the follow-up, carrying its open issue along
    assert_eq!(tracker.deleted(), vec![alpha1, alpha2]);
    let versions = tracker.versions("PRJ").unwrap();
    let follow = versions
        .iter()
        .find(|ver| ver.name == "1.4.0-alpha.1")
        .unwrap();
    assert_eq!(tracker.issue_keys(&follow.id), vec!["PRJ-3"]);
    assert!(versions.iter().find(|ver| ver.name == "1.3.0").unwrap().released);
}
