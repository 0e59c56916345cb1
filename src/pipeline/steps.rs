use crate::build::{BuildMode, BuildRunner};
use crate::config::Config;
use crate::domain::{Classification, PreReleaseStage, SemanticVersion};
use crate::error::{FlowError, Result};
use crate::git::Vcs;
use crate::operator::Operator;
use crate::pipeline::{NextAction, PipelineContext, StepKind};
use crate::topology::{AncestorResult, BranchTopology};
use crate::tracker::{Tracker, VersionSync};

/// The release pipeline over its four collaborators
///
/// Holds no state of its own; everything per-invocation travels in the
/// [PipelineContext].
pub struct ReleasePipeline<'a> {
    vcs: &'a dyn Vcs,
    tracker: &'a dyn Tracker,
    operator: &'a dyn Operator,
    build: &'a dyn BuildRunner,
    config: &'a Config,
}

impl<'a> ReleasePipeline<'a> {
    pub fn new(
        vcs: &'a dyn Vcs,
        tracker: &'a dyn Tracker,
        operator: &'a dyn Operator,
        build: &'a dyn BuildRunner,
        config: &'a Config,
    ) -> Self {
        ReleasePipeline {
            vcs,
            tracker,
            operator,
            build,
            config,
        }
    }

    /// Run the pipeline from the context's branch until a step stops
    pub fn run(&self, ctx: &PipelineContext) -> Result<()> {
        let entry = self.entry_step(ctx)?;
        let mut action = self.run_step(entry, None, ctx)?;
        while let NextAction::Continue { step, version } = action {
            action = self.run_step(step, Some(version), ctx)?;
        }
        Ok(())
    }

    /// The fixed dispatch table from branch classification to entry step
    pub fn entry_step(&self, ctx: &PipelineContext) -> Result<StepKind> {
        match ctx.branch.classification {
            Classification::Develop => Ok(StepKind::BranchFromDevelop),
            Classification::Master => Ok(StepKind::BranchFromMaster),
            Classification::Release => Ok(StepKind::BranchFromRelease),
            Classification::Hotfix => Ok(StepKind::BranchFromHotfix),
            Classification::Support | Classification::Prerelease | Classification::Other => {
                self.resume_step(ctx)
            }
        }
    }

    fn run_step(
        &self,
        step: StepKind,
        version: Option<SemanticVersion>,
        ctx: &PipelineContext,
    ) -> Result<NextAction> {
        match step {
            StepKind::BranchFromDevelop => self.branch_from_develop(ctx),
            StepKind::BranchFromMaster => self.branch_from_master(ctx),
            StepKind::BranchFromRelease => self.branch_from_release(ctx),
            StepKind::BranchFromHotfix => self.branch_from_hotfix(ctx),
            StepKind::ContinueOnMaster => self.continue_on_master(version, ctx),
            StepKind::ContinuePatch => self.continue_patch(version, ctx),
            StepKind::TagPrerelease => self.tag_prerelease(version, ctx),
        }
    }

    /// Resuming an in-progress release: route on the ancestor line the
    /// current branch was cut from. Ambiguity always goes to the operator.
    fn resume_step(&self, ctx: &PipelineContext) -> Result<StepKind> {
        let develop = &self.config.git.develop_branch;
        let mut expected = vec![develop.clone()];
        expected.extend(
            self.vcs
                .local_branches()?
                .into_iter()
                .filter(|b| b.starts_with("hotfix/v")),
        );

        let topology = BranchTopology::new(self.vcs, &self.config.git.remotes);
        let ancestor = match topology.find_ancestor(&expected)? {
            AncestorResult::None => {
                return Err(FlowError::InvalidAncestor(format!(
                    "'{}' descends from neither '{}' nor a hotfix/v* branch",
                    ctx.branch.raw, develop
                )))
            }
            AncestorResult::Single(ancestor) => ancestor,
            AncestorResult::Multiple(matches) => self
                .operator
                .read_string_choice("Select the ancestor branch to resume from", &matches)?,
        };

        if &ancestor == develop {
            Ok(StepKind::ContinueOnMaster)
        } else if ancestor.starts_with("hotfix/v") {
            Ok(StepKind::ContinuePatch)
        } else {
            Err(FlowError::InvalidAncestor(ancestor))
        }
    }

    // ---- entry steps -----------------------------------------------------

    fn branch_from_develop(&self, ctx: &PipelineContext) -> Result<NextAction> {
        let current = self
            .latest_tagged_version()?
            .unwrap_or_else(|| SemanticVersion::new(0, 0, 0));
        let candidates = current.next_possible_versions_develop();
        let version =
            self.choose_version("Select the next version to release from develop", &candidates)?;

        self.entry_outcome(ctx, version, BuildMode::Release, StepKind::ContinueOnMaster)
    }

    fn branch_from_master(&self, ctx: &PipelineContext) -> Result<NextAction> {
        let current = self
            .latest_tagged_version()?
            .unwrap_or_else(|| SemanticVersion::new(0, 0, 0));
        let candidates = current.next_possible_versions_hotfix();
        let version = self.choose_version("Select the next patch version", &candidates)?;

        self.entry_outcome(ctx, version, BuildMode::Patch, StepKind::ContinuePatch)
    }

    fn branch_from_release(&self, ctx: &PipelineContext) -> Result<NextAction> {
        let target = ctx.branch.version()?;

        let candidates = if target.pre.is_some() {
            // RC continuation of the version named by the branch
            target.next_possible_versions_for_release_branch_from_develop()
        } else {
            match self.latest_prerelease_tag(&target)? {
                Some(latest) => latest.next_possible_versions_for_release_branch_from_develop(),
                None => vec![SemanticVersion::pre_release(
                    target.major,
                    target.minor,
                    target.patch,
                    PreReleaseStage::Rc,
                    1,
                )?],
            }
        };
        let version =
            self.choose_version("Select the release-candidate version", &candidates)?;

        // An rc promoted to final leaves the release branch for master
        let next = if version.is_final() {
            StepKind::ContinueOnMaster
        } else {
            StepKind::TagPrerelease
        };
        self.entry_outcome(ctx, version, BuildMode::Prerelease, next)
    }

    fn branch_from_hotfix(&self, ctx: &PipelineContext) -> Result<NextAction> {
        let target = ctx.branch.version()?;

        let candidates = if self.vcs.tag_exists(&format!("v{}", target))? {
            target.next_possible_versions_hotfix()
        } else {
            vec![target]
        };
        let version = self.choose_version("Select the hotfix version", &candidates)?;

        self.entry_outcome(ctx, version, BuildMode::Patch, StepKind::ContinuePatch)
    }

    // ---- terminal steps --------------------------------------------------

    fn continue_on_master(
        &self,
        version: Option<SemanticVersion>,
        ctx: &PipelineContext,
    ) -> Result<NextAction> {
        let version = self.resolve_terminal_version(version, ctx, true)?;
        if ctx.start_release_phase {
            return Ok(NextAction::Stop);
        }

        let branch = if version.is_final() {
            let master = self.config.git.master_branch.clone();
            if self.vcs.branch_exists(&master)? {
                self.topology().ensure_branch_up_to_date(&master)?;
                self.vcs.checkout(&master)?;
            } else {
                self.vcs.checkout_new_branch(&master)?;
            }
            master
        } else {
            // A pre-release bound for master lives on its release train
            let line = format!("release/v{}", version.as_final());
            self.checkout_line(&line, ctx)?;
            line
        };

        self.terminal_outcome(ctx, version, BuildMode::Release, &branch, true)
    }

    fn continue_patch(
        &self,
        version: Option<SemanticVersion>,
        ctx: &PipelineContext,
    ) -> Result<NextAction> {
        let version = self.resolve_terminal_version(version, ctx, false)?;
        if ctx.start_release_phase {
            return Ok(NextAction::Stop);
        }

        let branch = match self.vcs.current_branch()? {
            Some(current) if current.starts_with("hotfix/") => {
                self.topology().ensure_branch_up_to_date(&current)?;
                current
            }
            _ => {
                let line = format!("hotfix/v{}", version.as_final());
                self.checkout_line(&line, ctx)?;
                line
            }
        };

        self.terminal_outcome(ctx, version, BuildMode::Patch, &branch, false)
    }

    fn tag_prerelease(
        &self,
        version: Option<SemanticVersion>,
        ctx: &PipelineContext,
    ) -> Result<NextAction> {
        let version = match version {
            Some(version) => version,
            None => ctx.branch.version()?,
        };
        if ctx.start_release_phase {
            return Ok(NextAction::Stop);
        }

        let branch = self
            .vcs
            .current_branch()?
            .ok_or_else(|| FlowError::branch("Not on a branch".to_string()))?;

        self.terminal_outcome(ctx, version, BuildMode::Prerelease, &branch, false)
    }

    // ---- flag handling ---------------------------------------------------

    /// Flag short-circuits shared by the entry steps: `start_release_phase`
    /// stops before any side effect; `pause_for_commit` builds, syncs and
    /// stops; otherwise sync, build, chain.
    fn entry_outcome(
        &self,
        ctx: &PipelineContext,
        version: SemanticVersion,
        mode: BuildMode,
        next: StepKind,
    ) -> Result<NextAction> {
        if ctx.start_release_phase {
            return Ok(NextAction::Stop);
        }
        if ctx.pause_for_commit {
            self.build.call_build_steps_and_commit(mode, &version)?;
            self.sync_created(&version)?;
            return Ok(NextAction::PauseAndStop);
        }
        self.sync_created(&version)?;
        self.build.call_build_steps_and_commit(mode, &version)?;
        Ok(NextAction::Continue { step: next, version })
    }

    /// Terminal counterpart: on the non-paused path the chain ends by
    /// tagging the commit and pushing branch and tag to every remote.
    fn terminal_outcome(
        &self,
        ctx: &PipelineContext,
        version: SemanticVersion,
        mode: BuildMode,
        branch: &str,
        develop_line: bool,
    ) -> Result<NextAction> {
        if ctx.pause_for_commit {
            self.build.call_build_steps_and_commit(mode, &version)?;
            self.sync_terminal(&version, ctx, develop_line)?;
            return Ok(NextAction::PauseAndStop);
        }

        self.sync_terminal(&version, ctx, develop_line)?;
        self.build.call_build_steps_and_commit(mode, &version)?;

        let tag = format!("v{}", version);
        self.vcs.tag(&tag, &format!("Release {}", version))?;
        let set_upstream = self.should_set_upstream(branch)?;
        self.vcs
            .push(&self.config.git.remotes, branch, Some(&tag), set_upstream)?;

        Ok(NextAction::Stop)
    }

    // ---- tracker sync ----------------------------------------------------

    /// Entry-side sync: mirror the chosen version on the tracker
    fn sync_created(&self, version: &SemanticVersion) -> Result<()> {
        let sync = VersionSync::new(self.tracker);
        sync.create_version_if_absent(&self.config.tracker.project, &version.to_string())?;
        Ok(())
    }

    /// Release-side sync: a final version is released into an
    /// operator-chosen follow-up that carries the unresolved work; a
    /// pre-release only mirrors its version record.
    fn sync_terminal(
        &self,
        version: &SemanticVersion,
        ctx: &PipelineContext,
        develop_line: bool,
    ) -> Result<()> {
        let project = &self.config.tracker.project;
        let sync = VersionSync::new(self.tracker);
        let shipped_id = sync.create_version_if_absent(project, &version.to_string())?;

        if !version.is_final() {
            return Ok(());
        }

        let candidates = if develop_line {
            version.next_possible_versions_develop()
        } else {
            version.next_possible_versions_hotfix()
        };
        let follow = self.choose_version(
            "Select the follow-up version for unresolved work",
            &candidates,
        )?;
        let follow_id = sync.create_version_if_absent(project, &follow.to_string())?;

        if ctx.squash_unreleased {
            sync.release_and_squash_unreleased(project, &shipped_id, &follow_id)
        } else {
            sync.release_version(&shipped_id, &follow_id)
        }
    }

    // ---- helpers ---------------------------------------------------------

    /// Version for a terminal step: the chained value wins, then the
    /// version embedded in the invoking branch name, then a fresh
    /// derivation from the highest tag
    fn resolve_terminal_version(
        &self,
        version: Option<SemanticVersion>,
        ctx: &PipelineContext,
        develop_line: bool,
    ) -> Result<SemanticVersion> {
        if let Some(version) = version {
            return Ok(version);
        }
        if let Ok(version) = ctx.branch.version() {
            return Ok(version);
        }
        let current = self
            .latest_tagged_version()?
            .unwrap_or_else(|| SemanticVersion::new(0, 0, 0));
        let candidates = if develop_line {
            current.next_possible_versions_develop()
        } else {
            current.next_possible_versions_hotfix()
        };
        self.choose_version("Select the version to release", &candidates)
    }

    fn topology(&self) -> BranchTopology<'_> {
        BranchTopology::new(self.vcs, &self.config.git.remotes)
    }

    /// Auto-select a sole candidate; more than one goes to the operator
    fn choose_version(
        &self,
        prompt: &str,
        candidates: &[SemanticVersion],
    ) -> Result<SemanticVersion> {
        match candidates {
            [] => Err(FlowError::format(
                "No next version can be derived here".to_string(),
            )),
            [only] => Ok(*only),
            _ => self.operator.read_version_choice(prompt, candidates),
        }
    }

    /// Highest version among all parseable tags
    fn latest_tagged_version(&self) -> Result<Option<SemanticVersion>> {
        Ok(self
            .vcs
            .list_tags()?
            .iter()
            .filter_map(|tag| SemanticVersion::parse(tag).ok())
            .max())
    }

    /// Highest pre-release tag sharing the target's primary key
    fn latest_prerelease_tag(
        &self,
        target: &SemanticVersion,
    ) -> Result<Option<SemanticVersion>> {
        Ok(self
            .vcs
            .list_tags()?
            .iter()
            .filter_map(|tag| SemanticVersion::parse(tag).ok())
            .filter(|v| v.primary() == target.primary() && v.pre.is_some())
            .max())
    }

    /// Check out an existing line, or cut it fresh (from the given commit
    /// when the context names one)
    fn checkout_line(&self, branch: &str, ctx: &PipelineContext) -> Result<()> {
        if self.vcs.branch_exists(branch)? {
            self.topology().ensure_branch_up_to_date(branch)?;
            self.vcs.checkout(branch)
        } else if let Some(commit) = &ctx.commit {
            self.vcs.checkout_commit_with_new_branch(commit, branch)
        } else {
            self.vcs.checkout_new_branch(branch)
        }
    }

    /// The first remote becomes upstream only when neither the branch nor
    /// its nearest long-lived ancestor already tracks one
    fn should_set_upstream(&self, branch: &str) -> Result<bool> {
        if self.vcs.tracked_remote(branch)?.is_some() {
            return Ok(false);
        }
        let expected = vec![
            self.config.git.develop_branch.clone(),
            self.config.git.master_branch.clone(),
        ];
        let nearest = match self.topology().find_ancestor(&expected)? {
            AncestorResult::None => return Ok(true),
            AncestorResult::Single(ancestor) => ancestor,
            AncestorResult::Multiple(mut matches) => matches.remove(0),
        };
        Ok(self.vcs.tracked_remote(&nearest)?.is_none())
    }
}
