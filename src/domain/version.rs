use crate::domain::stage::{PreRelease, PreReleaseStage};
use crate::error::{FlowError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Semantic version with optional pre-release label
///
/// Immutable value type. Ordering: primary key (major, minor, patch)
/// ascending; for equal primary keys a final release sorts strictly after
/// any pre-release, and pre-releases order by stage (alpha < beta < rc)
/// then counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre: Option<PreRelease>,
}

impl SemanticVersion {
    /// Create a final release version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Create a pre-release version
    ///
    /// # Errors
    /// Fails if `counter` is zero.
    pub fn pre_release(
        major: u32,
        minor: u32,
        patch: u32,
        stage: PreReleaseStage,
        counter: u32,
    ) -> Result<Self> {
        Ok(SemanticVersion {
            major,
            minor,
            patch,
            pre: Some(PreRelease::new(stage, counter)?),
        })
    }

    /// Parse a version string
    ///
    /// Grammar: `[v|V]MAJOR.MINOR.PATCH[-(alpha|beta|rc).COUNTER]`, with a
    /// case-insensitive stage token and a counter of at least 1.
    pub fn parse(text: &str) -> Result<Self> {
        let re = regex::Regex::new(r"^[vV]?(\d+)\.(\d+)\.(\d+)(?:-((?i:alpha|beta|rc))\.(\d+))?$")
            .map_err(|e| FlowError::format(format!("Invalid version pattern: {}", e)))?;

        let captures = re.captures(text.trim()).ok_or_else(|| {
            FlowError::format(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR.PATCH[-stage.N]",
                text
            ))
        })?;

        let component = |index: usize, name: &str| -> Result<u32> {
            captures[index]
                .parse::<u32>()
                .map_err(|_| FlowError::format(format!("Invalid {} version: '{}'", name, &captures[index])))
        };

        let major = component(1, "major")?;
        let minor = component(2, "minor")?;
        let patch = component(3, "patch")?;

        let pre = match captures.get(4) {
            Some(stage) => {
                let stage = stage.as_str().parse::<PreReleaseStage>()?;
                let counter = component(5, "pre-release counter")?;
                Some(PreRelease::new(stage, counter)?)
            }
            None => None,
        };

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            pre,
        })
    }

    /// True when this is a final release (no pre-release label)
    pub fn is_final(&self) -> bool {
        self.pre.is_none()
    }

    /// The (major, minor, patch) triple
    pub fn primary(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// This version stripped of any pre-release label
    pub fn as_final(&self) -> Self {
        SemanticVersion::new(self.major, self.minor, self.patch)
    }

    /// Next patch release, no pre-release
    pub fn next_patch(&self) -> Self {
        SemanticVersion::new(self.major, self.minor, self.patch + 1)
    }

    /// Next minor release, patch reset
    pub fn next_minor(&self) -> Self {
        SemanticVersion::new(self.major, self.minor + 1, 0)
    }

    /// Next major release, minor and patch reset
    pub fn next_major(&self) -> Self {
        SemanticVersion::new(self.major + 1, 0, 0)
    }

    /// Same primary key with the given pre-release label
    fn with_pre(&self, pre: PreRelease) -> Self {
        SemanticVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre: Some(pre),
        }
    }

    /// Continuations of an in-flight pre-release train: the next counter at
    /// the same stage, the first counter of the promoted stage, and - when
    /// the stage is rc - the final release itself.
    fn prerelease_continuations(&self) -> Vec<SemanticVersion> {
        let mut out = Vec::new();
        if let Some(pre) = self.pre {
            out.push(self.with_pre(pre.next_counter()));
            match pre.promote() {
                Some(promoted) => out.push(self.with_pre(promoted)),
                None => out.push(self.as_final()),
            }
        }
        out
    }

    /// Candidate next versions when working on develop
    ///
    /// A final current version offers the next minor and next major, each as
    /// a final and as the start of an alpha train. A pre-release current
    /// version offers its continuations.
    pub fn next_possible_versions_develop(&self) -> Vec<SemanticVersion> {
        if self.pre.is_some() {
            return ordered(self.prerelease_continuations());
        }

        let alpha = PreRelease {
            stage: PreReleaseStage::Alpha,
            counter: 1,
        };
        ordered(vec![
            self.next_minor().with_pre(alpha),
            self.next_minor(),
            self.next_major().with_pre(alpha),
            self.next_major(),
        ])
    }

    /// Candidate next versions when working on a hotfix line
    ///
    /// Only the patch component may move; a fresh alpha train on the next
    /// patch is allowed for staged hotfixes.
    pub fn next_possible_versions_hotfix(&self) -> Vec<SemanticVersion> {
        if self.pre.is_some() {
            return ordered(self.prerelease_continuations());
        }

        let alpha = PreRelease {
            stage: PreReleaseStage::Alpha,
            counter: 1,
        };
        ordered(vec![
            self.next_patch().with_pre(alpha),
            self.next_patch(),
        ])
    }

    /// Candidate versions for a release branch cut from develop
    ///
    /// A pre-release current version continues its train; a final one
    /// offers the first rc of the next minor/major alongside the finals.
    pub fn next_possible_versions_for_release_branch_from_develop(
        &self,
    ) -> Vec<SemanticVersion> {
        if self.pre.is_some() {
            return ordered(self.prerelease_continuations());
        }

        let rc = PreRelease {
            stage: PreReleaseStage::Rc,
            counter: 1,
        };
        ordered(vec![
            self.next_minor().with_pre(rc),
            self.next_minor(),
            self.next_major().with_pre(rc),
            self.next_major(),
        ])
    }

    /// Candidate versions for a release branch cut from a hotfix line
    pub fn next_possible_versions_for_release_branch_from_hotfix(
        &self,
    ) -> Vec<SemanticVersion> {
        if self.pre.is_some() {
            return ordered(self.prerelease_continuations());
        }

        let rc = PreRelease {
            stage: PreReleaseStage::Rc,
            counter: 1,
        };
        ordered(vec![self.next_patch().with_pre(rc), self.next_patch()])
    }
}

/// Deduplicate and sort candidates ascending for deterministic presentation
fn ordered(mut candidates: Vec<SemanticVersion>) -> Vec<SemanticVersion> {
    candidates.sort();
    candidates.dedup();
    candidates
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.primary().cmp(&other.primary()) {
            Ordering::Equal => match (&self.pre, &other.pre) {
                // A final release sorts after any pre-release of the same key
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            },
            ord => ord,
        }
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}
