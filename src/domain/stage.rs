//! Pre-release stage handling for semantic versioning
//!
//! A pre-release is an ordered maturity label (alpha < beta < rc) plus a
//! positive counter, attached to a version prior to final release.

use crate::error::{FlowError, Result};
use std::fmt;
use std::str::FromStr;

/// Pre-release maturity stage (alpha, beta, or release candidate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreReleaseStage {
    /// Alpha pre-release
    Alpha,
    /// Beta pre-release
    Beta,
    /// Release candidate
    Rc,
}

impl PreReleaseStage {
    /// The stage a version is promoted to, or `None` when the next
    /// promotion is the final release itself.
    pub fn next(&self) -> Option<PreReleaseStage> {
        match self {
            PreReleaseStage::Alpha => Some(PreReleaseStage::Beta),
            PreReleaseStage::Beta => Some(PreReleaseStage::Rc),
            PreReleaseStage::Rc => None,
        }
    }
}

impl FromStr for PreReleaseStage {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "alpha" => Ok(PreReleaseStage::Alpha),
            "beta" => Ok(PreReleaseStage::Beta),
            "rc" => Ok(PreReleaseStage::Rc),
            other => Err(FlowError::format(format!(
                "Unknown pre-release stage: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PreReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreReleaseStage::Alpha => write!(f, "alpha"),
            PreReleaseStage::Beta => write!(f, "beta"),
            PreReleaseStage::Rc => write!(f, "rc"),
        }
    }
}

/// Pre-release label: stage plus positive counter
///
/// # Examples
/// - "alpha.1" -> PreRelease { stage: Alpha, counter: 1 }
/// - "rc.3" -> PreRelease { stage: Rc, counter: 3 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    /// The pre-release stage
    pub stage: PreReleaseStage,
    /// Iteration counter within the stage, always >= 1
    pub counter: u32,
}

impl PreRelease {
    /// Create a new pre-release label
    ///
    /// # Errors
    /// Fails if `counter` is zero; counters are 1-based.
    pub fn new(stage: PreReleaseStage, counter: u32) -> Result<Self> {
        if counter == 0 {
            return Err(FlowError::format(
                "Pre-release counter must be positive".to_string(),
            ));
        }
        Ok(PreRelease { stage, counter })
    }

    /// Parse a pre-release label like "beta.1" or "rc.2"
    pub fn parse(s: &str) -> Result<Self> {
        let (stage_part, counter_part) = s.split_once('.').ok_or_else(|| {
            FlowError::format(format!(
                "Invalid pre-release label '{}' - expected STAGE.COUNTER",
                s
            ))
        })?;

        let stage: PreReleaseStage = stage_part.parse()?;
        let counter = counter_part.parse::<u32>().map_err(|_| {
            FlowError::format(format!("Invalid pre-release counter: '{}'", counter_part))
        })?;

        PreRelease::new(stage, counter)
    }

    /// Next iteration within the same stage
    pub fn next_counter(&self) -> Self {
        PreRelease {
            stage: self.stage,
            counter: self.counter + 1,
        }
    }

    /// First iteration of the next stage, `None` when already at rc
    pub fn promote(&self) -> Option<Self> {
        self.stage.next().map(|stage| PreRelease { stage, counter: 1 })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stage, self.counter)
    }
}
