use crate::domain::version::SemanticVersion;
use crate::error::{FlowError, Result};

/// Gitflow classification of a branch name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Develop,
    Master,
    Release,
    Hotfix,
    Support,
    Prerelease,
    Other,
}

/// A branch name with its derived gitflow classification
///
/// Derived on demand, never persisted. Classified by case-sensitive prefix
/// match up to the first '/': `develop`, `master`, `release/`, `hotfix/`,
/// `support/`, `prerelease/`; everything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName {
    pub raw: String,
    pub classification: Classification,
}

impl BranchName {
    pub fn new(name: impl Into<String>) -> Self {
        let raw = name.into();
        let classification = classify(&raw);
        BranchName { raw, classification }
    }

    /// The part after the classified prefix, e.g. "v1.3.5-rc.2" for
    /// "release/v1.3.5-rc.2". Empty for develop/master/other.
    pub fn label(&self) -> &str {
        match self.classification {
            Classification::Release
            | Classification::Hotfix
            | Classification::Support
            | Classification::Prerelease => {
                self.raw.split_once('/').map(|(_, rest)| rest).unwrap_or("")
            }
            _ => "",
        }
    }

    /// Parse the embedded version label of a release/hotfix style branch
    pub fn version(&self) -> Result<SemanticVersion> {
        let label = self.label();
        if label.is_empty() {
            return Err(FlowError::branch(format!(
                "Branch '{}' carries no version label",
                self.raw
            )));
        }
        SemanticVersion::parse(label)
    }
}

fn classify(name: &str) -> Classification {
    match name {
        "develop" => return Classification::Develop,
        "master" => return Classification::Master,
        _ => {}
    }

    // Longest known prefix up to '/'
    match name.split_once('/').map(|(prefix, _)| prefix) {
        Some("release") => Classification::Release,
        Some("hotfix") => Classification::Hotfix,
        Some("support") => Classification::Support,
        Some("prerelease") => Classification::Prerelease,
        _ => Classification::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_develop() {
        assert_eq!(
            BranchName::new("develop").classification,
            Classification::Develop
        );
    }

    #[test]
    fn test_classify_master() {
        assert_eq!(
            BranchName::new("master").classification,
            Classification::Master
        );
    }

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(
            BranchName::new("release/v1.3.0").classification,
            Classification::Release
        );
        assert_eq!(
            BranchName::new("hotfix/v1.2.4").classification,
            Classification::Hotfix
        );
        assert_eq!(
            BranchName::new("support/v1.x").classification,
            Classification::Support
        );
        assert_eq!(
            BranchName::new("prerelease/v2.0.0-alpha.1").classification,
            Classification::Prerelease
        );
    }

    #[test]
    fn test_classify_case_sensitive() {
        assert_eq!(
            BranchName::new("Release/v1.0.0").classification,
            Classification::Other
        );
        assert_eq!(
            BranchName::new("DEVELOP").classification,
            Classification::Other
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            BranchName::new("feature/login").classification,
            Classification::Other
        );
        assert_eq!(BranchName::new("main").classification, Classification::Other);
        // A bare prefix without '/' is not a classified branch
        assert_eq!(
            BranchName::new("release").classification,
            Classification::Other
        );
    }

    #[test]
    fn test_label_extraction() {
        assert_eq!(BranchName::new("release/v1.3.5-rc.2").label(), "v1.3.5-rc.2");
        assert_eq!(BranchName::new("hotfix/v1.2.4").label(), "v1.2.4");
        assert_eq!(BranchName::new("develop").label(), "");
    }

    #[test]
    fn test_embedded_version() {
        let branch = BranchName::new("release/v1.3.5-rc.2");
        let version = branch.version().unwrap();
        assert_eq!(version, SemanticVersion::parse("1.3.5-rc.2").unwrap());
    }

    #[test]
    fn test_embedded_version_missing() {
        assert!(BranchName::new("develop").version().is_err());
        assert!(BranchName::new("release/").version().is_err());
    }
}
