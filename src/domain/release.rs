use crate::analyzer::classifier::AnalyzedCommit;
use crate::domain::commit::short_id;
use crate::domain::version::SemVer;

/// The next release proposed for one scope.
///
/// Built once per scope by the analyzer and consumed by tag creation.
#[derive(Debug, Clone)]
pub struct Version {
    pub semver: SemVer,
    /// Empty for the repository root
    pub scope: String,
    /// Commit the tag should point at
    pub commit: String,
    /// Release candidate label, if one was requested
    pub rc: Option<String>,
    /// Every commit that went into this release, in input order
    pub commits: Vec<AnalyzedCommit>,
}

impl Version {
    pub fn new(semver: SemVer, scope: impl Into<String>, commit: impl Into<String>) -> Self {
        Version {
            semver,
            scope: scope.into(),
            commit: commit.into(),
            rc: None,
            commits: Vec::new(),
        }
    }

    pub fn short_commit(&self) -> &str {
        short_id(&self.commit)
    }

    pub fn is_root(&self) -> bool {
        self.scope.is_empty()
    }
}
