use std::fmt;

use crate::domain::commit::short_id;

/// Non-fatal conditions met while analyzing a repository.
/// These are reported to the user but never abort a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// A scope has never been released
    NoReleaseTags { scope: String, initial_tag: String },
    /// Tag exists but cannot be parsed as a release version
    InvalidTag { tag: String, reason: String },
    /// Candidate tag at the right version but for another label
    RcLabelMismatch { tag: String, rc: String },
    /// Current commit is off the main branch during a dry run
    WrongBranch { commit: String, branch: String },
    /// Nothing releasable since the latest tag
    NoNewCommits { scope: String, latest_tag: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoReleaseTags { scope, initial_tag } => {
                if !scope.is_empty() {
                    write!(f, "[{}] ", scope)?;
                }
                write!(
                    f,
                    "No release tags found. To create one: git tag -a {} -m \"initial tag\"",
                    initial_tag
                )
            }
            BoundaryWarning::InvalidTag { tag, reason } => {
                write!(f, "invalid tag, skipping: '{}' ({})", tag, reason)
            }
            BoundaryWarning::RcLabelMismatch { tag, rc } => {
                write!(f, "tag doesn't match rc '{}', skipping: '{}'", rc, tag)
            }
            BoundaryWarning::WrongBranch { commit, branch } => write!(
                f,
                "current commit {} is not on the main branch '{}'",
                short_id(commit),
                branch
            ),
            BoundaryWarning::NoNewCommits { scope, latest_tag } => {
                if !scope.is_empty() {
                    write!(f, "[{}] ", scope)?;
                }
                write!(f, "No releasable commits since tag '{}'", latest_tag)
            }
        }
    }
}

impl BoundaryWarning {
    /// Log the warning through `tracing`
    pub fn emit(&self) {
        tracing::warn!("{}", self);
    }
}
