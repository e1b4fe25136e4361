use thiserror::Error;

use crate::runner::check::CheckFailure;

/// Unified error type for trunk-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Policy '{name}' has an invalid pattern: {source}")]
    Policy {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Tag template error: {0}")]
    Template(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    /// No tag for the scope yet. The first release needs a manually created seed tag.
    #[error("No release tags found for {}", display_scope(scope))]
    NoReleaseTags { scope: String, initial_tag: String },

    #[error("No policy matched commit {commit}")]
    NoPolicyMatched { commit: String },

    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTagFormat { tag: String, reason: String },

    #[error("Current commit {commit} is not on the main branch '{branch}'")]
    WrongBranch { commit: String, branch: String },

    #[error(transparent)]
    Check(#[from] CheckFailure),

    #[error("No releasable commits have been created since the last release was tagged")]
    NoReleasableCommits,

    #[error("Operation cancelled")]
    Cancelled,
}

/// Convenience type alias for Results in trunk-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

fn display_scope(scope: &str) -> String {
    if scope.is_empty() {
        "the repository root".to_string()
    } else {
        format!("scope '{}'", scope)
    }
}

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a tag template error with context
    pub fn template(msg: impl Into<String>) -> Self {
        ReleaseError::Template(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    pub fn invalid_tag(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        ReleaseError::InvalidTagFormat {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// "First release" condition, recoverable by creating a seed tag
    pub fn is_no_release_tags(&self) -> bool {
        matches!(self, ReleaseError::NoReleaseTags { .. })
    }

    pub fn is_wrong_branch(&self) -> bool {
        matches!(self, ReleaseError::WrongBranch { .. })
    }

    /// Human hint to go along with the error, if there is one
    pub fn hint(&self) -> Option<String> {
        match self {
            ReleaseError::NoReleaseTags { initial_tag, .. } => Some(format!(
                "To create one: git tag -a {} -m \"initial tag\"",
                initial_tag
            )),
            ReleaseError::WrongBranch { branch, .. } => Some(format!(
                "Check out '{}' or pass --dry-run to preview",
                branch
            )),
            _ => None,
        }
    }
}
