//! Commit checking: classify commits and enforce allowed scopes and types,
//! collecting every violation instead of stopping at the first.

use crate::analyzer::{classify, AnalyzedCommit, Analyzer};
use crate::config::Config;
use crate::domain::Commit;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::policy::Policy;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One violation
#[derive(Debug, Clone, PartialEq)]
pub struct FailureEntry {
    pub commit_id: String,
    pub commit_title: String,
    pub message: String,
}

impl FailureEntry {
    fn for_commit(commit: &Commit, message: impl Into<String>) -> Self {
        FailureEntry {
            commit_id: commit.id.clone(),
            commit_title: commit.subject.clone(),
            message: message.into(),
        }
    }

    fn same_commit(&self, other: &FailureEntry) -> bool {
        (!self.commit_id.is_empty() && self.commit_id == other.commit_id)
            || (!self.commit_title.is_empty() && self.commit_title == other.commit_title)
    }
}

/// Every violation found by a check run
#[derive(Debug, Clone, PartialEq, Default, thiserror::Error)]
#[error("{} check(s) failed", .failures.len())]
pub struct CheckFailure {
    pub failures: Vec<FailureEntry>,
}

impl CheckFailure {
    /// Failures grouped per commit, in first-seen order
    pub fn by_commit(&self) -> Vec<Vec<&FailureEntry>> {
        let mut groups: Vec<Vec<&FailureEntry>> = Vec::new();
        for failure in &self.failures {
            match groups
                .iter_mut()
                .find(|group| group.iter().any(|prev| prev.same_commit(failure)))
            {
                Some(group) => group.push(failure),
                None => groups.push(vec![failure]),
            }
        }
        groups
    }

    /// The grouped report: the commit title, then each failure indented
    pub fn report(&self) -> String {
        Report(self).to_string()
    }
}

struct Report<'a>(&'a CheckFailure);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in self.0.by_commit() {
            writeln!(f, "{}", group[0].commit_title)?;
            for failure in group {
                writeln!(f, "  {}", failure.message)?;
            }
        }
        Ok(())
    }
}

/// Checks commits against the configured policies and allow lists
pub struct CommitChecker<'c> {
    config: &'c Config,
    policies: Vec<Arc<Policy>>,
}

impl<'c> CommitChecker<'c> {
    pub fn new(config: &'c Config) -> Result<Self> {
        Ok(CommitChecker {
            config,
            policies: config.resolve_policies()?,
        })
    }

    /// Check raw commit messages, as written to a commit message file
    pub fn check_messages<S: AsRef<str>>(&self, messages: &[S]) -> Result<Vec<AnalyzedCommit>> {
        let commits: Vec<Commit> = messages
            .iter()
            .map(|m| Commit::from_message(m.as_ref()))
            .collect();
        self.check_commits(&commits)
    }

    /// Classify every commit and enforce the allow lists.
    ///
    /// # Errors
    /// `ReleaseError::Check` carrying every violation
    pub fn check_commits(&self, commits: &[Commit]) -> Result<Vec<AnalyzedCommit>> {
        let mut failures = Vec::new();
        let mut analyzed = Vec::new();

        for commit in commits {
            match classify(commit, &self.policies) {
                Ok(ac) => {
                    failures.extend(self.check_allowed(&ac));
                    analyzed.push(ac);
                }
                Err(e @ ReleaseError::NoPolicyMatched { .. }) => {
                    failures.push(FailureEntry::for_commit(commit, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if !failures.is_empty() {
            return Err(CheckFailure { failures }.into());
        }
        Ok(analyzed)
    }

    fn check_allowed(&self, ac: &AnalyzedCommit) -> Vec<FailureEntry> {
        let mut failures = Vec::new();
        let allowed_scopes = &self.config.allowed_scopes;
        let allowed_types = &self.config.allowed_types;

        if !ac.scope.is_empty() && !allowed_scopes.is_empty() && !allowed_scopes.contains(&ac.scope) {
            failures.push(FailureEntry::for_commit(
                &ac.commit,
                format!("scope \"{}\" is disallowed", ac.scope),
            ));
        }
        if !ac.commit_type.is_empty()
            && !allowed_types.is_empty()
            && !allowed_types.contains(&ac.commit_type)
        {
            failures.push(FailureEntry::for_commit(
                &ac.commit,
                format!("commit type \"{}\" is disallowed", ac.commit_type),
            ));
        }
        failures
    }
}

/// Check every commit of `scope` since its latest release
pub fn check_commits_from_git<R: Repository>(
    analyzer: &Analyzer<'_, R>,
    checker: &CommitChecker<'_>,
    cancel: &CancellationToken,
    scope: &str,
) -> Result<Vec<AnalyzedCommit>> {
    let latest = analyzer.latest_release(cancel, scope, None)?;
    let commits = analyzer.read_commits_since(cancel, scope, &latest)?;
    checker.check_commits(&commits)
}
