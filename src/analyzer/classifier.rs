//! Commit classification against an ordered policy list

use crate::domain::{BodyAnnotation, Commit, ReleaseType};
use crate::error::{ReleaseError, Result};
use crate::policy::Policy;
use regex::Regex;
use std::fmt::{self, Write as _};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A commit together with what a policy made of it
#[derive(Debug, Clone)]
pub struct AnalyzedCommit {
    pub commit: Commit,
    pub release_type: ReleaseType,
    /// Trimmed scope capture, empty when the subject named none
    pub scope: String,
    pub commit_type: String,
    /// Policy that classified the commit, `None` for unmatched commits
    /// tolerated under a bump override
    pub policy: Option<Arc<Policy>>,
    /// False when the commit only got its policy's fallback release type
    pub is_valid: bool,
    annotations: OnceLock<Vec<BodyAnnotation>>,
}

impl AnalyzedCommit {
    fn new(commit: &Commit, policy: &Arc<Policy>, is_valid: bool) -> Self {
        AnalyzedCommit {
            commit: commit.clone(),
            release_type: ReleaseType::Invalid,
            scope: String::new(),
            commit_type: String::new(),
            policy: Some(Arc::clone(policy)),
            is_valid,
            annotations: OnceLock::new(),
        }
    }

    /// A commit no policy matched
    pub fn unmatched(commit: Commit) -> Self {
        AnalyzedCommit {
            commit,
            release_type: ReleaseType::Invalid,
            scope: String::new(),
            commit_type: String::new(),
            policy: None,
            is_valid: false,
            annotations: OnceLock::new(),
        }
    }

    /// Body annotations under the classifying policy. Parsed once.
    pub fn annotations(&self) -> &[BodyAnnotation] {
        self.annotations.get_or_init(|| {
            self.policy
                .as_ref()
                .and_then(|p| p.body_annotation.as_ref())
                .map(|re| parse_annotations(re, &self.commit.body))
                .unwrap_or_default()
        })
    }

    /// Annotations whose name is one of the policy's breaking change markers
    pub fn breaking_annotations(&self) -> Vec<&BodyAnnotation> {
        let Some(policy) = &self.policy else {
            return Vec::new();
        };
        self.annotations()
            .iter()
            .filter(|a| policy.is_breaking_marker(&a.name))
            .collect()
    }

    /// Whether the commit belongs to `scope` given the declared release scopes
    pub fn is_in_scope(&self, scope: &str, release_scopes: &[String]) -> bool {
        is_in_scope(&self.scope, scope, release_scopes)
    }
}

/// Scope membership rule.
///
/// An unscoped commit counts everywhere except for a declared release scope
/// being analyzed. A scoped commit only counts for its own scope once release
/// scopes are declared.
pub fn is_in_scope(commit_scope: &str, scope: &str, release_scopes: &[String]) -> bool {
    if commit_scope.is_empty() {
        return !release_scopes.iter().any(|s| s == scope);
    }
    if !release_scopes.is_empty() {
        return commit_scope == scope;
    }
    true
}

/// Classify `commit` against `policies` in order. The first policy that
/// matches, or that offers a fallback, wins.
///
/// # Errors
///
/// `ReleaseError::NoPolicyMatched` when no policy matched and none had a
/// fallback.
pub fn classify(commit: &Commit, policies: &[Arc<Policy>]) -> Result<AnalyzedCommit> {
    for policy in policies {
        if let Some(ac) = match_subject(commit, policy) {
            debug!(
                commit = commit.short_id(),
                policy = %policy.name,
                release_type = %ac.release_type,
                "policy match"
            );
            return Ok(ac);
        }

        if let Some(fallback) = policy.fallback {
            let mut ac = AnalyzedCommit::new(commit, policy, false);
            ac.release_type = fallback;
            debug!(
                commit = commit.short_id(),
                policy = %policy.name,
                release_type = %fallback,
                "policy fallback"
            );
            return Ok(ac);
        }
    }

    Err(ReleaseError::NoPolicyMatched {
        commit: if commit.id.is_empty() {
            commit.subject.clone()
        } else {
            commit.short_id().to_string()
        },
    })
}

fn match_subject(commit: &Commit, policy: &Arc<Policy>) -> Option<AnalyzedCommit> {
    let caps = policy.subject.as_ref()?.captures(&commit.subject)?;
    let mut ac = AnalyzedCommit::new(commit, policy, true);
    let mut type_matched = false;

    if let Some(commit_type) = caps.name("type") {
        ac.commit_type = commit_type.as_str().to_string();
        if let Some(release_type) = policy.release_type_for(&ac.commit_type) {
            ac.release_type = release_type;
            type_matched = true;
        }
    }
    if let Some(scope) = caps.name("scope") {
        ac.scope = policy.trim_scope(scope.as_str()).to_string();
    }

    if !ac.scope.is_empty() && ac.release_type == ReleaseType::Invalid {
        if let Some(fallback) = policy.fallback {
            ac.release_type = fallback;
            type_matched = true;
        }
    }

    if !type_matched {
        return None;
    }

    let bang = caps.name("breaking").is_some_and(|m| !m.as_str().is_empty());
    if bang || !ac.breaking_annotations().is_empty() {
        ac.release_type = ReleaseType::Major;
    }
    Some(ac)
}

/// Split a commit body into annotation blocks.
///
/// A line matching `start` opens a block named by the `name` (or `type`)
/// capture; following lines accumulate into it until the next start line.
/// Text before the first start line is ignored.
pub fn parse_annotations(start: &Regex, body: &str) -> Vec<BodyAnnotation> {
    let mut annotations = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in body.lines() {
        match start.captures(line) {
            Some(caps) => {
                if let Some(block) = current.take() {
                    push_annotation(&mut annotations, block);
                }
                let name = caps
                    .name("name")
                    .or_else(|| caps.name("type"))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                let rest = caps.get(0).map_or(line, |m| &line[m.end()..]);
                current = Some((name, vec![rest]));
            }
            None => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    if let Some(block) = current {
        push_annotation(&mut annotations, block);
    }
    annotations
}

fn push_annotation(annotations: &mut Vec<BodyAnnotation>, (name, lines): (String, Vec<&str>)) {
    if name.is_empty() {
        return;
    }
    annotations.push(BodyAnnotation {
        name,
        body: lines.join("\n").trim_end().to_string(),
    });
}

/// Per-commit classification summary, as printed by `--check`
pub struct Summary<'a>(pub &'a [AnalyzedCommit]);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let multi = self.0.len() > 1;
        if multi {
            writeln!(f, "{} commits", self.0.len())?;
        }
        for ac in self.0 {
            let mut block = String::new();
            if multi {
                writeln!(block, "{}", ac.commit.subject)?;
            }
            writeln!(block, "  Release type: {}", ac.release_type)?;
            if !ac.scope.is_empty() {
                writeln!(block, "  Scope: {}", ac.scope)?;
            }
            if !ac.commit_type.is_empty() {
                writeln!(block, "  Commit Type: {}", ac.commit_type)?;
            }
            f.write_str(&block)?;
        }
        Ok(())
    }
}
