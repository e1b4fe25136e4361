//! Commit policies
//!
//! A policy is data, not code: a subject pattern whose named captures
//! (`type`, `scope`, `breaking`) play fixed roles, a commit type table, an
//! optional fallback release type and a body annotation pattern used to find
//! breaking changes. Patterns are compiled once when the policy is built.

use crate::domain::ReleaseType;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Characters trimmed from a captured scope unless a policy says otherwise
pub const DEFAULT_SCOPE_TRIM: &str = "~!@#$%^&*()_+`-=[]\\{}|';:\",./<>?";

fn default_scope_trim() -> String {
    DEFAULT_SCOPE_TRIM.to_string()
}

/// Policy as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub name: String,

    #[serde(default, rename = "subject_regex")]
    pub subject_pattern: String,

    #[serde(default, rename = "body_annotation_start_regex")]
    pub body_annotation_pattern: String,

    #[serde(default, rename = "breaking_change_annotations")]
    pub breaking_change_markers: Vec<String>,

    #[serde(default)]
    pub commit_types: BTreeMap<String, ReleaseType>,

    #[serde(default, rename = "fallback_type")]
    pub fallback: Option<ReleaseType>,

    #[serde(default = "default_scope_trim")]
    pub scope_trim: String,
}

/// Compiled, immutable policy
#[derive(Debug, Clone)]
pub struct Policy {
    pub name: String,
    pub subject: Option<Regex>,
    pub body_annotation: Option<Regex>,
    pub breaking_change_markers: BTreeSet<String>,
    pub commit_types: BTreeMap<String, ReleaseType>,
    pub fallback: Option<ReleaseType>,
    scope_trim: Vec<char>,
}

impl Policy {
    /// Compile a policy from its configuration
    pub fn compile(config: &PolicyConfig) -> Result<Self> {
        let compile = |pattern: &str| -> Result<Option<Regex>> {
            if pattern.is_empty() {
                return Ok(None);
            }
            Regex::new(pattern).map(Some).map_err(|source| ReleaseError::Policy {
                name: config.name.clone(),
                source,
            })
        };

        Ok(Policy {
            name: config.name.clone(),
            subject: compile(&config.subject_pattern)?,
            body_annotation: compile(&config.body_annotation_pattern)?,
            breaking_change_markers: config.breaking_change_markers.iter().cloned().collect(),
            commit_types: config.commit_types.clone(),
            fallback: config.fallback,
            scope_trim: config.scope_trim.chars().collect(),
        })
    }

    /// Release type mapped to a commit type, if any
    pub fn release_type_for(&self, commit_type: &str) -> Option<ReleaseType> {
        self.commit_types.get(commit_type).copied()
    }

    /// Strip the policy's trim set from both ends of a captured scope
    pub fn trim_scope<'a>(&self, scope: &'a str) -> &'a str {
        scope.trim_matches(|c: char| self.scope_trim.contains(&c))
    }

    pub fn is_breaking_marker(&self, name: &str) -> bool {
        self.breaking_change_markers.contains(name)
    }
}

/// `type(scope)!: subject` commits, loosely
pub fn conventional_lax() -> PolicyConfig {
    let commit_types = [
        ("feat", ReleaseType::Minor),
        ("fix", ReleaseType::Patch),
        ("revert", ReleaseType::Patch),
        ("cont", ReleaseType::Patch),
        ("perf", ReleaseType::Patch),
        ("improvement", ReleaseType::Patch),
        ("refactor", ReleaseType::Patch),
        ("style", ReleaseType::Patch),
        ("test", ReleaseType::Skip),
        ("chore", ReleaseType::Skip),
        ("docs", ReleaseType::Skip),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    PolicyConfig {
        name: "conventional-lax".to_string(),
        subject_pattern: r"^(?P<type>[A-Za-z0-9]+)(?P<scope>\([^\)]+\))?(?P<breaking>!)?:\s+(?P<body>.+)$"
            .to_string(),
        body_annotation_pattern: r"^(?P<name>[A-Z ]+): ".to_string(),
        breaking_change_markers: vec!["BREAKING CHANGE".to_string()],
        commit_types,
        fallback: None,
        scope_trim: default_scope_trim(),
    }
}

/// `scope: subject`, anything else is a patch
pub fn lax() -> PolicyConfig {
    PolicyConfig {
        name: "lax".to_string(),
        subject_pattern: r"^(?P<scope>[A-Za-z0-9_-]+): ".to_string(),
        body_annotation_pattern: String::new(),
        breaking_change_markers: Vec::new(),
        commit_types: BTreeMap::new(),
        fallback: Some(ReleaseType::Patch),
        scope_trim: default_scope_trim(),
    }
}

/// Policies shipped with the tool
pub fn builtin_policies() -> Vec<PolicyConfig> {
    vec![conventional_lax(), lax()]
}

/// Resolve policy names in order, preferring `custom` over built-ins, and
/// compile them.
pub fn resolve(names: &[String], custom: &[PolicyConfig]) -> Result<Vec<Arc<Policy>>> {
    let builtins = builtin_policies();
    names
        .iter()
        .map(|name| {
            let config = custom
                .iter()
                .chain(builtins.iter())
                .find(|p| &p.name == name)
                .ok_or_else(|| ReleaseError::config(format!("policy '{}' was not found", name)))?;
            Policy::compile(config).map(Arc::new)
        })
        .collect()
}
