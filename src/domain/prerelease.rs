//! Pre-release suffix handling
//!
//! Release candidates are written as exactly two dot-separated identifiers:
//! a channel label and a sequence number (`1.2.3-rc.4`). Any other prerelease
//! shape is kept as [`PreRelease::Other`] and ordered by plain semver rules.

use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid label regex"))
}

fn sequence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("valid sequence regex"))
}

/// Prerelease part of a version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PreRelease {
    /// No prerelease suffix
    #[default]
    Release,
    /// `<label>.<sequence>`, e.g. `rc.2`
    Candidate { label: String, sequence: u64 },
    /// Any other prerelease, only produced when converting from `semver::Version`
    Other(semver::Prerelease),
}

impl PreRelease {
    /// Build a release candidate, validating the label
    pub fn candidate(label: impl Into<String>, sequence: u64) -> Result<Self> {
        let label = label.into();
        validate_label(&label)?;
        Ok(PreRelease::Candidate { label, sequence })
    }

    /// Parse a prerelease string under the restrictive tag grammar.
    ///
    /// Accepts exactly zero (empty string) or two components.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(PreRelease::Release);
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 2 {
            return Err(ReleaseError::version(format!(
                "prerelease '{}' must have exactly two components, found {}",
                s,
                parts.len()
            )));
        }

        validate_label(parts[0])?;
        if !sequence_re().is_match(parts[1]) {
            return Err(ReleaseError::version(format!(
                "prerelease sequence '{}' must be a number without leading zeros",
                parts[1]
            )));
        }
        let sequence = parts[1].parse::<u64>().map_err(|_| {
            ReleaseError::version(format!("prerelease sequence '{}' is out of range", parts[1]))
        })?;

        Ok(PreRelease::Candidate {
            label: parts[0].to_string(),
            sequence,
        })
    }

    pub fn is_release(&self) -> bool {
        matches!(self, PreRelease::Release)
    }

    /// The candidate label, if this is a two-part release candidate
    pub fn label(&self) -> Option<&str> {
        match self {
            PreRelease::Candidate { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn sequence(&self) -> Option<u64> {
        match self {
            PreRelease::Candidate { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }

    /// Convert to the semver crate's representation for fallback ordering
    pub fn to_semver(&self) -> semver::Prerelease {
        match self {
            PreRelease::Release => semver::Prerelease::EMPTY,
            PreRelease::Candidate { label, sequence } => {
                semver::Prerelease::new(&format!("{}.{}", label, sequence))
                    .unwrap_or(semver::Prerelease::EMPTY)
            }
            PreRelease::Other(pre) => pre.clone(),
        }
    }

    /// Convert from the semver crate, folding two-part candidates into [`PreRelease::Candidate`]
    pub fn from_semver(pre: &semver::Prerelease) -> Self {
        if pre.is_empty() {
            return PreRelease::Release;
        }
        PreRelease::parse(pre.as_str()).unwrap_or_else(|_| PreRelease::Other(pre.clone()))
    }
}

fn validate_label(label: &str) -> Result<()> {
    if !label_re().is_match(label) {
        return Err(ReleaseError::version(format!(
            "prerelease label '{}' must be alphanumeric",
            label
        )));
    }
    if label.chars().all(|c| c.is_ascii_digit()) {
        return Err(ReleaseError::version(format!(
            "prerelease label '{}' must not be purely numeric",
            label
        )));
    }
    Ok(())
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreRelease::Release => Ok(()),
            PreRelease::Candidate { label, sequence } => write!(f, "{}.{}", label, sequence),
            PreRelease::Other(pre) => write!(f, "{}", pre),
        }
    }
}
