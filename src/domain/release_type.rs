use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Magnitude of the version bump a commit implies.
///
/// Variants are ordered by declaration, so `max()` over a batch picks the
/// dominant bump. `Invalid` and `Skip` never trigger a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReleaseType {
    #[default]
    Invalid,
    Skip,
    Patch,
    Minor,
    Major,
}

impl ReleaseType {
    /// Whether this release type bumps the version on its own
    pub fn is_releasable(self) -> bool {
        self >= ReleaseType::Patch
    }
}

impl FromStr for ReleaseType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SKIP" => Ok(ReleaseType::Skip),
            "PATCH" => Ok(ReleaseType::Patch),
            "MINOR" => Ok(ReleaseType::Minor),
            "MAJOR" => Ok(ReleaseType::Major),
            _ => Err(ReleaseError::config(format!("Unknown release type: '{}'", s))),
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseType::Invalid => "<INVALID>",
            ReleaseType::Skip => "SKIP",
            ReleaseType::Patch => "PATCH",
            ReleaseType::Minor => "MINOR",
            ReleaseType::Major => "MAJOR",
        };
        f.write_str(s)
    }
}

impl Serialize for ReleaseType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Explicit `--major`/`--minor`/`--patch` request.
///
/// Being an enum, at most one override can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpOverride {
    Major,
    Minor,
    Patch,
}

impl BumpOverride {
    pub fn release_type(self) -> ReleaseType {
        match self {
            BumpOverride::Major => ReleaseType::Major,
            BumpOverride::Minor => ReleaseType::Minor,
            BumpOverride::Patch => ReleaseType::Patch,
        }
    }
}
