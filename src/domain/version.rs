use crate::domain::prerelease::PreRelease;
use crate::domain::release_type::ReleaseType;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Semantic version grammar used for tag extraction.
///
/// Stricter than semver.org: no leading zeros anywhere, and the version must
/// stand alone (not preceded by a digit or dot, not followed by another
/// identifier character or dot). Build metadata is accepted and discarded.
fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?:^|[^0-9.])",
            r"(?P<major>0|[1-9][0-9]*)\.(?P<minor>0|[1-9][0-9]*)\.(?P<patch>0|[1-9][0-9]*)",
            r"(?:-(?P<prerelease>[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?",
            r"(?:\+(?P<build>[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?",
            r"(?:$|[^0-9A-Za-z.])",
        ))
        .expect("valid semver regex")
    })
}

/// Semantic version with the two-part release candidate convention
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: PreRelease,
}

impl SemVer {
    /// Create a release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemVer {
            major,
            minor,
            patch,
            pre: PreRelease::Release,
        }
    }

    pub fn with_pre(mut self, pre: PreRelease) -> Self {
        self.pre = pre;
        self
    }

    /// The same version without its prerelease
    pub fn core(&self) -> SemVer {
        SemVer::new(self.major, self.minor, self.patch)
    }

    /// `0.0.0`, which never denotes a real release
    pub fn is_zero(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.patch == 0
    }

    /// Extract a version from a tag name.
    ///
    /// Returns `Ok(None)` for `0.0.0` (treated as no release), and
    /// `InvalidTagFormat` for anything the grammar rejects.
    ///
    /// # Example
    /// ```
    /// # use trunk_release::domain::SemVer;
    /// let v = SemVer::extract("api/v1.2.3-rc.4").unwrap().unwrap();
    /// assert_eq!(v.to_string(), "1.2.3-rc.4");
    /// assert!(SemVer::extract("v1.2.3-rc").is_err());
    /// ```
    pub fn extract(tag: &str) -> Result<Option<SemVer>> {
        let caps = semver_re()
            .captures(tag)
            .ok_or_else(|| ReleaseError::invalid_tag(tag, "no semantic version found"))?;

        let component = |name: &str| -> Result<u64> {
            let raw = caps.name(name).map(|m| m.as_str()).unwrap_or("0");
            raw.parse::<u64>().map_err(|_| {
                ReleaseError::invalid_tag(tag, format!("{} version '{}' is out of range", name, raw))
            })
        };
        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;

        let pre = match caps.name("prerelease") {
            Some(m) => PreRelease::parse(m.as_str())
                .map_err(|e| ReleaseError::invalid_tag(tag, e.to_string()))?,
            None => PreRelease::Release,
        };

        let version = SemVer {
            major,
            minor,
            patch,
            pre,
        };
        if version.is_zero() {
            return Ok(None);
        }
        Ok(Some(version))
    }

    /// Bump according to a release type. Prereleases are dropped; SKIP and
    /// INVALID leave the core untouched.
    ///
    /// # Errors
    /// `Version` when the bumped component would overflow
    pub fn bump(&self, release_type: ReleaseType) -> Result<SemVer> {
        let mut next = self.core();
        match release_type {
            ReleaseType::Major => {
                next.major = increment(next.major, "major")?;
                next.minor = 0;
                next.patch = 0;
            }
            ReleaseType::Minor => {
                next.minor = increment(next.minor, "minor")?;
                next.patch = 0;
            }
            ReleaseType::Patch => {
                next.patch = increment(next.patch, "patch")?;
            }
            ReleaseType::Skip | ReleaseType::Invalid => {}
        }
        Ok(next)
    }

    /// Convert to the semver crate's version type
    pub fn to_semver(&self) -> semver::Version {
        semver::Version {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre: self.pre.to_semver(),
            build: semver::BuildMetadata::EMPTY,
        }
    }

    pub fn from_semver(v: &semver::Version) -> Self {
        SemVer {
            major: v.major,
            minor: v.minor,
            patch: v.patch,
            pre: PreRelease::from_semver(&v.pre),
        }
    }

    /// Whether the prerelease shape is what a lookup for `rc` asks for:
    /// no prerelease when `rc` is `None`, otherwise a candidate with that label.
    pub fn matches_rc(&self, rc: Option<&str>) -> bool {
        match (rc, &self.pre) {
            (None, PreRelease::Release) => true,
            (Some(want), PreRelease::Candidate { label, .. }) => label == want,
            _ => false,
        }
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        let core = (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch));
        if core != Ordering::Equal {
            return core;
        }

        match (&self.pre, &other.pre) {
            (
                PreRelease::Candidate { label: a, sequence: n },
                PreRelease::Candidate { label: b, sequence: m },
            ) => a.cmp(b).then(n.cmp(m)),
            (PreRelease::Release, PreRelease::Release) => Ordering::Equal,
            (PreRelease::Release, _) => Ordering::Greater,
            (_, PreRelease::Release) => Ordering::Less,
            // Only one side (or neither) is a two-part candidate
            _ => self.to_semver().cmp(&other.to_semver()),
        }
    }
}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_release() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

/// A tag that was skipped while scanning
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTag {
    pub tag: String,
    pub reason: String,
}

fn increment(component: u64, name: &str) -> Result<u64> {
    component
        .checked_add(1)
        .ok_or_else(|| {
            ReleaseError::version(format!("{} version {} cannot be bumped", name, component))
        })
}

/// Extract every valid version from `tags`, keeping those whose prerelease
/// shape matches `rc`. Invalid tags are reported, never fatal.
pub fn scan_tags<'a, I>(tags: I, rc: Option<&str>) -> (Vec<SemVer>, Vec<SkippedTag>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut versions = Vec::new();
    let mut skipped = Vec::new();

    for tag in tags {
        match SemVer::extract(tag) {
            Ok(Some(version)) if version.matches_rc(rc) => versions.push(version),
            Ok(_) => {}
            Err(e) => skipped.push(SkippedTag {
                tag: tag.to_string(),
                reason: match e {
                    ReleaseError::InvalidTagFormat { reason, .. } => reason,
                    other => other.to_string(),
                },
            }),
        }
    }

    (versions, skipped)
}

/// The greatest version among `tags` matching `rc`, or `None` if there is none
pub fn latest_matching<'a, I>(tags: I, rc: Option<&str>) -> (Option<SemVer>, Vec<SkippedTag>)
where
    I: IntoIterator<Item = &'a str>,
{
    let (mut versions, skipped) = scan_tags(tags, rc);
    versions.sort();
    (versions.pop(), skipped)
}
