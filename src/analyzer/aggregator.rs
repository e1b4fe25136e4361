//! Reduces one scope's classified commits to zero or one next version

use crate::analyzer::classifier::AnalyzedCommit;
use crate::domain::{BumpOverride, SemVer, Version};
use crate::error::Result;
use tracing::debug;

/// Propose the next version for `scope` from commits already filtered to it.
///
/// The bump comes from the highest release type in the batch, the anchor
/// commit from the most recent committer date. With an override, a batch
/// with nothing releasable is still bumped by the override.
///
/// # Returns
/// `None` when the batch is empty or nothing in it warrants a release
///
/// # Errors
/// `Version` when bumping `latest` overflows
pub fn aggregate(
    latest: &SemVer,
    commits: Vec<AnalyzedCommit>,
    scope: &str,
    bump: Option<BumpOverride>,
) -> Result<Option<Version>> {
    let mut max: Option<&AnalyzedCommit> = None;
    let mut newest: Option<&AnalyzedCommit> = None;

    for ac in &commits {
        if max.map_or(true, |m| ac.release_type > m.release_type) {
            max = Some(ac);
        }
        if newest.map_or(true, |n| ac.commit.committer_date > n.commit.committer_date) {
            newest = Some(ac);
        }
    }

    let (Some(max), Some(newest)) = (max, newest) else {
        return Ok(None);
    };
    debug!(
        max = max.commit.short_id(),
        release_type = %max.release_type,
        newest = newest.commit.short_id(),
        scope,
        "aggregated commits"
    );

    let release_type = if max.release_type.is_releasable() {
        max.release_type
    } else {
        match bump {
            Some(bump) => bump.release_type(),
            None => return Ok(None),
        }
    };

    let anchor = newest.commit.id.clone();
    debug!(scope, %release_type, commit = newest.commit.short_id(), "will bump version");

    let mut version = Version::new(latest.bump(release_type)?, scope, anchor);
    version.commits = commits;
    Ok(Some(version))
}
